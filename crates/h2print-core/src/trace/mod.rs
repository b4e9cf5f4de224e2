//! Extraction of per-client HTTP/2 signatures from a captured trace.

pub mod nghttpd;

use thiserror::Error;

use crate::signature::http2::Http2Signature;

pub use nghttpd::NghttpdLogParser;

/// The raw trace violated the expected per-frame-type line grammar.
///
/// Fatal for the client whose frame was being read; results of other
/// clients collected before the failure are unaffected (see
/// [`Extraction`]).
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace grammar is closed: a frame type the extractor does not
    /// know is a hard failure here, unlike the open registry used when
    /// decoding already-serialized signature records.
    #[error("unknown frame type `{frame_type}` for client {client_id} (line {line})")]
    UnknownFrameType {
        client_id: u64,
        line: usize,
        frame_type: String,
    },
    #[error("trace ended while expecting {expected} for client {client_id}")]
    UnexpectedEnd {
        client_id: u64,
        expected: &'static str,
    },
    #[error("malformed line {line}, expected {expected}: `{content}`")]
    UnexpectedLine {
        client_id: u64,
        line: usize,
        expected: &'static str,
        content: String,
    },
}

impl TraceError {
    /// Id of the client whose extraction failed.
    pub fn client_id(&self) -> u64 {
        match self {
            TraceError::UnknownFrameType { client_id, .. }
            | TraceError::UnexpectedEnd { client_id, .. }
            | TraceError::UnexpectedLine { client_id, .. } => *client_id,
        }
    }
}

/// One client's extracted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSignature {
    /// Numeric client id assigned by the tracing server.
    pub client_id: u64,
    pub signature: Http2Signature,
}

/// Result of scanning one trace.
///
/// A malformed trace stops the scan: `error` carries the failure and the
/// failing client's partial frames are discarded, but `clients` still
/// holds every other client's frames as collected up to that point.
#[derive(Debug)]
pub struct Extraction {
    /// Extracted signatures, ordered by client id.
    pub clients: Vec<ClientSignature>,
    pub error: Option<TraceError>,
}

impl Extraction {
    /// All-or-nothing view: discards every client if any part of the
    /// trace was malformed.
    pub fn into_result(self) -> Result<Vec<ClientSignature>, TraceError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.clients),
        }
    }
}

/// Scan a complete `nghttpd -v` receive log and extract one signature per
/// client, each scoped to the frames up to and including that client's
/// first HEADERS frame.
pub fn extract_signatures(log: &str) -> Extraction {
    NghttpdLogParser::new(log).parse()
}
