//! HTTP/2 connection-setup signature.

use serde_json::{Map, Value};

use crate::signature::frame::{DecodeError, FrameSignature};
use crate::signature::Signature;

/// Signature of an HTTP/2 client.
///
/// Holds the frames sent by the client during the initial phase of the
/// connection, up to and including its first HEADERS frame, in order of
/// receipt. The order is part of the signature: the same frames received
/// in a different order are a different signature.
///
/// Built once from a fully-parsed frame list and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Http2Signature {
    frames: Vec<FrameSignature>,
}

impl Http2Signature {
    pub fn new(frames: Vec<FrameSignature>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[FrameSignature] {
        &self.frames
    }

    /// Decode a signature from its structured-record form, e.g. one
    /// produced by [`Signature::to_value`] and stored as JSON.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let record = value.as_object().ok_or(DecodeError::NotAnObject)?;
        let frames = record
            .get("frames")
            .ok_or(DecodeError::MissingField {
                record: "HTTP/2 signature",
                field: "frames",
            })?
            .as_array()
            .ok_or(DecodeError::InvalidField {
                record: "HTTP/2 signature",
                field: "frames",
            })?
            .iter()
            .map(FrameSignature::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { frames })
    }
}

impl Signature for Http2Signature {
    fn to_value(&self) -> Value {
        let mut m = Map::new();
        m.insert(
            "frames".to_string(),
            Value::Array(self.frames.iter().map(|f| f.to_value()).collect()),
        );
        Value::Object(m)
    }
}
