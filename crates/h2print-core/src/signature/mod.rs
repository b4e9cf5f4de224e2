pub mod canonical;
pub mod frame;
pub mod http2;

use serde_json::Value;
use sha1::{Digest, Sha1};

/// A network client's signature.
///
/// A signature is an ordered record of protocol behavior observed during
/// connection setup. Concrete kinds (the HTTP/2 frame signature here, a TLS
/// ClientHello signature elsewhere) differ in payload but share this
/// contract: a structured-record form, a canonical string encoding of that
/// form, and a digest of the canonical encoding used as the compact
/// fingerprint value.
///
/// Two signatures are equal exactly when their canonical forms are
/// byte-identical, which holds exactly when their hashes are equal.
pub trait Signature {
    /// Structured-record form of the signature.
    fn to_value(&self) -> Value;

    /// Plain JSON encoding. No ordering guarantees; use [`canonicalize`]
    /// for comparison.
    ///
    /// [`canonicalize`]: Signature::canonicalize
    fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Canonical form: the deterministic string encoding of the record,
    /// with map keys sorted at every nesting level, a single space after
    /// separators, and byte payloads base64-encoded.
    fn canonicalize(&self) -> String {
        canonical::to_canonical_string(&self.to_value())
    }

    /// SHA-1 digest of the canonical form's UTF-8 bytes. Recomputed on
    /// demand; never cached apart from the canonical form it encodes.
    fn hash(&self) -> [u8; 20] {
        Sha1::digest(self.canonicalize().as_bytes()).into()
    }

    /// The digest rendered as lowercase hex, the conventional form for
    /// storage and lookup.
    fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}
