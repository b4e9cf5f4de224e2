//! Deterministic encoding shared by all signature kinds.
//!
//! The canonical form of a record is its JSON encoding with object keys in
//! lexicographic order at every nesting level, `", "` between items, `": "`
//! after keys, and raw byte payloads base64-encoded. Identical logical
//! content always yields an identical string, so the canonical form can be
//! compared (or hashed) byte-for-byte.

use std::io;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Serializer, Value};

/// Writes JSON with a single space after item and key separators.
///
/// Key ordering comes from `serde_json` itself: `Map` is BTreeMap-backed,
/// so object entries serialize in lexicographic key order regardless of
/// insertion order.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b", ")?;
        }
        Ok(())
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b", ")?;
        }
        Ok(())
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Encode a structured record into its canonical string form.
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, CanonicalFormatter);
    value
        .serialize(&mut ser)
        .expect("writing JSON to a Vec cannot fail");
    String::from_utf8(out).expect("serde_json emits valid UTF-8")
}

/// Encode a raw byte payload as a JSON value: base64, standard alphabet
/// with padding. Signature kinds that record raw bytes (e.g. a ClientHello
/// body) use this so their canonical forms stay text.
pub fn bytes_value(bytes: &[u8]) -> Value {
    Value::String(BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_sorted_with_fixed_separators() {
        let v = json!({"b": 1, "a": [1, 2], "c": {"y": "z"}});
        assert_eq!(
            to_canonical_string(&v),
            r#"{"a": [1, 2], "b": 1, "c": {"y": "z"}}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut forward = serde_json::Map::new();
        forward.insert("alpha".into(), json!(1));
        forward.insert("beta".into(), json!(2));

        let mut backward = serde_json::Map::new();
        backward.insert("beta".into(), json!(2));
        backward.insert("alpha".into(), json!(1));

        assert_eq!(
            to_canonical_string(&Value::Object(forward)),
            to_canonical_string(&Value::Object(backward))
        );
    }

    #[test]
    fn deterministic_across_calls() {
        let v = json!({"frames": [{"frame_type": "SETTINGS", "stream_id": 0}]});
        assert_eq!(to_canonical_string(&v), to_canonical_string(&v));
    }

    #[test]
    fn array_order_is_preserved() {
        let a = json!([1, 2, 3]);
        let b = json!([3, 2, 1]);
        assert_ne!(to_canonical_string(&a), to_canonical_string(&b));
    }

    #[test]
    fn bytes_encode_to_base64() {
        assert_eq!(bytes_value(b"\x00\xffhello"), json!("AP9oZWxsbw=="));
        assert_eq!(
            bytes_value(b"client hello bytes"),
            json!("Y2xpZW50IGhlbGxvIGJ5dGVz")
        );
    }
}
