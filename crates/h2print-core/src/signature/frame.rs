//! Per-frame signature model.
//!
//! One `FrameSignature` captures the identifying fields of a single HTTP/2
//! frame observed from a client. The frame type fully determines which
//! payload fields are present; types without a dedicated variant are kept
//! as [`FrameSignature::Other`], retaining identity only (there is no
//! generic payload capture for unrecognized types).

use serde_json::{Map, Value};
use thiserror::Error;

/// Symbolic id recorded in place of a non-registered SETTINGS parameter.
///
/// Some browsers (Chrome 98 onward) add a randomly-generated settings key
/// to the SETTINGS frame, analogous to TLS GREASE. The random id and value
/// carry no information, so both are replaced with this marker; only the
/// presence of the decoy survives.
pub const GREASE: &str = "GREASE";

/// Registered SETTINGS parameter ids (RFC 7540, "Defined SETTINGS
/// Parameters").
const VALID_SETTINGS: std::ops::RangeInclusive<u64> = 1..=6;

/// One SETTINGS parameter, normalized at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// A registered parameter and its value.
    Standard { id: u16, value: u32 },
    /// A decoy parameter outside the registered set.
    Grease,
}

impl Setting {
    /// Build a setting from a raw `(id, value)` pair as seen on the wire.
    /// Ids outside the registered set normalize to [`Setting::Grease`] and
    /// the value is discarded.
    pub fn new(id: u64, value: u32) -> Self {
        if VALID_SETTINGS.contains(&id) {
            Setting::Standard {
                id: id as u16,
                value,
            }
        } else {
            Setting::Grease
        }
    }

    fn to_value(self) -> Value {
        let mut m = Map::new();
        match self {
            Setting::Standard { id, value } => {
                m.insert("id".to_string(), Value::from(id));
                m.insert("value".to_string(), Value::from(value));
            }
            Setting::Grease => {
                m.insert("id".to_string(), Value::from(GREASE));
                m.insert("value".to_string(), Value::from(GREASE));
            }
        }
        Value::Object(m)
    }
}

/// PRIORITY frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub dep_stream_id: u32,
    pub weight: u32,
    pub exclusive: bool,
}

/// The identifying fields of one HTTP/2 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSignature {
    Settings {
        stream_id: Option<u32>,
        settings: Vec<Setting>,
    },
    WindowUpdate {
        stream_id: Option<u32>,
        window_size_increment: u32,
    },
    Headers {
        stream_id: Option<u32>,
        /// Pseudo-header names in the order they appeared, e.g. `":method"`.
        pseudo_headers: Vec<String>,
    },
    Priority {
        stream_id: Option<u32>,
        priority: Priority,
    },
    /// A frame type without a dedicated variant. Only identity survives.
    Other {
        frame_type: String,
        stream_id: Option<u32>,
    },
}

/// A structured record could not be decoded into a [`FrameSignature`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no `frame_type` field")]
    MissingFrameType,
    #[error("{record} record is missing required field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    #[error("{record} record has a malformed `{field}` field")]
    InvalidField {
        record: &'static str,
        field: &'static str,
    },
}

type FrameDecoder = fn(&Map<String, Value>) -> Result<FrameSignature, DecodeError>;

/// Frame-type tag to constructor table, consulted by [`FrameSignature::from_value`].
/// Adding a frame type means adding a variant and a row here.
const DECODERS: &[(&str, FrameDecoder)] = &[
    ("SETTINGS", decode_settings),
    ("WINDOW_UPDATE", decode_window_update),
    ("HEADERS", decode_headers),
    ("PRIORITY", decode_priority),
];

impl FrameSignature {
    /// Wire-level type name of this frame.
    pub fn frame_type(&self) -> &str {
        match self {
            FrameSignature::Settings { .. } => "SETTINGS",
            FrameSignature::WindowUpdate { .. } => "WINDOW_UPDATE",
            FrameSignature::Headers { .. } => "HEADERS",
            FrameSignature::Priority { .. } => "PRIORITY",
            FrameSignature::Other { frame_type, .. } => frame_type,
        }
    }

    pub fn stream_id(&self) -> Option<u32> {
        match self {
            FrameSignature::Settings { stream_id, .. }
            | FrameSignature::WindowUpdate { stream_id, .. }
            | FrameSignature::Headers { stream_id, .. }
            | FrameSignature::Priority { stream_id, .. }
            | FrameSignature::Other { stream_id, .. } => *stream_id,
        }
    }

    /// Serialize to a structured record: `frame_type`, `stream_id` (omitted
    /// when absent), and the type-specific payload keys.
    pub fn to_value(&self) -> Value {
        let mut m = Map::new();
        m.insert(
            "frame_type".to_string(),
            Value::from(self.frame_type().to_string()),
        );
        if let Some(stream_id) = self.stream_id() {
            m.insert("stream_id".to_string(), Value::from(stream_id));
        }
        match self {
            FrameSignature::Settings { settings, .. } => {
                m.insert(
                    "settings".to_string(),
                    Value::Array(settings.iter().map(|s| s.to_value()).collect()),
                );
            }
            FrameSignature::WindowUpdate {
                window_size_increment,
                ..
            } => {
                m.insert(
                    "window_size_increment".to_string(),
                    Value::from(*window_size_increment),
                );
            }
            FrameSignature::Headers { pseudo_headers, .. } => {
                m.insert(
                    "pseudo_headers".to_string(),
                    Value::Array(
                        pseudo_headers
                            .iter()
                            .map(|h| Value::from(h.clone()))
                            .collect(),
                    ),
                );
            }
            FrameSignature::Priority { priority, .. } => {
                let mut p = Map::new();
                p.insert(
                    "dep_stream_id".to_string(),
                    Value::from(priority.dep_stream_id),
                );
                p.insert("weight".to_string(), Value::from(priority.weight));
                p.insert("exclusive".to_string(), Value::from(priority.exclusive));
                m.insert("priority".to_string(), Value::Object(p));
            }
            FrameSignature::Other { .. } => {}
        }
        Value::Object(m)
    }

    /// Decode a structured record, dispatching on its `frame_type` tag.
    ///
    /// Unknown tags decode to [`FrameSignature::Other`] so that stored
    /// signatures remain readable after new frame types are introduced.
    /// A known tag with a missing or malformed required field is an error;
    /// no field is ever default-filled.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let record = value.as_object().ok_or(DecodeError::NotAnObject)?;
        let frame_type = record
            .get("frame_type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingFrameType)?;

        match DECODERS.iter().find(|(tag, _)| *tag == frame_type) {
            Some((_, decode)) => decode(record),
            None => Ok(FrameSignature::Other {
                frame_type: frame_type.to_string(),
                stream_id: decode_stream_id(record, "frame")?,
            }),
        }
    }
}

fn decode_stream_id(
    record: &Map<String, Value>,
    kind: &'static str,
) -> Result<Option<u32>, DecodeError> {
    match record.get("stream_id") {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or(DecodeError::InvalidField {
                record: kind,
                field: "stream_id",
            }),
    }
}

fn require<'a>(
    record: &'a Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<&'a Value, DecodeError> {
    record.get(field).ok_or(DecodeError::MissingField {
        record: kind,
        field,
    })
}

fn decode_u32(value: &Value, kind: &'static str, field: &'static str) -> Result<u32, DecodeError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(DecodeError::InvalidField {
            record: kind,
            field,
        })
}

fn decode_settings(record: &Map<String, Value>) -> Result<FrameSignature, DecodeError> {
    const KIND: &str = "SETTINGS";
    let invalid = || DecodeError::InvalidField {
        record: KIND,
        field: "settings",
    };

    let entries = require(record, KIND, "settings")?
        .as_array()
        .ok_or_else(invalid)?;

    let mut settings = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry.as_object().ok_or_else(invalid)?;
        let id = entry.get("id").ok_or_else(invalid)?;
        let value = entry.get("value").ok_or_else(invalid)?;
        let setting = match id {
            Value::String(s) if s == GREASE => Setting::Grease,
            Value::Number(_) => {
                let id = id.as_u64().ok_or_else(invalid)?;
                if VALID_SETTINGS.contains(&id) {
                    Setting::new(id, decode_u32(value, KIND, "settings")?)
                } else {
                    // The value of a decoy setting is discarded either way.
                    Setting::Grease
                }
            }
            _ => return Err(invalid()),
        };
        settings.push(setting);
    }

    Ok(FrameSignature::Settings {
        stream_id: decode_stream_id(record, KIND)?,
        settings,
    })
}

fn decode_window_update(record: &Map<String, Value>) -> Result<FrameSignature, DecodeError> {
    const KIND: &str = "WINDOW_UPDATE";
    let increment = require(record, KIND, "window_size_increment")?;
    Ok(FrameSignature::WindowUpdate {
        stream_id: decode_stream_id(record, KIND)?,
        window_size_increment: decode_u32(increment, KIND, "window_size_increment")?,
    })
}

fn decode_headers(record: &Map<String, Value>) -> Result<FrameSignature, DecodeError> {
    const KIND: &str = "HEADERS";
    let invalid = || DecodeError::InvalidField {
        record: KIND,
        field: "pseudo_headers",
    };

    let names = require(record, KIND, "pseudo_headers")?
        .as_array()
        .ok_or_else(invalid)?;
    let pseudo_headers = names
        .iter()
        .map(|n| n.as_str().map(str::to_string).ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FrameSignature::Headers {
        stream_id: decode_stream_id(record, KIND)?,
        pseudo_headers,
    })
}

fn decode_priority(record: &Map<String, Value>) -> Result<FrameSignature, DecodeError> {
    const KIND: &str = "PRIORITY";
    let payload = require(record, KIND, "priority")?
        .as_object()
        .ok_or(DecodeError::InvalidField {
            record: KIND,
            field: "priority",
        })?;

    let dep_stream_id = decode_u32(require(payload, KIND, "dep_stream_id")?, KIND, "dep_stream_id")?;
    let weight = decode_u32(require(payload, KIND, "weight")?, KIND, "weight")?;
    let exclusive = require(payload, KIND, "exclusive")?
        .as_bool()
        .ok_or(DecodeError::InvalidField {
            record: KIND,
            field: "exclusive",
        })?;

    Ok(FrameSignature::Priority {
        stream_id: decode_stream_id(record, KIND)?,
        priority: Priority {
            dep_stream_id,
            weight,
            exclusive,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::canonical::to_canonical_string;
    use serde_json::json;

    #[test]
    fn settings_serialize() {
        let frame = FrameSignature::Settings {
            stream_id: Some(0),
            settings: vec![Setting::new(1, 65536), Setting::new(0x0a0a, 12345)],
        };
        assert_eq!(
            to_canonical_string(&frame.to_value()),
            r#"{"frame_type": "SETTINGS", "settings": [{"id": 1, "value": 65536}, {"id": "GREASE", "value": "GREASE"}], "stream_id": 0}"#
        );
    }

    #[test]
    fn grease_normalization_discards_value() {
        // Id 7 is outside the registered set; the value must not survive.
        let a = Setting::new(7, 1);
        let b = Setting::new(7, 999_999);
        assert_eq!(a, Setting::Grease);
        assert_eq!(a, b);
        assert_eq!(a.to_value(), json!({"id": "GREASE", "value": "GREASE"}));
    }

    #[test]
    fn registered_settings_keep_id_and_value() {
        for id in 1..=6u64 {
            assert_eq!(
                Setting::new(id, 10),
                Setting::Standard {
                    id: id as u16,
                    value: 10
                }
            );
        }
        assert_eq!(Setting::new(0, 10), Setting::Grease);
        assert_eq!(Setting::new(7, 10), Setting::Grease);
    }

    #[test]
    fn stream_id_omitted_when_absent() {
        let frame = FrameSignature::Other {
            frame_type: "PING".to_string(),
            stream_id: None,
        };
        assert_eq!(frame.to_value(), json!({"frame_type": "PING"}));
    }

    #[test]
    fn round_trip_all_known_types() {
        let frames = vec![
            FrameSignature::Settings {
                stream_id: Some(0),
                settings: vec![Setting::new(3, 100), Setting::new(0xff, 7)],
            },
            FrameSignature::WindowUpdate {
                stream_id: Some(0),
                window_size_increment: 15_663_105,
            },
            FrameSignature::Headers {
                stream_id: Some(13),
                pseudo_headers: vec![":method".to_string(), ":path".to_string()],
            },
            FrameSignature::Priority {
                stream_id: Some(3),
                priority: Priority {
                    dep_stream_id: 0,
                    weight: 201,
                    exclusive: true,
                },
            },
        ];
        for frame in frames {
            let decoded = FrameSignature::from_value(&frame.to_value()).unwrap();
            assert_eq!(decoded, frame);
        }
    }

    #[test]
    fn unknown_type_decodes_to_opaque_frame() {
        // Payload fields of an unrecognized type are dropped, identity kept.
        let record = json!({
            "frame_type": "ALTSVC",
            "stream_id": 0,
            "origin": "example.com"
        });
        let frame = FrameSignature::from_value(&record).unwrap();
        assert_eq!(
            frame,
            FrameSignature::Other {
                frame_type: "ALTSVC".to_string(),
                stream_id: Some(0),
            }
        );
        assert_eq!(
            frame.to_value(),
            json!({"frame_type": "ALTSVC", "stream_id": 0})
        );
    }

    #[test]
    fn numeric_grease_id_decodes_to_grease() {
        let record = json!({
            "frame_type": "SETTINGS",
            "stream_id": 0,
            "settings": [{"id": 2654154306u64, "value": 123}]
        });
        let frame = FrameSignature::from_value(&record).unwrap();
        assert_eq!(
            frame,
            FrameSignature::Settings {
                stream_id: Some(0),
                settings: vec![Setting::Grease],
            }
        );
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let record = json!({"frame_type": "SETTINGS", "stream_id": 0});
        assert!(matches!(
            FrameSignature::from_value(&record),
            Err(DecodeError::MissingField {
                record: "SETTINGS",
                field: "settings"
            })
        ));

        let record = json!({"frame_type": "WINDOW_UPDATE"});
        assert!(matches!(
            FrameSignature::from_value(&record),
            Err(DecodeError::MissingField {
                record: "WINDOW_UPDATE",
                field: "window_size_increment"
            })
        ));

        let record = json!({"frame_type": "PRIORITY", "priority": {"weight": 1, "exclusive": false}});
        assert!(matches!(
            FrameSignature::from_value(&record),
            Err(DecodeError::MissingField {
                record: "PRIORITY",
                field: "dep_stream_id"
            })
        ));
    }

    #[test]
    fn malformed_fields_are_errors() {
        let record = json!({"frame_type": "SETTINGS", "settings": "nope"});
        assert!(matches!(
            FrameSignature::from_value(&record),
            Err(DecodeError::InvalidField { .. })
        ));

        let record = json!({"frame_type": "HEADERS", "pseudo_headers": [1, 2]});
        assert!(matches!(
            FrameSignature::from_value(&record),
            Err(DecodeError::InvalidField { .. })
        ));

        assert!(matches!(
            FrameSignature::from_value(&json!([])),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            FrameSignature::from_value(&json!({"stream_id": 1})),
            Err(DecodeError::MissingFrameType)
        ));
    }
}
