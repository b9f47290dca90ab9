//! Namespace codec - where an object's property set lives in the host bag
//! and how it is written there.
//!
//! Every object owns exactly one bag key, `"obj-" + object_id`. The value at
//! that key is a JSON string holding a small envelope:
//!
//! ```text
//! "{\"fmt\":2,\"props\":{\"color\":\"red\",\"size\":3}}"
//! ```
//!
//! The envelope's format tag is what tells current data apart from the
//! legacy layouts that used the same key shape (see [`legacy`]).

pub mod legacy;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Prefix of every namespace key.
pub const NAMESPACE_PREFIX: &str = "obj-";

/// Format tag written into every envelope.
pub const FORMAT_VERSION: u32 = 2;

/// One object's properties, ordered by name.
pub type PropertySet = BTreeMap<String, Value>;

/// Derive the namespace key for an object.
pub fn key_for(object_id: &str) -> String {
    format!("{}{}", NAMESPACE_PREFIX, object_id)
}

/// Object id of a namespace-shaped key, if it carries the prefix.
pub fn object_id_for(key: &str) -> Option<&str> {
    key.strip_prefix(NAMESPACE_PREFIX)
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    fmt: u32,
    props: &'a PropertySet,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    fmt: u32,
    props: PropertySet,
}

/// Encode a property set into the value stored at its namespace key.
pub fn encode(properties: &PropertySet) -> Result<Value, CodecError> {
    let text = serde_json::to_string(&EnvelopeRef {
        fmt: FORMAT_VERSION,
        props: properties,
    })
    .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(Value::String(text))
}

/// Decode a namespace key's value. Anything that is not a current envelope
/// is a [`CodecError::Decode`].
pub fn decode(value: &Value) -> Result<PropertySet, CodecError> {
    let text = match value {
        Value::String(text) => text,
        other => {
            return Err(CodecError::Decode(format!(
                "expected an encoded string, found {}",
                value_kind(other)
            )))
        }
    };

    let envelope = parse_envelope(text)?;
    if envelope.fmt != FORMAT_VERSION {
        return Err(CodecError::Decode(format!(
            "unsupported format version {}",
            envelope.fmt
        )));
    }
    Ok(envelope.props)
}

fn parse_envelope(text: &str) -> Result<Envelope, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
}

/// True when the value is an envelope of any format version. Envelopes from
/// other versions are not current, but they are not legacy data either.
pub fn is_envelope(value: &Value) -> bool {
    match value {
        Value::String(text) => parse_envelope(text).is_ok(),
        _ => false,
    }
}

/// True when the value decodes under the current encoding.
pub fn is_current(value: &Value) -> bool {
    decode(value).is_ok()
}

/// Decode a namespace key's value, degrading to an empty set. Absent data is
/// `null`; anything else that fails to decode is logged.
pub(crate) fn decode_or_empty(key: &str, value: &Value) -> PropertySet {
    if value.is_null() {
        return PropertySet::new();
    }
    match decode(value) {
        Ok(properties) => properties,
        Err(error) => {
            warn!(key = %key, error = %error, "ignoring undecodable object properties");
            PropertySet::new()
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Error type for encoding and decoding property sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The property set could not be serialized.
    Encode(String),
    /// A namespace key holds a value that is not a current envelope.
    Decode(String),
    /// A legacy-shaped key holds a value none of the legacy parsers accept.
    LegacyParse { key: String, reason: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode(msg) => write!(f, "property set encode error: {}", msg),
            CodecError::Decode(msg) => write!(f, "property set decode error: {}", msg),
            CodecError::LegacyParse { key, reason } => {
                write!(f, "unreadable legacy value at {}: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(value: Value) -> PropertySet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn key_for_prefixes_object_id() {
        assert_eq!(key_for("253469"), "obj-253469");
        assert_eq!(key_for(""), "obj-");
        assert_eq!(object_id_for("obj-a-b"), Some("a-b"));
        assert_eq!(object_id_for("metric-a"), None);
    }

    #[test]
    fn encodes_to_a_string_envelope() {
        let encoded = encode(&set(json!({"prop1": "value1"}))).unwrap();
        assert_eq!(
            encoded,
            Value::String(r#"{"fmt":2,"props":{"prop1":"value1"}}"#.into())
        );
    }

    #[test]
    fn round_trips_awkward_values() {
        let props = set(json!({
            "empty": {},
            "dashes": "a-b-c",
            "escapes": "%7B%22 \"quoted\" \\ back",
            "unicode": "héllo ✓",
            "nested": {"list": [1, 2.5, null, true, {"deep": "x"}]},
            "obj-1-p": -7
        }));
        assert_eq!(decode(&encode(&props).unwrap()).unwrap(), props);
    }

    #[test]
    fn round_trips_empty_set() {
        let props = PropertySet::new();
        assert_eq!(decode(&encode(&props).unwrap()).unwrap(), props);
    }

    #[test]
    fn structured_value_is_not_current() {
        let err = decode(&json!({"prop1": "value1"})).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn plain_json_string_is_not_current() {
        assert!(!is_current(&json!(r#"{"prop1":"value1"}"#)));
        assert!(!is_current(&json!(r#"{"fmt":2,"props":{},"extra":1}"#)));
        assert!(!is_current(&json!("not json at all")));
    }

    #[test]
    fn other_format_version_is_still_an_envelope() {
        let foreign = json!(r#"{"fmt":3,"props":{"p":1}}"#);
        assert!(is_envelope(&foreign));
        assert!(!is_current(&foreign));
        assert!(is_envelope(&encode(&PropertySet::new()).unwrap()));
        assert!(!is_envelope(&json!(r#"{"prop1":"value1"}"#)));
        assert!(!is_envelope(&json!({"fmt": 2, "props": {}})));
    }

    #[test]
    fn other_format_version_is_rejected() {
        let err = decode(&json!(r#"{"fmt":3,"props":{}}"#)).unwrap_err();
        assert_eq!(
            err,
            CodecError::Decode("unsupported format version 3".into())
        );
    }

    mod round_trip {
        use super::super::*;
        use proptest::prelude::*;

        fn json_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::from),
                any::<f64>()
                    .prop_filter("finite", |f| f.is_finite())
                    .prop_map(Value::from),
                ".{0,10}".prop_map(Value::String),
            ];
            leaf.prop_recursive(3, 32, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::btree_map(".{0,6}", inner, 0..4)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #[test]
            fn decode_inverts_encode(
                properties in prop::collection::btree_map(".{0,8}", json_value(), 0..6)
            ) {
                let encoded = encode(&properties).unwrap();
                prop_assert_eq!(decode(&encoded).unwrap(), properties);
            }
        }
    }
}
