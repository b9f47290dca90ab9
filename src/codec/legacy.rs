//! Legacy layouts - the encodings older releases wrote into the bag.
//!
//! Three layouts are still recognized:
//!
//! * [`LayoutKind::PerProperty`]: one key per (object, property), shaped
//!   `<tag>-<object_id>-<property>` with tag `metric`, `obj` or `object`.
//! * [`LayoutKind::Structured`]: `obj-<object_id>` holding the whole set as
//!   a JSON object.
//! * [`LayoutKind::Serialized`]: `obj-<object_id>` holding the whole set as
//!   JSON text, either plain or run through JavaScript's `escape()`.
//!
//! Layouts are plain structs with a parser function pointer, tried in the
//! order of [`LEGACY_LAYOUTS`]; the first one whose shape matches decides.

use std::fmt;

use serde_json::Value;

use super::{is_envelope, object_id_for, value_kind, CodecError, PropertySet};

/// Separator used by the per-property layout.
pub const SEPARATOR: char = '-';

/// Tags the per-property layout was written under.
pub const PER_PROPERTY_TAGS: &[&str] = &["metric", "obj", "object"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    PerProperty,
    Structured,
    Serialized,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutKind::PerProperty => "per-property",
            LayoutKind::Structured => "structured",
            LayoutKind::Serialized => "serialized",
        };
        f.write_str(name)
    }
}

/// Data recovered from one legacy key.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyRecord {
    Property {
        object_id: String,
        name: String,
        value: Value,
    },
    Set {
        object_id: String,
        properties: PropertySet,
    },
}

impl LegacyRecord {
    pub fn object_id(&self) -> &str {
        match self {
            LegacyRecord::Property { object_id, .. } | LegacyRecord::Set { object_id, .. } => {
                object_id
            }
        }
    }
}

/// A recognized legacy layout.
///
/// `parse` returns `None` when the key/value shape is not this layout,
/// `Some(Err(reason))` when the shape matches but the value is unreadable.
pub struct LegacyLayout {
    pub kind: LayoutKind,
    pub parse: fn(key: &str, value: &Value) -> Option<Result<LegacyRecord, String>>,
}

/// All legacy layouts in priority order.
pub static LEGACY_LAYOUTS: &[LegacyLayout] = &[
    LegacyLayout {
        kind: LayoutKind::PerProperty,
        parse: parse_per_property,
    },
    LegacyLayout {
        kind: LayoutKind::Structured,
        parse: parse_structured,
    },
    LegacyLayout {
        kind: LayoutKind::Serialized,
        parse: parse_serialized,
    },
];

/// Outcome of classifying one bag entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Current data, or a key no legacy layout claims.
    NotLegacy,
    Legacy {
        kind: LayoutKind,
        record: LegacyRecord,
    },
    /// Legacy-shaped but unreadable. `object_id` is set when the key is the
    /// object's own namespace key.
    Unreadable {
        kind: LayoutKind,
        object_id: Option<String>,
        error: CodecError,
    },
}

/// Classify one bag entry against the legacy layouts.
///
/// Namespace-shaped keys holding an envelope of any format version are never
/// legacy, even when their object id contains the separator.
pub fn classify(key: &str, value: &Value) -> Classification {
    if object_id_for(key).is_some() && is_envelope(value) {
        return Classification::NotLegacy;
    }

    for layout in LEGACY_LAYOUTS {
        match (layout.parse)(key, value) {
            None => continue,
            Some(Ok(record)) => {
                return Classification::Legacy {
                    kind: layout.kind,
                    record,
                }
            }
            Some(Err(reason)) => {
                let object_id = match layout.kind {
                    LayoutKind::PerProperty => None,
                    _ => object_id_for(key).map(str::to_string),
                };
                return Classification::Unreadable {
                    kind: layout.kind,
                    object_id,
                    error: CodecError::LegacyParse {
                        key: key.to_string(),
                        reason,
                    },
                };
            }
        }
    }

    Classification::NotLegacy
}

fn parse_per_property(key: &str, value: &Value) -> Option<Result<LegacyRecord, String>> {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();
    match segments.as_slice() {
        [tag, object_id, name] if PER_PROPERTY_TAGS.contains(tag) => {
            Some(Ok(LegacyRecord::Property {
                object_id: (*object_id).to_string(),
                name: (*name).to_string(),
                value: value.clone(),
            }))
        }
        _ => None,
    }
}

fn parse_structured(key: &str, value: &Value) -> Option<Result<LegacyRecord, String>> {
    let object_id = object_id_for(key)?;
    let Value::Object(map) = value else {
        return None;
    };

    let properties = map
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Some(Ok(LegacyRecord::Set {
        object_id: object_id.to_string(),
        properties,
    }))
}

fn parse_serialized(key: &str, value: &Value) -> Option<Result<LegacyRecord, String>> {
    let object_id = object_id_for(key)?;
    let Value::String(text) = value else {
        return None;
    };

    let parsed = parse_set(text).or_else(|plain_err| {
        if !text.contains('%') {
            return Err(plain_err);
        }
        let unescaped = unescape(text)?;
        parse_set(&unescaped)
    });

    Some(parsed.map(|properties| LegacyRecord::Set {
        object_id: object_id.to_string(),
        properties,
    }))
}

fn parse_set(text: &str) -> Result<PropertySet, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(format!("expected a JSON object, found {}", value_kind(&other))),
    }
}

/// JavaScript `escape()`: keeps ASCII alphanumerics and `@*_+-./`, writes
/// other UTF-16 code units as `%XX` or `%uXXXX`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match char::from_u32(u32::from(unit)) {
            Some(c) if c.is_ascii_alphanumeric() || "@*_+-./".contains(c) => out.push(c),
            _ if unit < 0x100 => out.push_str(&format!("%{:02X}", unit)),
            _ => out.push_str(&format!("%u{:04X}", unit)),
        }
    }
    out
}

/// JavaScript `unescape()`. Malformed escapes are kept literally, as the
/// browser does; lone surrogates are an error.
pub fn unescape(text: &str) -> Result<String, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut units: Vec<u16> = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '%' {
            if chars.get(i + 1) == Some(&'u') {
                if let Some(unit) = hex_at(&chars, i + 2, 4) {
                    units.push(unit);
                    i += 6;
                    continue;
                }
            } else if let Some(unit) = hex_at(&chars, i + 1, 2) {
                units.push(unit);
                i += 3;
                continue;
            }
        }

        let mut buf = [0u16; 2];
        units.extend_from_slice(chars[i].encode_utf16(&mut buf));
        i += 1;
    }

    String::from_utf16(&units).map_err(|e| e.to_string())
}

fn hex_at(chars: &[char], start: usize, len: usize) -> Option<u16> {
    let digits = chars.get(start..start + len)?;
    digits.iter().try_fold(0u16, |acc, c| {
        c.to_digit(16).map(|d| (acc << 4) | d as u16)
    })
}
