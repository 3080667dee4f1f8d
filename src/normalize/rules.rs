//! Ordered extraction rules for each canonical field
//!
//! Inbound payloads come in two shapes. Device-style emitters send
//! `{ts, level, msg, app, platform, path, source_type, extra: {device_id, ..}}`;
//! generic emitters send `{timestamp, level, message, emitterId | deviceId}`.
//! Each canonical field is resolved by trying its rules in order; the first
//! rule that yields a usable value wins.

use serde_json::{Map, Value};

/// Location of a candidate value in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    /// A top-level key
    Top(&'static str),
    /// A key inside a top-level object
    Nested(&'static str, &'static str),
}

impl FieldPath {
    /// Look the path up in a payload object
    pub fn lookup<'a>(&self, payload: &'a Map<String, Value>) -> Option<&'a Value> {
        match *self {
            FieldPath::Top(key) => payload.get(key),
            FieldPath::Nested(outer, inner) => payload.get(outer)?.as_object()?.get(inner),
        }
    }
}

/// Epoch-millisecond field first, then the string timestamp field
pub const TIMESTAMP_RULES: &[FieldPath] = &[FieldPath::Top("ts"), FieldPath::Top("timestamp")];

/// Nested device id first, then the flat emitter id (either spelling)
pub const EMITTER_RULES: &[FieldPath] = &[
    FieldPath::Nested("extra", "device_id"),
    FieldPath::Top("emitterId"),
    FieldPath::Top("deviceId"),
];

pub const LEVEL_RULES: &[FieldPath] = &[FieldPath::Top("level")];

/// Short form first, then long form
pub const MESSAGE_RULES: &[FieldPath] = &[FieldPath::Top("msg"), FieldPath::Top("message")];

/// Descriptive string fields copied through as-is when present
pub const APP_FIELD: FieldPath = FieldPath::Top("app");
pub const PLATFORM_FIELD: FieldPath = FieldPath::Top("platform");
pub const PATH_FIELD: FieldPath = FieldPath::Top("path");
pub const SOURCE_TYPE_FIELD: FieldPath = FieldPath::Top("source_type");

/// Opaque attribute map
pub const EXTENSION_FIELD: FieldPath = FieldPath::Top("extra");

/// First rule whose value `extract` accepts
pub fn first_match<'a, T, F>(payload: &'a Map<String, Value>, rules: &[FieldPath], extract: F) -> Option<T>
where
    F: Fn(&'a Value) -> Option<T>,
{
    rules
        .iter()
        .filter_map(|rule| rule.lookup(payload))
        .find_map(extract)
}

/// A non-empty string
pub fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// A non-empty string, or a number rendered as one
pub fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
