//! Inbound payload normalization
//!
//! [`normalize`] turns either known payload shape into one canonical
//! [`LogEvent`]. It is a pure function: the id and the fallback instant are
//! supplied by the caller, so the same input always yields the same event.
//!
//! Validation runs before anything is built. A payload without a non-empty
//! string message, or with a level outside the six recognized values, is
//! rejected with a [`ValidationError`].

pub mod rules;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::types::{LogEvent, LogLevel, UNKNOWN_EMITTER};
use crate::utils::time::{from_epoch_millis, parse_timestamp};

use rules::{
    first_match, identifier, non_empty_str, APP_FIELD, EMITTER_RULES, EXTENSION_FIELD,
    LEVEL_RULES, MESSAGE_RULES, PATH_FIELD, PLATFORM_FIELD, SOURCE_TYPE_FIELD, TIMESTAMP_RULES,
};

/// Normalize one inbound payload
///
/// * `id` - the id to assign to the event
/// * `received_at` - ingestion instant, used when the payload has no usable timestamp
pub fn normalize(payload: &Value, id: String, received_at: DateTime<Utc>) -> ValidationResult<LogEvent> {
    let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    let message = resolve_message(fields)?;
    let level = resolve_level(fields)?;

    let timestamp = first_match(fields, TIMESTAMP_RULES, timestamp_value).unwrap_or(received_at);
    let emitter_id = first_match(fields, EMITTER_RULES, identifier)
        .unwrap_or_else(|| UNKNOWN_EMITTER.to_string());

    let mut event = LogEvent::new(id, timestamp, emitter_id, level, message);
    event.app = string_field(APP_FIELD.lookup(fields));
    event.platform = string_field(PLATFORM_FIELD.lookup(fields));
    event.path = string_field(PATH_FIELD.lookup(fields));
    event.source_type = string_field(SOURCE_TYPE_FIELD.lookup(fields));
    event.extension_fields = EXTENSION_FIELD
        .lookup(fields)
        .and_then(Value::as_object)
        .filter(|extra| !extra.is_empty())
        .cloned();

    Ok(event)
}

fn resolve_message(fields: &Map<String, Value>) -> ValidationResult<String> {
    first_match(fields, MESSAGE_RULES, non_empty_str)
        .map(str::to_string)
        .ok_or(ValidationError::MissingMessage)
}

/// Absent, null or empty level defaults to INFO; anything else must parse
fn resolve_level(fields: &Map<String, Value>) -> ValidationResult<LogLevel> {
    let raw = LEVEL_RULES
        .iter()
        .filter_map(|rule| rule.lookup(fields))
        .find(|v| !v.is_null() && v.as_str() != Some(""));

    match raw {
        None => Ok(LogLevel::default()),
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(ValidationError::InvalidLevel(other.to_string())),
    }
}

/// Numbers are epoch milliseconds; strings are parsed
fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch_millis),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}
