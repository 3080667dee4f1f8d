//! Time and timestamp utilities

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Current instant, truncated to millisecond precision
pub fn now_millis_precision() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Current Unix timestamp in milliseconds
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Interpret a number as epoch milliseconds
///
/// Returns `None` for values outside chrono's representable range.
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Parse a timestamp string
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00.123Z`, offsets allowed), a naive
/// `YYYY-MM-DD HH:MM:SS[.fff]` taken as UTC, or a decimal epoch-milliseconds
/// string.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    value.parse::<i64>().ok().and_then(from_epoch_millis)
}

/// Deserialize a stored timestamp leniently
///
/// Snapshots written by older deployments hold whatever string the emitter
/// sent, so anything [`parse_timestamp`] accepts is read back, as are bare
/// epoch-millisecond numbers.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Millis(i64),
        Text(String),
    }

    match Stored::deserialize(deserializer)? {
        Stored::Millis(ms) => from_epoch_millis(ms)
            .ok_or_else(|| serde::de::Error::custom(format!("epoch millis out of range: {}", ms))),
        Stored::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp '{}'", text))),
    }
}
