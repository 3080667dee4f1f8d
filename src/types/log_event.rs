//! Canonical log event and level types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Emitter id used when a payload carries none
pub const UNKNOWN_EMITTER: &str = "unknown";

/// Recognized log levels
///
/// `Warn` and `Warning` are stored as distinct values. They are merged only
/// when levels are aggregated, or when a query asks for it explicitly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    /// All levels in severity order
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Upper-case storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// True for both spellings of the warn bucket
    pub fn is_warn_bucket(&self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Warning)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ValidationError;

    /// Case-insensitive parse; surrounding whitespace is not accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        LogLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == upper)
            .ok_or_else(|| ValidationError::InvalidLevel(s.to_string()))
    }
}

/// A normalized, immutable log event as held in the buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Unique id assigned at ingestion
    pub id: String,

    /// Event instant (inbound timestamp if present, else ingestion time)
    #[serde(deserialize_with = "crate::utils::time::deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Emitter (device, process or application) that produced the event
    #[serde(alias = "deviceId")]
    pub emitter_id: String,

    pub level: LogLevel,

    pub message: String,

    /// Application name reported by device-style emitters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, alias = "source_type", skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,

    /// Opaque extra attributes (app version, session id, ...)
    #[serde(default, alias = "extra", skip_serializing_if = "Option::is_none")]
    pub extension_fields: Option<serde_json::Map<String, serde_json::Value>>,
}

impl LogEvent {
    /// Build an event with only the required fields set
    pub fn new(
        id: String,
        timestamp: DateTime<Utc>,
        emitter_id: String,
        level: LogLevel,
        message: String,
    ) -> Self {
        Self {
            id,
            timestamp,
            emitter_id,
            level,
            message,
            app: None,
            platform: None,
            path: None,
            source_type: None,
            extension_fields: None,
        }
    }
}
