//! Query filters, results and level statistics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::LogEvent;

/// Default number of events a query returns
pub const DEFAULT_QUERY_LIMIT: usize = 100;

fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

/// Filters for [`crate::event_store::EventStore::query`]
///
/// Every present filter must match (AND). Absent filters impose nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    /// Exact, case-sensitive match against the stored level
    #[serde(default)]
    pub level: Option<String>,

    /// Case-insensitive substring of the emitter id
    #[serde(default, alias = "deviceId")]
    pub emitter_id: Option<String>,

    /// Case-insensitive substring of the message
    #[serde(default)]
    pub keyword: Option<String>,

    /// Keep at most this many of the most recent matches
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Treat WARN and WARNING as one bucket when filtering by level
    #[serde(default)]
    pub merge_warnings: bool,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            level: None,
            emitter_id: None,
            keyword: None,
            limit: DEFAULT_QUERY_LIMIT,
            merge_warnings: false,
        }
    }
}

impl LogQuery {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_emitter(mut self, emitter: impl Into<String>) -> Self {
        self.emitter_id = Some(emitter.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Matching events in insertion order, plus the pre-truncation match count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub data: Vec<LogEvent>,
    pub total: usize,
}

/// Per-level counts over the buffer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStats {
    /// Counts keyed by stored level
    pub by_level: BTreeMap<String, usize>,

    /// WARN + WARNING
    pub warn: usize,

    pub total: usize,
}
