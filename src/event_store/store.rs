//! Event Store - bounded, insertion-ordered event buffer
//!
//! The EventStore keeps the most recent `capacity` events. Appends go to the
//! tail; once the buffer is full the oldest events are evicted from the head
//! in the same call, so a caller never observes more than `capacity` events.
//! Insertion order doubles as recency order.

use std::collections::{HashSet, VecDeque};

use crate::types::{LevelStats, LogEvent, LogLevel, LogQuery, QueryResult};

/// Default buffer capacity
pub const DEFAULT_MAX_CAPACITY: usize = 1000;

/// Configuration for the EventStore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventStoreConfig {
    /// Maximum number of events held at once (at least 1)
    pub max_capacity: usize,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl EventStoreConfig {
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            max_capacity: max_capacity.max(1),
        }
    }
}

/// The bounded event buffer
#[derive(Debug, Clone)]
pub struct EventStore {
    config: EventStoreConfig,
    events: VecDeque<LogEvent>,
}

impl EventStore {
    /// Create an empty store with the default capacity
    pub fn new() -> Self {
        Self::with_config(EventStoreConfig::default())
    }

    /// Create an empty store with a custom config
    pub fn with_config(config: EventStoreConfig) -> Self {
        let config = EventStoreConfig::with_capacity(config.max_capacity);
        Self {
            config,
            events: VecDeque::with_capacity(config.max_capacity),
        }
    }

    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.config.max_capacity
    }

    /// Append at the tail, evicting from the head past capacity
    ///
    /// Returns how many events were evicted.
    pub fn append(&mut self, event: LogEvent) -> usize {
        self.events.push_back(event);
        self.evict_overflow()
    }

    /// Replace the whole buffer, e.g. with a loaded snapshot
    ///
    /// Keeps only the newest `capacity` events of `events`.
    pub fn replace_all(&mut self, events: Vec<LogEvent>) -> usize {
        self.events = events.into();
        self.evict_overflow()
    }

    fn evict_overflow(&mut self) -> usize {
        let overflow = self.events.len().saturating_sub(self.config.max_capacity);
        if overflow > 0 {
            self.events.drain(..overflow);
        }
        overflow
    }

    /// The most recent `query.limit` events matching every present filter
    ///
    /// Results stay in insertion order. `total` counts all matches before
    /// the limit is applied.
    pub fn query(&self, query: &LogQuery) -> QueryResult {
        let level = query.level.as_deref().filter(|l| !l.is_empty());
        let emitter = lowercase_filter(query.emitter_id.as_deref());
        let keyword = lowercase_filter(query.keyword.as_deref());

        let matches: Vec<&LogEvent> = self
            .events
            .iter()
            .filter(|e| level.map_or(true, |l| level_matches(e.level, l, query.merge_warnings)))
            .filter(|e| {
                emitter
                    .as_deref()
                    .map_or(true, |needle| e.emitter_id.to_lowercase().contains(needle))
            })
            .filter(|e| {
                keyword
                    .as_deref()
                    .map_or(true, |needle| e.message.to_lowercase().contains(needle))
            })
            .collect();

        let total = matches.len();
        let skip = total.saturating_sub(query.limit);
        let data = matches.into_iter().skip(skip).cloned().collect();

        QueryResult { data, total }
    }

    /// The last `count` events (fewer if the store holds less)
    pub fn recent(&self, count: usize) -> Vec<LogEvent> {
        let skip = self.events.len().saturating_sub(count);
        self.events.iter().skip(skip).cloned().collect()
    }

    /// Every buffered event, oldest first
    pub fn all(&self) -> Vec<LogEvent> {
        self.events.iter().cloned().collect()
    }

    /// Full reset
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Distinct emitter ids in first-seen order
    pub fn emitters(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .filter(|e| seen.insert(e.emitter_id.as_str()))
            .map(|e| e.emitter_id.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Per-level counts; WARN and WARNING share the `warn` bucket
    pub fn level_stats(&self) -> LevelStats {
        let mut stats = LevelStats::default();
        for level in LogLevel::ALL {
            stats.by_level.insert(level.as_str().to_string(), 0);
        }
        for event in &self.events {
            *stats.by_level.entry(event.level.as_str().to_string()).or_insert(0) += 1;
            if event.level.is_warn_bucket() {
                stats.warn += 1;
            }
        }
        stats.total = self.events.len();
        stats
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lowercase_filter(filter: Option<&str>) -> Option<String> {
    filter.filter(|f| !f.is_empty()).map(str::to_lowercase)
}

fn level_matches(level: LogLevel, filter: &str, merge_warnings: bool) -> bool {
    if level.as_str() == filter {
        return true;
    }
    merge_warnings && level.is_warn_bucket() && (filter == "WARN" || filter == "WARNING")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(n: usize, emitter: &str, level: LogLevel, message: &str) -> LogEvent {
        LogEvent::new(
            format!("id-{}", n),
            Utc.timestamp_millis_opt(1_700_000_000_000 + n as i64).unwrap(),
            emitter.to_string(),
            level,
            message.to_string(),
        )
    }

    fn filled(count: usize, capacity: usize) -> EventStore {
        let mut store = EventStore::with_config(EventStoreConfig::with_capacity(capacity));
        for i in 0..count {
            store.append(event(i, "dev", LogLevel::Info, "m"));
        }
        store
    }

    #[test]
    fn test_append_evicts_oldest_first() {
        let mut store = filled(5, 5);
        let evicted = store.append(event(5, "dev", LogLevel::Info, "m"));

        assert_eq!(evicted, 1);
        assert_eq!(store.count(), 5);
        let ids: Vec<String> = store.all().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["id-1", "id-2", "id-3", "id-4", "id-5"]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut store = EventStore::with_config(EventStoreConfig::with_capacity(3));
        for i in 0..50 {
            store.append(event(i, "dev", LogLevel::Info, "m"));
            assert!(store.count() <= 3);
        }
        assert_eq!(store.recent(3)[0].id, "id-47");
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let store = EventStore::with_config(EventStoreConfig { max_capacity: 0 });
        assert_eq!(store.capacity(), 1);
    }

    #[test]
    fn test_query_no_filters_returns_all_in_order() {
        let store = filled(10, 100);
        let result = store.query(&LogQuery::default().with_limit(10));

        assert_eq!(result.total, 10);
        assert_eq!(result.data, store.all());
    }

    #[test]
    fn test_query_limit_keeps_most_recent() {
        let store = filled(10, 100);
        let result = store.query(&LogQuery::default().with_limit(3));

        assert_eq!(result.total, 10);
        let ids: Vec<&str> = result.data.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["id-7", "id-8", "id-9"]);
    }

    #[test]
    fn test_query_level_is_exact_and_case_sensitive() {
        let mut store = EventStore::new();
        store.append(event(0, "a", LogLevel::Error, "boom"));
        store.append(event(1, "a", LogLevel::Info, "fine"));
        store.append(event(2, "a", LogLevel::Warning, "hmm"));

        let errors = store.query(&LogQuery::default().with_level("ERROR"));
        assert_eq!(errors.total, 1);
        assert_eq!(errors.data[0].level, LogLevel::Error);

        assert_eq!(store.query(&LogQuery::default().with_level("error")).total, 0);
        assert_eq!(store.query(&LogQuery::default().with_level("WARN")).total, 0);
    }

    #[test]
    fn test_query_merged_warnings() {
        let mut store = EventStore::new();
        store.append(event(0, "a", LogLevel::Warn, "w1"));
        store.append(event(1, "a", LogLevel::Warning, "w2"));
        store.append(event(2, "a", LogLevel::Error, "e"));

        let mut query = LogQuery::default().with_level("WARN");
        query.merge_warnings = true;
        assert_eq!(store.query(&query).total, 2);
    }

    #[test]
    fn test_query_substrings_case_insensitive_and_combined() {
        let mut store = EventStore::new();
        store.append(event(0, "Lobby-Kiosk-1", LogLevel::Error, "Disk LOW on /var"));
        store.append(event(1, "lobby-kiosk-2", LogLevel::Error, "network down"));
        store.append(event(2, "gate-1", LogLevel::Error, "disk low"));

        let result = store.query(
            &LogQuery::default()
                .with_emitter("KIOSK")
                .with_keyword("disk")
                .with_level("ERROR"),
        );
        assert_eq!(result.total, 1);
        assert_eq!(result.data[0].emitter_id, "Lobby-Kiosk-1");
    }

    #[test]
    fn test_query_empty_filters_ignored() {
        let store = filled(4, 10);
        let result = store.query(&LogQuery::default().with_level("").with_keyword(""));
        assert_eq!(result.total, 4);
    }

    #[test]
    fn test_recent_with_fewer_events() {
        let store = filled(2, 10);
        assert_eq!(store.recent(100).len(), 2);
        assert!(EventStore::new().recent(5).is_empty());
    }

    #[test]
    fn test_emitters_first_seen_order() {
        let mut store = EventStore::new();
        for (i, emitter) in ["b", "a", "b", "c", "a"].iter().enumerate() {
            store.append(event(i, emitter, LogLevel::Info, "m"));
        }
        assert_eq!(store.emitters(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut store = filled(3, 10);
        store.clear();
        assert!(store.is_empty());
        assert!(store.emitters().is_empty());
    }

    #[test]
    fn test_replace_all_truncates_to_newest() {
        let mut store = EventStore::with_config(EventStoreConfig::with_capacity(2));
        let events = (0..5).map(|i| event(i, "d", LogLevel::Info, "m")).collect();
        assert_eq!(store.replace_all(events), 3);
        let ids: Vec<String> = store.all().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["id-3", "id-4"]);
    }

    #[test]
    fn test_level_stats_merge_warn_bucket() {
        let mut store = EventStore::new();
        store.append(event(0, "a", LogLevel::Warn, "m"));
        store.append(event(1, "a", LogLevel::Warning, "m"));
        store.append(event(2, "a", LogLevel::Fatal, "m"));

        let stats = store.level_stats();
        assert_eq!(stats.warn, 2);
        assert_eq!(stats.by_level["WARN"], 1);
        assert_eq!(stats.by_level["WARNING"], 1);
        assert_eq!(stats.by_level["DEBUG"], 0);
        assert_eq!(stats.total, 3);
    }
}
