//! Event ingestion, queries and buffer maintenance

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PersistenceResult, ValidationResult};
use crate::normalize::normalize;
use crate::persistence::SnapshotKind;
use crate::types::{LevelStats, LogEvent, LogQuery, QueryResult};
use crate::utils::now_millis_precision;

use super::IngestionService;

impl IngestionService {
    /// Normalize, store and broadcast one payload
    ///
    /// A rejected payload changes nothing.
    pub fn ingest_one(&self, payload: &Value) -> ValidationResult<LogEvent> {
        let event = self.accept(payload).inspect_err(|e| {
            warn!(error = %e, "Rejected log payload");
        })?;
        self.schedule_events_write();
        Ok(event)
    }

    /// Ingest each payload independently, in order
    ///
    /// The result list lines up with the input. One snapshot write is
    /// scheduled if anything was accepted.
    pub fn ingest_batch(&self, payloads: &[Value]) -> Vec<ValidationResult<LogEvent>> {
        let results: Vec<_> = payloads
            .iter()
            .enumerate()
            .map(|(index, payload)| {
                self.accept(payload).inspect_err(|e| {
                    warn!(index, error = %e, "Rejected log payload in batch");
                })
            })
            .collect();

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        if accepted > 0 {
            self.schedule_events_write();
        }
        debug!(accepted, rejected = results.len() - accepted, "Ingested batch");
        results
    }

    fn accept(&self, payload: &Value) -> ValidationResult<LogEvent> {
        let event = normalize(payload, self.ids.next_id(), now_millis_precision())?;

        let mut store = self.state.store.write();
        store.append(event.clone());
        self.hub.publish_event(event.clone());
        drop(store);

        debug!(id = %event.id, emitter = %event.emitter_id, level = %event.level, "Accepted event");
        Ok(event)
    }

    fn schedule_events_write(&self) {
        self.scheduler
            .mark_dirty_and_schedule(SnapshotKind::Events, self.events_provider.clone());
    }

    pub fn query(&self, query: &LogQuery) -> QueryResult {
        self.state.store.read().query(query)
    }

    pub fn recent(&self, count: usize) -> Vec<LogEvent> {
        self.state.store.read().recent(count)
    }

    pub fn level_stats(&self) -> LevelStats {
        self.state.store.read().level_stats()
    }

    /// Empty the buffer, tell subscribers, and write the empty state
    ///
    /// The write happens even when nothing was pending, and leaves the events
    /// kind clean. The in-memory clear and the broadcast stand even if the
    /// write fails.
    pub async fn clear_all(&self) -> PersistenceResult<()> {
        {
            let mut store = self.state.store.write();
            let cleared = store.count();
            store.clear();
            self.hub.publish_clear();
            info!(cleared, "Cleared event buffer");
        }

        self.scheduler
            .flush_forced(SnapshotKind::Events, self.events_provider.clone())
            .await
    }

    /// Write the current buffer now, dirty or not
    pub async fn flush_events(&self) -> PersistenceResult<()> {
        self.scheduler
            .flush_forced(SnapshotKind::Events, self.events_provider.clone())
            .await?;
        info!(count = self.count(), "Saved event buffer on request");
        Ok(())
    }
}
