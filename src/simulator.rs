//! Development log simulator
//!
//! Feeds a random payload through the normal ingestion path at a fixed
//! interval, so a fresh development server has something to show.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::service::IngestionService;

const LEVELS: &[&str] = &["DEBUG", "INFO", "WARN", "ERROR"];
const DEVICES: &[&str] = &["device-001", "device-002", "device-003"];
const MESSAGES: &[&str] = &[
    "System started",
    "Data sync complete",
    "Memory usage: 75%",
    "Connection timed out",
    "Database query complete",
    "User signed in",
    "File upload complete",
    "Cache refreshed",
    "Scheduled job ran",
    "Network request succeeded",
];

/// Build one random generic-format payload
pub fn random_payload() -> Value {
    let mut rng = rand::thread_rng();
    json!({
        "deviceId": DEVICES.choose(&mut rng).copied().unwrap_or("device-001"),
        "level": LEVELS.choose(&mut rng).copied().unwrap_or("INFO"),
        "message": MESSAGES.choose(&mut rng).copied().unwrap_or("System started"),
    })
}

/// A running simulator; stops when [`stop`](LogSimulator::stop) is called or
/// the handle is dropped
#[derive(Debug)]
pub struct LogSimulator {
    task: JoinHandle<()>,
}

impl LogSimulator {
    pub fn start(service: Arc<IngestionService>, every: Duration) -> Self {
        info!(interval_ms = every.as_millis() as u64, "Log simulator started");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = service.ingest_one(&random_payload()) {
                    warn!(error = %e, "Simulated payload rejected");
                }
            }
        });

        Self { task }
    }

    pub fn stop(self) {
        self.task.abort();
        info!("Log simulator stopped");
    }
}

impl Drop for LogSimulator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::persistence::{SnapshotBackend, SnapshotData, SnapshotKind};
    use crate::service::EngineConfig;
    use crate::error::PersistenceResult;

    struct NullBackend;

    impl SnapshotBackend for NullBackend {
        fn write(&self, _data: &SnapshotData) -> PersistenceResult<()> {
            Ok(())
        }

        fn load(&self, _kind: SnapshotKind) -> PersistenceResult<Option<SnapshotData>> {
            Ok(None)
        }
    }

    #[test]
    fn test_random_payloads_are_valid() {
        for _ in 0..50 {
            let payload = random_payload();
            assert!(normalize(&payload, "sim".to_string(), chrono::Utc::now()).is_ok());
            assert!(DEVICES.contains(&payload["deviceId"].as_str().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_simulator_ingests_until_stopped() {
        let service = Arc::new(IngestionService::new(EngineConfig::default(), Arc::new(NullBackend)));
        let simulator = LogSimulator::start(service.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(80)).await;
        simulator.stop();
        let produced = service.count();
        assert!(produced > 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.count(), produced);
    }
}
