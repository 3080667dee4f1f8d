//! LogHub Server
//!
//! A log ingestion server: accepts structured log events from many remote
//! emitters, keeps a bounded recent-history buffer in memory, persists it
//! with debounced snapshot writes, and fans new events out to live viewers
//! over websocket or server-sent events.
//!
//! # Features
//!
//! - **Two payload shapes**: device-style (`ts`, `msg`, `extra.device_id`)
//!   and generic (`timestamp`, `message`, `emitterId`), normalized into one
//!   canonical [`LogEvent`]
//! - **Bounded buffer**: oldest events are evicted first once full
//! - **Debounced persistence**: a burst of changes becomes one snapshot
//!   write; everything pending is flushed on clean shutdown
//! - **Fan-out**: per-subscriber queues, bootstrap replay on attach
//! - **Aliases**: human-readable names for emitter ids
//!
//! # Modules
//!
//! - `types`: Core data structures (LogEvent, LogLevel, queries, devices)
//! - `normalize`: Payload normalization and validation
//! - `event_store`: The bounded buffer and the alias table
//! - `persistence`: Snapshot backend and the debounce scheduler
//! - `broadcast`: Subscriber registry and real-time messages
//! - `service`: The ingestion service that owns all state
//! - `api`: HTTP, websocket and SSE transport
//! - `config`: Environment-based configuration
//! - `simulator`: Random payload generator for development
//! - `utils`: Atomic writes, timestamps, event ids
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use loghub::{EngineConfig, FileSnapshotStore, IngestionService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(FileSnapshotStore::new("logs-data.json", "device-aliases.json"));
//!     let service = IngestionService::new(EngineConfig::default(), backend);
//!     service
//!         .ingest_one(&json!({"level": "warn", "message": "disk low", "emitterId": "dev-1"}))
//!         .unwrap();
//!     service.shutdown().await.unwrap();
//! }
//! ```

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod event_store;
pub mod normalize;
pub mod persistence;
pub mod service;
pub mod simulator;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use broadcast::{BroadcastHub, HubEvent, Subscription, WsMessage};
pub use config::Config;
pub use error::{PersistenceError, ValidationError};
pub use event_store::{AliasTable, EventStore};
pub use persistence::{FileSnapshotStore, PersistenceScheduler, SnapshotBackend, SnapshotData, SnapshotKind};
pub use service::{EngineConfig, IngestionService, ServiceStatus};
pub use types::{AliasMap, DeviceEntry, LevelStats, LogEvent, LogLevel, LogQuery, QueryResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
