//! In-memory state: the bounded event buffer and the alias table
//!
//! ```text
//! ingest ──► EventStore::append ──► evict head past capacity
//!                 │
//!                 └──► query / recent / emitters / level_stats
//!
//! alias ops ──► AliasTable ──► combined_device_list(emitters)
//! ```
//!
//! Neither type locks or persists anything on its own; the ingestion
//! service owns both behind locks and schedules their snapshots.

mod alias_table;
mod store;

pub use alias_table::AliasTable;
pub use store::{EventStore, EventStoreConfig, DEFAULT_MAX_CAPACITY};
