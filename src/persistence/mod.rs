//! Durable snapshots of the event buffer and the alias table
//!
//! - [`SnapshotBackend`] is the storage seam; [`FileSnapshotStore`] keeps one
//!   JSON document per kind.
//! - [`PersistenceScheduler`] debounces writes per kind and flushes on
//!   shutdown.

mod scheduler;
mod snapshot;

pub use scheduler::{PersistenceScheduler, SnapshotProvider, DEFAULT_WRITE_DELAY};
pub use snapshot::{FileSnapshotStore, SnapshotBackend, SnapshotData, SnapshotKind};
