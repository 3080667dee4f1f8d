//! Ingestion service - the single owner of the buffer and alias table
//!
//! `IngestionService` ties the pieces together:
//!
//! ```text
//! payload ─► normalize ─► EventStore::append ─► BroadcastHub::publish_event
//!                                        └────► PersistenceScheduler (events)
//! alias op ─► AliasTable ─► BroadcastHub::publish_alias_* ─► scheduler (aliases)
//! ```
//!
//! Locking: the store and the alias table each sit behind a
//! `parking_lot::RwLock`. When both are needed the store is locked first.
//! Publishing happens while the mutating write lock is held, so broadcast
//! order always equals mutation order, and a new subscriber (which takes
//! both read locks) can never miss or reorder a live message relative to its
//! bootstrap.

mod aliases;
mod ingest;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::broadcast::{BroadcastHub, SubscriberId, Subscription, DEFAULT_QUEUE_CAPACITY};
use crate::error::PersistenceResult;
use crate::event_store::{AliasTable, EventStore, EventStoreConfig, DEFAULT_MAX_CAPACITY};
use crate::persistence::{
    PersistenceScheduler, SnapshotBackend, SnapshotData, SnapshotKind, SnapshotProvider,
    DEFAULT_WRITE_DELAY,
};
use crate::utils::EventIdGenerator;

/// Default number of events replayed to a new subscriber
pub const DEFAULT_HISTORY_REPLAY: usize = 100;

/// Tunables for the core engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum events held in memory
    pub max_capacity: usize,
    /// Events replayed to a new subscriber
    pub history_replay: usize,
    /// Per-subscriber queue length
    pub subscriber_queue: usize,
    /// Debounce delay for snapshot writes
    pub write_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            history_replay: DEFAULT_HISTORY_REPLAY,
            subscriber_queue: DEFAULT_QUEUE_CAPACITY,
            write_delay: DEFAULT_WRITE_DELAY,
        }
    }
}

/// Persistence status as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Whether any kind has changes not yet on disk
    pub has_changes: bool,
    pub logs_count: usize,
    pub capacity: usize,
    /// Event snapshot location, if the backend has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

struct SharedState {
    store: RwLock<EventStore>,
    aliases: RwLock<AliasTable>,
}

pub struct IngestionService {
    state: Arc<SharedState>,
    hub: BroadcastHub,
    scheduler: PersistenceScheduler,
    ids: EventIdGenerator,
    history_replay: usize,
    events_provider: SnapshotProvider,
    aliases_provider: SnapshotProvider,
}

impl std::fmt::Debug for IngestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService")
            .field("count", &self.count())
            .field("aliases", &self.alias_count())
            .field("subscribers", &self.hub.subscriber_count())
            .finish()
    }
}

impl IngestionService {
    /// Build the engine and restore both snapshots from `backend`
    ///
    /// A loaded event list longer than the capacity keeps its newest events.
    pub fn new(config: EngineConfig, backend: Arc<dyn SnapshotBackend>) -> Self {
        let scheduler = PersistenceScheduler::new(backend, config.write_delay);

        let mut store = EventStore::with_config(EventStoreConfig::with_capacity(config.max_capacity));
        let loaded = scheduler.load_on_startup(SnapshotKind::Events).into_events();
        let truncated = store.replace_all(loaded);
        if truncated > 0 {
            info!(dropped = truncated, capacity = store.capacity(), "Truncated loaded events to capacity");
        }

        let aliases = AliasTable::from_map(scheduler.load_on_startup(SnapshotKind::Aliases).into_aliases());

        let state = Arc::new(SharedState {
            store: RwLock::new(store),
            aliases: RwLock::new(aliases),
        });

        let events_state = state.clone();
        let events_provider: SnapshotProvider =
            Arc::new(move || SnapshotData::Events(events_state.store.read().all()));
        let aliases_state = state.clone();
        let aliases_provider: SnapshotProvider =
            Arc::new(move || SnapshotData::Aliases(aliases_state.aliases.read().all_aliases().clone()));

        Self {
            state,
            hub: BroadcastHub::new(config.subscriber_queue),
            scheduler,
            ids: EventIdGenerator::new(),
            history_replay: config.history_replay,
            events_provider,
            aliases_provider,
        }
    }

    /// Attach a live subscriber
    ///
    /// The subscription's queue starts with the recent history and the full
    /// alias map, in that order.
    pub fn subscribe(&self) -> Subscription {
        let store = self.state.store.read();
        let aliases = self.state.aliases.read();
        self.hub
            .subscribe(store.recent(self.history_replay), aliases.all_aliases().clone())
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.hub.unsubscribe(id)
    }

    pub fn status(&self) -> ServiceStatus {
        let store = self.state.store.read();
        ServiceStatus {
            has_changes: self.scheduler.has_unsaved_changes(),
            logs_count: store.count(),
            capacity: store.capacity(),
            file_path: self.scheduler.location(SnapshotKind::Events),
        }
    }

    pub fn count(&self) -> usize {
        self.state.store.read().count()
    }

    pub fn alias_count(&self) -> usize {
        self.state.aliases.read().len()
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn scheduler(&self) -> &PersistenceScheduler {
        &self.scheduler
    }

    /// Flush everything still pending; called once on process exit
    pub async fn shutdown(&self) -> PersistenceResult<()> {
        info!("Flushing pending snapshots");
        self.scheduler.shutdown().await
    }
}
