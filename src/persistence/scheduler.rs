//! Debounced snapshot writes
//!
//! Each snapshot kind runs its own small state machine:
//!
//! ```text
//!            mark_dirty_and_schedule
//!   Clean ───────────────────────────► Dirty(provider) ──┐
//!     ▲                                  │   ▲           │ re-mark: abort timer,
//!     │      timer fires / flush_now     │   └───────────┘ restart it
//!     └──────────────────────────────────┘
//!              (write succeeded)
//! ```
//!
//! The provider is only called when a write actually happens, so a burst of
//! marks inside one delay window produces a single write of the latest state.
//! A failed write leaves the kind dirty; the next mark, flush or shutdown
//! retries it.
//!
//! Every dirty mark bumps a per-kind generation. A write only returns the
//! kind to `Clean` if no mark happened since the generation was read, which
//! keeps a mutation that raced with a write from being forgotten.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{PersistenceError, PersistenceResult};

use super::snapshot::{expect_kind, SnapshotBackend, SnapshotData, SnapshotKind};

/// Produces the current state of one kind at write time
pub type SnapshotProvider = Arc<dyn Fn() -> SnapshotData + Send + Sync>;

/// Default debounce delay
pub const DEFAULT_WRITE_DELAY: Duration = Duration::from_secs(3);

enum DirtyState {
    Clean,
    Dirty(SnapshotProvider),
}

struct KindSlot {
    state: DirtyState,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl KindSlot {
    fn new() -> Self {
        Self {
            state: DirtyState::Clean,
            timer: None,
            generation: 0,
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Inner {
    backend: Arc<dyn SnapshotBackend>,
    delay: Duration,
    slots: Mutex<[KindSlot; 2]>,
    /// Serializes writes of one kind so an older state never lands last
    io: [tokio::sync::Mutex<()>; 2],
    closed: AtomicBool,
}

/// Debounces snapshot writes per kind
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct PersistenceScheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PersistenceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceScheduler")
            .field("delay", &self.inner.delay)
            .field("has_unsaved_changes", &self.has_unsaved_changes())
            .finish()
    }
}

impl PersistenceScheduler {
    pub fn new(backend: Arc<dyn SnapshotBackend>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                delay,
                slots: Mutex::new([KindSlot::new(), KindSlot::new()]),
                io: [tokio::sync::Mutex::new(()), tokio::sync::Mutex::new(())],
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Mark a kind dirty and (re)start its debounce timer
    ///
    /// Must be called from within a tokio runtime. After [`shutdown`] the
    /// kind is still marked dirty but no timer is started.
    ///
    /// [`shutdown`]: PersistenceScheduler::shutdown
    pub fn mark_dirty_and_schedule(&self, kind: SnapshotKind, provider: SnapshotProvider) {
        let mut slots = self.inner.slots.lock();
        let slot = &mut slots[kind.index()];

        slot.cancel_timer();
        slot.generation += 1;
        slot.state = DirtyState::Dirty(provider);

        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }

        let generation = slot.generation;
        let inner = self.inner.clone();
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            // The write runs detached so that aborting a stale timer can
            // never interrupt a write in progress.
            tokio::spawn(async move {
                if let Err(e) = inner.write_dirty(kind, Some(generation)).await {
                    error!(kind = %kind, error = %e, "Debounced snapshot write failed");
                }
            });
        }));
    }

    /// Write a kind now if it is dirty
    ///
    /// Returns whether a write happened.
    pub async fn flush_now(&self, kind: SnapshotKind) -> PersistenceResult<bool> {
        self.inner.slots.lock()[kind.index()].cancel_timer();
        self.inner.write_dirty(kind, None).await
    }

    /// Write the provider's current state regardless of dirty state
    ///
    /// Used for clearing and manual saves, where the state has to reach disk
    /// even when nothing was pending. On success the kind is clean and its
    /// timer cancelled, unless a mark raced the write.
    pub async fn flush_forced(&self, kind: SnapshotKind, provider: SnapshotProvider) -> PersistenceResult<()> {
        let _io = self.inner.io[kind.index()].lock().await;
        let generation = self.inner.slots.lock()[kind.index()].generation;
        let data = expect_kind(kind, provider())?;
        self.inner.write(data).await?;
        self.inner.mark_clean_if(kind, generation);
        Ok(())
    }

    /// Read the last snapshot of a kind
    ///
    /// A missing or unreadable snapshot yields the empty state; the failure
    /// is logged, never raised.
    pub fn load_on_startup(&self, kind: SnapshotKind) -> SnapshotData {
        let loaded = self
            .inner
            .backend
            .load(kind)
            .and_then(|data| data.map(|d| expect_kind(kind, d)).transpose());

        match loaded {
            Ok(Some(data)) => {
                info!(kind = %kind, entries = data.len(), "Loaded snapshot");
                data
            }
            Ok(None) => {
                info!(kind = %kind, "No snapshot found, starting empty");
                SnapshotData::empty(kind)
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to load snapshot, starting empty");
                SnapshotData::empty(kind)
            }
        }
    }

    pub fn is_dirty(&self, kind: SnapshotKind) -> bool {
        matches!(self.inner.slots.lock()[kind.index()].state, DirtyState::Dirty(_))
    }

    pub fn has_unsaved_changes(&self) -> bool {
        SnapshotKind::ALL.iter().any(|kind| self.is_dirty(*kind))
    }

    pub fn location(&self, kind: SnapshotKind) -> Option<std::path::PathBuf> {
        self.inner.backend.location(kind)
    }

    /// Cancel every timer, then flush each dirty kind once
    ///
    /// Errors are logged per kind; the first one is returned after all
    /// kinds have been attempted.
    pub async fn shutdown(&self) -> PersistenceResult<()> {
        self.inner.closed.store(true, Ordering::SeqCst);
        {
            let mut slots = self.inner.slots.lock();
            for slot in slots.iter_mut() {
                slot.cancel_timer();
            }
        }

        let mut first_error = None;
        for kind in SnapshotKind::ALL {
            match self.inner.write_dirty(kind, None).await {
                Ok(true) => info!(kind = %kind, "Flushed snapshot on shutdown"),
                Ok(false) => debug!(kind = %kind, "Nothing to flush on shutdown"),
                Err(e) => {
                    error!(kind = %kind, error = %e, "Shutdown flush failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Inner {
    /// Write the current state of a dirty kind
    ///
    /// With `expected` set (timer path), the write is skipped when a newer
    /// mark has superseded the timer.
    async fn write_dirty(&self, kind: SnapshotKind, expected: Option<u64>) -> PersistenceResult<bool> {
        let _io = self.io[kind.index()].lock().await;

        let (provider, generation) = {
            let slots = self.slots.lock();
            let slot = &slots[kind.index()];
            match &slot.state {
                DirtyState::Clean => return Ok(false),
                DirtyState::Dirty(_) if expected.is_some_and(|g| g != slot.generation) => {
                    return Ok(false);
                }
                DirtyState::Dirty(provider) => (provider.clone(), slot.generation),
            }
        };

        let data = expect_kind(kind, provider())?;
        let entries = data.len();
        self.write(data).await?;

        self.mark_clean_if(kind, generation);
        info!(kind = %kind, entries, "Snapshot written");
        Ok(true)
    }

    async fn write(&self, data: SnapshotData) -> PersistenceResult<()> {
        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || backend.write(&data))
            .await
            .map_err(|e| PersistenceError::Io(std::io::Error::other(e)))?
    }

    fn mark_clean_if(&self, kind: SnapshotKind, generation: u64) {
        let mut slots = self.slots.lock();
        let slot = &mut slots[kind.index()];
        if slot.generation == generation {
            slot.state = DirtyState::Clean;
            slot.cancel_timer();
        } else {
            debug!(kind = %kind, "State changed during write, keeping dirty");
        }
    }
}
