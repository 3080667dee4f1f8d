//! Subscriber registry and fan-out
//!
//! Every subscriber owns a bounded queue. Publishing never waits. A
//! subscriber whose queue is full is evicted: its sender is dropped, so the
//! receiver drains what is already queued and then sees the end of the
//! channel. It never silently misses a message in the middle of its stream.
//! One stalled consumer therefore cannot hold up ingestion or any other
//! consumer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::types::{AliasMap, DeviceEntry, LogEvent};

use super::events::{HubEvent, WsMessage};

/// Default per-subscriber queue length
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Bootstrap needs two slots (history, aliases)
const MIN_QUEUE_CAPACITY: usize = 2;

pub type SubscriberId = u64;

/// The receiving side handed to a transport connection
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<WsMessage>,
}

#[derive(Debug)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<WsMessage>>>,
    next_subscriber: AtomicU64,
    sequence_counter: AtomicU64,
    lagged: AtomicU64,
    queue_capacity: usize,
}

impl BroadcastHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_subscriber: AtomicU64::new(1),
            sequence_counter: AtomicU64::new(0),
            lagged: AtomicU64::new(0),
            queue_capacity: queue_capacity.max(MIN_QUEUE_CAPACITY),
        }
    }

    /// Register a subscriber, queueing its bootstrap first
    ///
    /// The queue receives `history` then `aliases` before the subscriber
    /// becomes visible to publishers, so no live message can overtake the
    /// bootstrap.
    pub fn subscribe(&self, history: Vec<LogEvent>, aliases: AliasMap) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.queue_capacity);
        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);

        let mut subscribers = self.subscribers.lock();
        for event in [HubEvent::History(history), HubEvent::Aliases(aliases)] {
            // Fresh queue with room for both
            let _ = tx.try_send(self.envelope(event));
        }
        subscribers.insert(id, tx);
        let total = subscribers.len();
        drop(subscribers);

        info!(subscriber = id, total, "Subscriber attached");
        Subscription { id, receiver }
    }

    /// Remove a subscriber; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.lock().remove(&id).is_some();
        if removed {
            info!(subscriber = id, "Subscriber detached");
        }
        removed
    }

    pub fn publish_event(&self, event: LogEvent) {
        self.publish(HubEvent::EventNew(event));
    }

    pub fn publish_alias_update(&self, entry: DeviceEntry) {
        self.publish(HubEvent::AliasUpdate(entry));
    }

    pub fn publish_aliases_batch_update(&self, aliases: AliasMap) {
        self.publish(HubEvent::AliasBatchUpdate(aliases));
    }

    pub fn publish_clear(&self) {
        self.publish(HubEvent::EventClear);
    }

    /// Deliver one message to every current subscriber
    pub fn publish(&self, event: HubEvent) {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            // Keep sequence ids gap-free for whoever attaches next
            return;
        }

        let msg = self.envelope(event);
        let mut closed = Vec::new();
        let mut lagging = Vec::new();

        for (id, tx) in subscribers.iter() {
            match tx.try_send(msg.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => lagging.push(*id),
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in lagging {
            subscribers.remove(&id);
            self.lagged.fetch_add(1, Ordering::Relaxed);
            warn!(
                subscriber = id,
                topic = msg.event.topic(),
                sequence_id = msg.sequence_id,
                "Subscriber queue full, disconnecting subscriber"
            );
        }

        for id in closed {
            subscribers.remove(&id);
            debug!(subscriber = id, "Removed closed subscriber");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Subscribers disconnected because their queue was full
    pub fn lagged_subscribers(&self) -> u64 {
        self.lagged.load(Ordering::Relaxed)
    }

    fn envelope(&self, event: HubEvent) -> WsMessage {
        WsMessage {
            event,
            sequence_id: self.sequence_counter.fetch_add(1, Ordering::SeqCst),
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
