//! Shared transport state

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::broadcast::{SubscriberId, Subscription};
use crate::service::IngestionService;

/// State handed to every handler
#[derive(Debug)]
pub struct AppState {
    pub service: Arc<IngestionService>,
    pub started_at: Instant,
    /// Cancelled when the server begins shutting down; ends live streams
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(service: Arc<IngestionService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Attach a subscriber that detaches itself when the guard is dropped
    pub fn subscribe(&self) -> (Subscription, SubscriberGuard) {
        let subscription = self.service.subscribe();
        let guard = SubscriberGuard {
            service: self.service.clone(),
            id: subscription.id,
        };
        (subscription, guard)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

/// Unsubscribes on drop
#[derive(Debug)]
pub struct SubscriberGuard {
    service: Arc<IngestionService>,
    id: SubscriberId,
}

impl SubscriberGuard {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.service.unsubscribe(self.id);
    }
}
