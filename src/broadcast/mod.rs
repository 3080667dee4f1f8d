//! Real-time fan-out to websocket and SSE subscribers
//!
//! ## Topics
//! - `history`, `aliases`: bootstrap, sent once on attach
//! - `event:new`, `event:clear`: buffer changes
//! - `alias:update`, `alias:batch-update`: alias changes
//!
//! A subscriber that falls a full queue behind is disconnected; the
//! transport sends it a [`LaggedNotice`] and the client reconnects.

pub mod events;
pub mod hub;

pub use events::{ClientMessage, HubEvent, LaggedNotice, PongMessage, WsMessage};
pub use hub::{BroadcastHub, SubscriberId, Subscription, DEFAULT_QUEUE_CAPACITY};
