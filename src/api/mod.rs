//! HTTP, websocket and SSE transport over the ingestion service
//!
//! - `rest`: ingestion, query, clear/save/status and alias endpoints
//! - `websocket`: `/ws`, bootstrap then live hub messages
//! - `sse`: `/api/stream`, the same messages as server-sent events

pub mod http;
pub mod rest;
pub mod sse;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use state::{AppState, SubscriberGuard};
