//! SSE (Server-Sent Events) endpoint at `/api/stream`
//!
//! Carries the same messages as the websocket, for clients that cannot
//! upgrade. Each SSE event is named after the hub topic and carries the
//! full JSON envelope as data and the sequence id as its id.

pub mod handler;

pub use handler::sse_handler;
