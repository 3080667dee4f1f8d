//! WebSocket endpoint at `/ws`
//!
//! On connect the client receives `history` then `aliases`, followed by
//! every live hub message in publish order. A client may send
//! `{"type":"ping"}` and gets `{"type":"pong"}` back.

pub mod handler;

pub use handler::ws_handler;
