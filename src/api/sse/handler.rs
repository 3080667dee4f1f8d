//! SSE stream handler

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use tracing::debug;

use crate::api::state::AppState;
use crate::broadcast::{LaggedNotice, WsMessage};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// GET /api/stream - hub messages as server-sent events
///
/// The stream ends when the server shuts down, or after an `error` event
/// when the hub disconnected this subscriber for lagging.
pub async fn sse_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (mut subscription, guard) = state.subscribe();
    let shutdown = state.shutdown_token();
    debug!(subscriber = guard.id(), "SSE stream opened");

    let stream = async_stream::stream! {
        // Dropped with the stream when the client goes away
        let guard = guard;

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => None,
                msg = subscription.receiver.recv() => Some(msg),
            };

            match next {
                Some(Some(msg)) => {
                    if let Some(event) = to_sse_event(&msg) {
                        yield Ok::<_, Infallible>(event);
                    }
                }
                Some(None) => {
                    if let Some(event) = lagged_event() {
                        yield Ok(event);
                    }
                    break;
                }
                None => break,
            }
        }
        debug!(subscriber = guard.id(), "SSE stream closed");
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

fn lagged_event() -> Option<Event> {
    let json = serde_json::to_string(&LaggedNotice::default()).ok()?;
    Some(Event::default().event("error").data(json))
}

fn to_sse_event(msg: &WsMessage) -> Option<Event> {
    let json = serde_json::to_string(msg).ok()?;
    Some(
        Event::default()
            .event(msg.event.topic())
            .id(msg.sequence_id.to_string())
            .data(json),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::HubEvent;

    #[test]
    fn test_to_sse_event() {
        let msg = WsMessage {
            event: HubEvent::EventClear,
            sequence_id: 3,
        };
        assert!(to_sse_event(&msg).is_some());
    }

    #[test]
    fn test_lagged_event() {
        assert!(lagged_event().is_some());
    }
}
