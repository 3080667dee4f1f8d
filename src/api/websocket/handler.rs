//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::broadcast::{ClientMessage, LaggedNotice, PongMessage};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
///
/// The subscription's queue already holds `history` and `aliases`, so they
/// go out before any live message.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (mut subscription, guard) = state.subscribe();
    let shutdown = state.shutdown_token();
    debug!(subscriber = guard.id(), "WebSocket connected");

    loop {
        tokio::select! {
            // Server shutting down
            _ = shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }

            // Hub messages to client
            msg = subscription.receiver.recv() => {
                let Some(msg) = msg else {
                    // Hub evicted us for lagging; the client should reconnect
                    if let Ok(json) = serde_json::to_string(&LaggedNotice::default()) {
                        let _ = socket.send(Message::Text(json)).await;
                    }
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(json)).await.is_err() {
                        break; // Client disconnected
                    }
                }
            }

            // Client messages
            result = socket.recv() => {
                match result {
                    Some(Ok(msg)) => {
                        if !handle_client_message(msg, &mut socket).await {
                            break;
                        }
                    }
                    Some(Err(_)) => break,
                    None => break,
                }
            }
        }
    }

    debug!(subscriber = guard.id(), "WebSocket closed");
}

/// Handle a message from the client
/// Returns false if the connection should be closed
async fn handle_client_message(msg: Message, socket: &mut WebSocket) -> bool {
    match msg {
        Message::Text(text) => {
            if let Ok(ClientMessage::Ping) = serde_json::from_str::<ClientMessage>(&text) {
                if let Ok(json) = serde_json::to_string(&PongMessage::default()) {
                    let _ = socket.send(Message::Text(json)).await;
                }
            }
            true
        }
        Message::Binary(_) => true,
        Message::Ping(data) => {
            let _ = socket.send(Message::Pong(data)).await;
            true
        }
        Message::Pong(_) => true,
        Message::Close(_) => false,
    }
}
