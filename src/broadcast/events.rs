//! Real-time channel message types

use serde::{Deserialize, Serialize};

use crate::types::{AliasMap, DeviceEntry, LogEvent};

/// Messages pushed to subscribers
///
/// Serialized as `{"type": <topic>, "data": <payload>}`; `event:clear` has
/// no `data`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HubEvent {
    /// Bootstrap: the most recent events, oldest first
    #[serde(rename = "history")]
    History(Vec<LogEvent>),

    /// Bootstrap: the full alias mapping
    #[serde(rename = "aliases")]
    Aliases(AliasMap),

    #[serde(rename = "event:new")]
    EventNew(LogEvent),

    /// The buffer was cleared; discard local state
    #[serde(rename = "event:clear")]
    EventClear,

    /// One alias changed; `alias` is null when it was removed
    #[serde(rename = "alias:update")]
    AliasUpdate(DeviceEntry),

    /// Several aliases changed; carries the full mapping afterwards
    #[serde(rename = "alias:batch-update")]
    AliasBatchUpdate(AliasMap),
}

impl HubEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            HubEvent::History(_) => "history",
            HubEvent::Aliases(_) => "aliases",
            HubEvent::EventNew(_) => "event:new",
            HubEvent::EventClear => "event:clear",
            HubEvent::AliasUpdate(_) => "alias:update",
            HubEvent::AliasBatchUpdate(_) => "alias:batch-update",
        }
    }
}

/// Envelope with a sequence id for gap detection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsMessage {
    #[serde(flatten)]
    pub event: HubEvent,

    /// Monotonically increasing across all messages the hub emits
    pub sequence_id: u64,
}

/// Messages a websocket client may send
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Application-level heartbeat
    Ping,
}

/// Reply to [`ClientMessage::Ping`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PongMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl Default for PongMessage {
    fn default() -> Self {
        Self {
            msg_type: "pong".to_string(),
        }
    }
}

/// Last message to a subscriber the hub disconnected for falling behind
///
/// Reconnecting yields a fresh bootstrap, which resynchronizes the client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaggedNotice {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub code: String,
    pub message: String,
}

impl Default for LaggedNotice {
    fn default() -> Self {
        Self {
            msg_type: "error".to_string(),
            code: "lagged".to_string(),
            message: "Too slow to keep up with live events, please reconnect".to_string(),
        }
    }
}
