//! Wire protocol for the matchmaking and relay WebSocket.
//!
//! ARCHITECTURE
//! ============
//! Every WebSocket text message is one JSON object tagged by `event`. Clients
//! send [`ClientMessage`]s, the server answers with [`ServerMessage`]s. Field
//! names are camelCase on the wire (`displayName`, `roomId`, `fromId`).
//!
//! DESIGN
//! ======
//! Relay traffic is a [`RelayMessage`] tagged by its `type`: `state`, `lost`
//! and `chat` have their own arms, anything else rides through
//! [`RelayMessage::Other`]. Payloads are never rebuilt. The peer receives the
//! sender's JSON value unchanged, whatever keys it carries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error replies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Code sent when an inbound message cannot be decoded.
pub const E_BAD_MESSAGE: &str = "E_BAD_MESSAGE";

// =============================================================================
// RELAY PAYLOADS
// =============================================================================

/// Application message forwarded between the two members of a room.
///
/// Every arm keeps the payload exactly as the sender wrote it. Only the
/// `type` tag is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRelay", into = "RawRelay")]
pub enum RelayMessage {
    /// Periodic board snapshot.
    State(Value),
    /// The sender's board topped out.
    Lost(Value),
    /// Free text.
    Chat(Value),
    /// Unrecognized type.
    Other { kind: String, payload: Value },
}

impl RelayMessage {
    /// Wire value of the `type` field.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::State(_) => "state",
            Self::Lost(_) => "lost",
            Self::Chat(_) => "chat",
            Self::Other { kind, .. } => kind,
        }
    }

    #[must_use]
    pub fn payload(&self) -> &Value {
        match self {
            Self::State(payload) | Self::Lost(payload) | Self::Chat(payload) | Self::Other { payload, .. } => payload,
        }
    }

    #[must_use]
    pub fn is_lost(&self) -> bool {
        matches!(self, Self::Lost(_))
    }

    /// Score reported in the payload, if the sender included one.
    #[must_use]
    pub fn score(&self) -> Option<u64> {
        self.payload().get("score").and_then(Value::as_u64)
    }
}

/// Untyped `{type, payload}` pair as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRelay {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl From<RawRelay> for RelayMessage {
    fn from(raw: RawRelay) -> Self {
        match raw.kind.as_str() {
            "state" => Self::State(raw.payload),
            "lost" => Self::Lost(raw.payload),
            "chat" => Self::Chat(raw.payload),
            _ => Self::Other { kind: raw.kind, payload: raw.payload },
        }
    }
}

impl From<RelayMessage> for RawRelay {
    fn from(message: RelayMessage) -> Self {
        let kind = message.kind().to_owned();
        let payload = match message {
            RelayMessage::State(payload)
            | RelayMessage::Lost(payload)
            | RelayMessage::Chat(payload)
            | RelayMessage::Other { payload, .. } => payload,
        };
        Self { kind, payload }
    }
}

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Announce a display name to the lobby.
    Identify { display_name: String },
    /// Join the waiting queue. An empty name becomes `Anon`.
    Enqueue {
        #[serde(default)]
        display_name: String,
    },
    /// Leave the waiting queue.
    Dequeue,
    /// Forward a message to the other member of `room_id`.
    Relay {
        room_id: Uuid,
        #[serde(flatten)]
        message: RelayMessage,
    },
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// The sender is waiting for an opponent.
    Queued,
    /// A room was created for the sender and `opponent_name`.
    Matched { room_id: Uuid, opponent_name: String },
    /// Every identified display name, sorted.
    Presence { names: Vec<String> },
    /// The other member of the room disconnected. The room is gone.
    PeerDisconnected,
    /// A message from the other member of the room.
    Relay {
        from_id: Uuid,
        #[serde(flatten)]
        message: RelayMessage,
    },
    /// The last inbound message was rejected.
    Error { code: String, message: String },
}

impl ServerMessage {
    /// Structured error reply from a typed error.
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::Error { code: err.error_code().to_owned(), message: err.to_string() }
    }

    /// Reply for text that is not a valid [`ClientMessage`].
    #[must_use]
    pub fn bad_message(detail: impl std::fmt::Display) -> Self {
        Self::Error { code: E_BAD_MESSAGE.to_owned(), message: format!("invalid message: {detail}") }
    }
}
