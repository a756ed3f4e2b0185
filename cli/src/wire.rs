//! Lobby wire format as seen from a player.
//!
//! Outbound messages are built as JSON values tagged by `event`; inbound
//! messages decode into [`ServerEvent`]. Relay payloads stay untyped here:
//! the only ones the headless player reads are the opponent's `lost` notice
//! and the score inside `state` snapshots.

use engine::snapshot::BoardSnapshot;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::CliError;

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;

/// Relay type sent while a board is live.
pub const STATE: &str = "state";
/// Relay type sent once when a board tops out.
pub const LOST: &str = "lost";

// =============================================================================
// INBOUND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Queued,
    Matched {
        room_id: Uuid,
        opponent_name: String,
    },
    Presence {
        names: Vec<String>,
    },
    PeerDisconnected,
    Relay {
        from_id: Uuid,
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        payload: Value,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ServerEvent {
    /// True for a relayed `lost` notice from the opponent.
    #[must_use]
    pub fn is_opponent_loss(&self) -> bool {
        matches!(self, ServerEvent::Relay { kind, .. } if kind == LOST)
    }

    /// Score carried by a relayed `state` snapshot.
    #[must_use]
    pub fn opponent_score(&self) -> Option<u64> {
        match self {
            ServerEvent::Relay { kind, payload, .. } if kind == STATE => payload.get("score").and_then(Value::as_u64),
            _ => None,
        }
    }
}

/// Decode one text frame.
///
/// # Errors
///
/// Returns [`CliError::InvalidJson`] for malformed JSON or an unknown event.
pub fn decode(text: &str) -> Result<ServerEvent, CliError> {
    Ok(serde_json::from_str(text)?)
}

// =============================================================================
// OUTBOUND
// =============================================================================

#[must_use]
pub fn identify(display_name: &str) -> Value {
    json!({ "event": "identify", "displayName": display_name })
}

#[must_use]
pub fn enqueue(display_name: &str) -> Value {
    json!({ "event": "enqueue", "displayName": display_name })
}

#[must_use]
pub fn relay_state(room_id: Uuid, snapshot: &BoardSnapshot) -> Value {
    json!({ "event": "relay", "roomId": room_id, "type": STATE, "payload": snapshot })
}

#[must_use]
pub fn relay_lost(room_id: Uuid, score: u64) -> Value {
    json!({ "event": "relay", "roomId": room_id, "type": LOST, "payload": { "score": score } })
}

// =============================================================================
// URLS
// =============================================================================

/// Lobby socket URL for an HTTP base URL.
///
/// # Errors
///
/// Returns [`CliError::InvalidBaseUrl`] unless the scheme is `http` or `https`.
pub fn ws_url(base_url: &str) -> Result<String, CliError> {
    let base_url = base_url.trim_end_matches('/');
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/api/ws"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/api/ws"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}
