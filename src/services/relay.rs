//! Relay service — forward room traffic to the other member.
//!
//! DESIGN
//! ======
//! The server never inspects a board snapshot or a chat line; it checks only
//! that the room exists and that the sender belongs to it, then hands the
//! message to the peer's outbound channel with its payload untouched. A `lost` message is forwarded and
//! then concludes the match: the room is destroyed quietly and both players
//! may enqueue again.
//!
//! ERROR HANDLING
//! ==============
//! A relay naming a room that no longer exists (the peer left a moment ago)
//! is a normal race, not an error. It is dropped and logged at debug level.

use tracing::{debug, info};
use uuid::Uuid;

use crate::protocol::{RelayMessage, ServerMessage};
use crate::services::lobby;
use crate::state::AppState;

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;

/// Outcome of a relay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Handed to the peer's outbound channel.
    Forwarded,
    /// The peer's outbound buffer was full or closed.
    PeerUnavailable,
    /// The room does not exist or the sender is not a member.
    Dropped,
}

/// Forward `message` from `sender_id` to the other member of `room_id`.
pub async fn relay(state: &AppState, room_id: Uuid, sender_id: Uuid, message: RelayMessage) -> RelayOutcome {
    let mut lobby = state.lobby.lock().await;

    let Some(room) = lobby.rooms.get(&room_id).copied() else {
        debug!(%room_id, %sender_id, kind = message.kind(), "relay: room gone, dropped");
        return RelayOutcome::Dropped;
    };
    let Some(peer_id) = room.peer_of(sender_id) else {
        debug!(%room_id, %sender_id, kind = message.kind(), "relay: sender not in room, dropped");
        return RelayOutcome::Dropped;
    };

    let concludes = message.is_lost();
    let score = message.score();
    let delivered = lobby.send_to(peer_id, ServerMessage::Relay { from_id: sender_id, message });

    if concludes {
        info!(%room_id, loser = %sender_id, ?score, "relay: match over");
        lobby::conclude_room(&mut lobby, room_id);
    }

    if delivered { RelayOutcome::Forwarded } else { RelayOutcome::PeerUnavailable }
}
