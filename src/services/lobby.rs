//! Lobby service — presence, the waiting queue, and room creation.
//!
//! DESIGN
//! ======
//! Each function takes the lobby lock once and releases it on return, so a
//! handler's reads and writes are one atomic step. Pairing is FIFO: the
//! oldest waiter is matched with whoever enqueues next. Rooms hold exactly
//! two members and exist until one member disconnects or reports a loss.
//!
//! LIFECYCLE
//! =========
//! `connect -> identify? -> enqueue -> (queued -> matched) | matched`
//! `-> relay* -> lost | disconnect`

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{ErrorCode, ServerMessage};
use crate::state::{AppState, Connection, LobbyState, Room};

#[cfg(test)]
#[path = "lobby_test.rs"]
mod tests;

/// Name used when a player enqueues without one.
pub const ANONYMOUS_NAME: &str = "Anon";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("connection not registered: {0}")]
    UnknownConnection(Uuid),
    #[error("already in match {0}")]
    AlreadyInMatch(Uuid),
}

impl ErrorCode for LobbyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownConnection(_) => "E_NOT_CONNECTED",
            Self::AlreadyInMatch(_) => "E_IN_MATCH",
        }
    }
}

// =============================================================================
// CONNECTIONS
// =============================================================================

/// Register a new connection and its outbound channel.
pub async fn connect(state: &AppState, conn_id: Uuid, tx: mpsc::Sender<ServerMessage>) {
    let mut lobby = state.lobby.lock().await;
    lobby.connections.insert(conn_id, Connection::new(tx));
}

/// Remove every trace of a connection. If it was in a room, the room is
/// destroyed and the other member is told `peer-disconnected`.
pub async fn disconnect(state: &AppState, conn_id: Uuid) {
    let mut lobby = state.lobby.lock().await;

    lobby.waiting.retain(|id| *id != conn_id);
    let room_id = lobby.connections.remove(&conn_id).and_then(|conn| conn.room);

    if lobby.presence.remove(&conn_id).is_some() {
        let names = lobby.presence_names();
        lobby.broadcast_all(&ServerMessage::Presence { names });
    }

    let Some(room_id) = room_id else {
        return;
    };
    let Some(room) = lobby.rooms.remove(&room_id) else {
        return;
    };
    if let Some(peer_id) = room.peer_of(conn_id) {
        if let Some(peer) = lobby.connections.get_mut(&peer_id) {
            peer.room = None;
        }
        lobby.send_to(peer_id, ServerMessage::PeerDisconnected);
    }
    info!(%room_id, %conn_id, "lobby: room closed by disconnect");
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Record a display name and push the updated list to everyone. A blank
/// name is recorded as `Anon`.
pub async fn identify(state: &AppState, conn_id: Uuid, display_name: &str) {
    let mut lobby = state.lobby.lock().await;
    if !lobby.connections.contains_key(&conn_id) {
        warn!(%conn_id, "lobby: identify from unknown connection");
        return;
    }
    let trimmed = display_name.trim();
    let name = if trimmed.is_empty() { ANONYMOUS_NAME } else { trimmed }.to_owned();
    lobby.presence.insert(conn_id, name.clone());
    if let Some(conn) = lobby.connections.get_mut(&conn_id) {
        conn.display_name = Some(name);
    }
    let names = lobby.presence_names();
    lobby.broadcast_all(&ServerMessage::Presence { names });
}

// =============================================================================
// QUEUE
// =============================================================================

/// Join the waiting queue, or pair with the oldest waiter.
///
/// A blank name keeps the name from `identify`, or `Anon` if there is none.
/// A connection that is already waiting is told `queued` again and keeps its
/// place.
///
/// # Errors
///
/// Returns `UnknownConnection` if `conn_id` was never registered and
/// `AlreadyInMatch` if it is currently in a room.
pub async fn enqueue(state: &AppState, conn_id: Uuid, display_name: &str) -> Result<(), LobbyError> {
    let mut lobby = state.lobby.lock().await;

    let Some(conn) = lobby.connections.get_mut(&conn_id) else {
        return Err(LobbyError::UnknownConnection(conn_id));
    };
    if let Some(room_id) = conn.room {
        return Err(LobbyError::AlreadyInMatch(room_id));
    }
    let trimmed = display_name.trim();
    if !trimmed.is_empty() {
        conn.display_name = Some(trimmed.to_owned());
    } else if conn.display_name.is_none() {
        conn.display_name = Some(ANONYMOUS_NAME.to_owned());
    }

    if lobby.is_waiting(conn_id) {
        lobby.send_to(conn_id, ServerMessage::Queued);
        return Ok(());
    }

    let Some(waiter_id) = lobby.waiting.pop_front() else {
        lobby.waiting.push_back(conn_id);
        lobby.send_to(conn_id, ServerMessage::Queued);
        info!(%conn_id, "lobby: queued");
        return Ok(());
    };

    create_room(&mut lobby, waiter_id, conn_id);
    Ok(())
}

/// Leave the waiting queue. A no-op if not waiting, including after a match
/// has already formed.
pub async fn dequeue(state: &AppState, conn_id: Uuid) {
    let mut lobby = state.lobby.lock().await;
    let before = lobby.waiting.len();
    lobby.waiting.retain(|id| *id != conn_id);
    if lobby.waiting.len() != before {
        info!(%conn_id, "lobby: dequeued");
    }
}

// =============================================================================
// ROOMS
// =============================================================================

fn display_name_of(lobby: &LobbyState, conn_id: Uuid) -> String {
    lobby
        .connections
        .get(&conn_id)
        .and_then(|conn| conn.display_name.clone())
        .unwrap_or_else(|| ANONYMOUS_NAME.to_owned())
}

/// Pair `first` (the waiter) with `second` and tell both.
fn create_room(lobby: &mut LobbyState, first: Uuid, second: Uuid) -> Uuid {
    let room_id = Uuid::new_v4();
    lobby.rooms.insert(room_id, Room { members: [first, second] });

    for member in [first, second] {
        if let Some(conn) = lobby.connections.get_mut(&member) {
            conn.room = Some(room_id);
        }
    }

    let first_name = display_name_of(lobby, first);
    let second_name = display_name_of(lobby, second);
    lobby.send_to(first, ServerMessage::Matched { room_id, opponent_name: second_name });
    lobby.send_to(second, ServerMessage::Matched { room_id, opponent_name: first_name });

    info!(%room_id, %first, %second, "lobby: matched");
    room_id
}

/// Destroy a room and free both members to enqueue again. Nobody is
/// notified.
pub(crate) fn conclude_room(lobby: &mut LobbyState, room_id: Uuid) -> Option<Room> {
    let room = lobby.rooms.remove(&room_id)?;
    for member in room.members {
        if let Some(conn) = lobby.connections.get_mut(&member) {
            if conn.room == Some(room_id) {
                conn.room = None;
            }
        }
    }
    info!(%room_id, "lobby: room concluded");
    Some(room)
}
