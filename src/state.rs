//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. All
//! matchmaking state (connections, presence, the waiting queue, and rooms)
//! lives in one [`LobbyState`] behind a single async mutex. Every lobby and
//! relay handler takes that lock once and holds it for its whole run, so
//! handlers never interleave and pairing stays strictly FIFO.
//!
//! Outbound delivery is a bounded `mpsc` channel per connection. Sends are
//! best-effort `try_send`: a slow client loses messages instead of stalling
//! every other handler behind the lock.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::services::leaderboard::Leaderboard;

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

// =============================================================================
// CONNECTION
// =============================================================================

/// One live WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    pub tx: mpsc::Sender<ServerMessage>,
    /// Name given in the last `enqueue`, used for `matched.opponentName`.
    pub display_name: Option<String>,
    /// Room this connection is currently playing in.
    pub room: Option<Uuid>,
}

impl Connection {
    #[must_use]
    pub fn new(tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { tx, display_name: None, room: None }
    }
}

// =============================================================================
// ROOM
// =============================================================================

/// A pairing of exactly two connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Room {
    pub members: [Uuid; 2],
}

impl Room {
    /// The other member, or `None` if `conn_id` is not in this room.
    #[must_use]
    pub fn peer_of(&self, conn_id: Uuid) -> Option<Uuid> {
        match self.members {
            [a, b] if a == conn_id => Some(b),
            [a, b] if b == conn_id => Some(a),
            _ => None,
        }
    }
}

// =============================================================================
// LOBBY STATE
// =============================================================================

#[derive(Debug, Default)]
pub struct LobbyState {
    pub connections: HashMap<Uuid, Connection>,
    /// Identified display names keyed by connection.
    pub presence: HashMap<Uuid, String>,
    /// Waiting connections in enqueue order.
    pub waiting: VecDeque<Uuid>,
    pub rooms: HashMap<Uuid, Room>,
}

impl LobbyState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Best-effort send to one connection. Returns `false` if the connection
    /// is gone or its buffer is full.
    pub fn send_to(&self, conn_id: Uuid, message: ServerMessage) -> bool {
        let Some(conn) = self.connections.get(&conn_id) else {
            return false;
        };
        match conn.tx.try_send(message) {
            Ok(()) => true,
            Err(e) => {
                debug!(%conn_id, error = %e, "lobby: outbound message dropped");
                false
            }
        }
    }

    /// Send the same message to every connection.
    pub fn broadcast_all(&self, message: &ServerMessage) {
        for conn_id in self.connections.keys() {
            self.send_to(*conn_id, message.clone());
        }
    }

    /// Sorted presence list.
    #[must_use]
    pub fn presence_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.presence.values().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn is_waiting(&self, conn_id: Uuid) -> bool {
        self.waiting.contains(&conn_id)
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub lobby: Arc<Mutex<LobbyState>>,
    pub leaderboard: Leaderboard,
    /// Buffer size for each connection's outbound channel.
    pub outbound_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(leaderboard: Leaderboard, outbound_capacity: usize) -> Self {
        Self { lobby: Arc::new(Mutex::new(LobbyState::new())), leaderboard, outbound_capacity: outbound_capacity.max(1) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
