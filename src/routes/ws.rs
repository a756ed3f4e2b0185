//! WebSocket handler — matchmaking and relay transport.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID, registers an outbound channel with
//! the lobby, and enters a `select!` loop:
//! - Incoming client text → parse + dispatch to the lobby or relay service
//! - Messages queued by services for this connection → forward to client
//!
//! Services never write to the socket. They push onto the connection's
//! channel, and this loop is the only writer.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register connection
//! 2. Client sends messages → dispatch → services queue replies
//! 3. Close or error → `lobby::disconnect` (queue, presence, room cleanup)

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::services::{lobby, relay};
use crate::state::AppState;

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let (conn_tx, mut conn_rx) = mpsc::channel::<ServerMessage>(state.outbound_capacity);

    lobby::connect(&state, conn_id, conn_tx).await;
    info!(%conn_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        if let Some(reply) = process_inbound_text(&state, conn_id, &text).await {
                            if send_message(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(outbound) = conn_rx.recv() => {
                if send_message(&mut socket, &outbound).await.is_err() {
                    break;
                }
            }
        }
    }

    lobby::disconnect(&state, conn_id).await;
    info!(%conn_id, "ws: client disconnected");
}

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "ws: failed to encode outbound message");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse and process one inbound text message. Returns a direct reply for
/// the sender, if any; everything else is delivered through the lobby
/// channels.
///
/// This keeps the WebSocket transport separate from message handling, so
/// tests can drive dispatch without a socket.
async fn process_inbound_text(state: &AppState, conn_id: Uuid, text: &str) -> Option<ServerMessage> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(%conn_id, error = %e, "ws: invalid inbound message");
            return Some(ServerMessage::bad_message(e));
        }
    };

    match message {
        ClientMessage::Identify { display_name } => {
            lobby::identify(state, conn_id, &display_name).await;
            None
        }
        ClientMessage::Enqueue { display_name } => match lobby::enqueue(state, conn_id, &display_name).await {
            Ok(()) => None,
            Err(e) => {
                info!(%conn_id, error = %e, "ws: enqueue rejected");
                Some(ServerMessage::error_from(&e))
            }
        },
        ClientMessage::Dequeue => {
            lobby::dequeue(state, conn_id).await;
            None
        }
        ClientMessage::Relay { room_id, message } => {
            let outcome = relay::relay(state, room_id, conn_id, message).await;
            debug!(%conn_id, %room_id, ?outcome, "ws: relay");
            None
        }
    }
}
