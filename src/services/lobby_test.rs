use super::*;
use crate::state::test_helpers::{assert_silent, connect, drain, recv, test_app_state};

fn matched_room(msg: &ServerMessage) -> (Uuid, String) {
    match msg {
        ServerMessage::Matched { room_id, opponent_name } => (*room_id, opponent_name.clone()),
        other => panic!("expected matched, got {other:?}"),
    }
}

// =============================================================================
// enqueue / matching
// =============================================================================

#[tokio::test]
async fn first_waiter_is_queued_second_is_matched() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;

    enqueue(&state, a, "A").await.expect("enqueue a");
    assert_eq!(recv(&mut a_rx).await, ServerMessage::Queued);

    enqueue(&state, b, "B").await.expect("enqueue b");
    let (room_a, opponent_of_a) = matched_room(&recv(&mut a_rx).await);
    let (room_b, opponent_of_b) = matched_room(&recv(&mut b_rx).await);

    assert_eq!(room_a, room_b);
    assert_eq!(opponent_of_a, "B");
    assert_eq!(opponent_of_b, "A");
    assert_silent(&mut b_rx).await;

    let lobby = state.lobby.lock().await;
    assert!(lobby.waiting.is_empty());
    assert_eq!(lobby.rooms.get(&room_a).map(|r| r.members), Some([a, b]));
    assert_eq!(lobby.connections.get(&a).and_then(|c| c.room), Some(room_a));
    assert_eq!(lobby.connections.get(&b).and_then(|c| c.room), Some(room_a));
}

#[tokio::test]
async fn pairing_is_fifo() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;
    let (c, _c_rx) = connect(&state).await;
    let (d, mut d_rx) = connect(&state).await;

    enqueue(&state, a, "A").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");
    enqueue(&state, c, "C").await.expect("enqueue");
    drain(&mut a_rx);
    drain(&mut b_rx);

    enqueue(&state, d, "D").await.expect("enqueue");
    let (_, opponent) = matched_room(&recv(&mut d_rx).await);
    assert_eq!(opponent, "C");
}

#[tokio::test]
async fn blank_name_becomes_anon() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;

    enqueue(&state, a, "   ").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");
    drain(&mut a_rx);

    let (_, opponent) = matched_room(&recv(&mut b_rx).await);
    assert_eq!(opponent, ANONYMOUS_NAME);
}

#[tokio::test]
async fn blank_name_keeps_identified_name() {
    let state = test_app_state();
    let (a, _a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;

    identify(&state, a, "ada").await;
    enqueue(&state, a, "").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");
    drain(&mut b_rx);

    let lobby = state.lobby.lock().await;
    assert_eq!(lobby.connections.get(&a).and_then(|c| c.display_name.clone()).as_deref(), Some("ada"));
}

#[tokio::test]
async fn enqueue_twice_keeps_single_entry() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;

    enqueue(&state, a, "A").await.expect("enqueue");
    enqueue(&state, a, "A").await.expect("enqueue again");

    assert_eq!(recv(&mut a_rx).await, ServerMessage::Queued);
    assert_eq!(recv(&mut a_rx).await, ServerMessage::Queued);
    assert_eq!(state.lobby.lock().await.waiting.len(), 1);
}

#[tokio::test]
async fn enqueue_while_matched_is_rejected() {
    let state = test_app_state();
    let (a, _a_rx) = connect(&state).await;
    let (b, _b_rx) = connect(&state).await;
    enqueue(&state, a, "A").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");

    let err = enqueue(&state, a, "A").await.expect_err("in match");
    assert!(matches!(err, LobbyError::AlreadyInMatch(_)));
    assert_eq!(err.error_code(), "E_IN_MATCH");
    assert!(state.lobby.lock().await.waiting.is_empty());
}

#[tokio::test]
async fn enqueue_from_unknown_connection_fails() {
    let state = test_app_state();
    let err = enqueue(&state, Uuid::new_v4(), "ghost").await.expect_err("unknown");
    assert_eq!(err.error_code(), "E_NOT_CONNECTED");
}

// =============================================================================
// dequeue
// =============================================================================

#[tokio::test]
async fn dequeue_removes_waiter() {
    let state = test_app_state();
    let (a, _a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;

    enqueue(&state, a, "A").await.expect("enqueue");
    dequeue(&state, a).await;
    enqueue(&state, b, "B").await.expect("enqueue");

    assert_eq!(recv(&mut b_rx).await, ServerMessage::Queued);
}

#[tokio::test]
async fn dequeue_is_idempotent_and_safe_after_match() {
    let state = test_app_state();
    let (a, _a_rx) = connect(&state).await;
    let (b, _b_rx) = connect(&state).await;

    dequeue(&state, a).await;
    dequeue(&state, a).await;

    enqueue(&state, a, "A").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");
    dequeue(&state, a).await;

    let lobby = state.lobby.lock().await;
    assert_eq!(lobby.rooms.len(), 1, "dequeue after match leaves the room alone");
    assert!(lobby.connections.get(&a).and_then(|c| c.room).is_some());
}

// =============================================================================
// presence
// =============================================================================

#[tokio::test]
async fn identify_broadcasts_sorted_presence_to_everyone() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;

    identify(&state, b, "zed").await;
    drain(&mut a_rx);
    drain(&mut b_rx);

    identify(&state, a, " amy ").await;
    let expected = ServerMessage::Presence { names: vec!["amy".into(), "zed".into()] };
    assert_eq!(recv(&mut a_rx).await, expected);
    assert_eq!(recv(&mut b_rx).await, expected);
}

#[tokio::test]
async fn identify_again_replaces_name() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;

    identify(&state, a, "old").await;
    identify(&state, a, "new").await;
    drain(&mut a_rx);

    assert_eq!(state.lobby.lock().await.presence_names(), vec!["new"]);
}

#[tokio::test]
async fn identify_with_blank_name_shows_anon() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;

    identify(&state, a, "   ").await;

    assert_eq!(recv(&mut a_rx).await, ServerMessage::Presence { names: vec![ANONYMOUS_NAME.into()] });
    let lobby = state.lobby.lock().await;
    assert_eq!(lobby.connections.get(&a).and_then(|c| c.display_name.clone()).as_deref(), Some(ANONYMOUS_NAME));
}

// =============================================================================
// disconnect
// =============================================================================

#[tokio::test]
async fn disconnect_notifies_peer_and_destroys_room() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, _b_rx) = connect(&state).await;
    enqueue(&state, a, "A").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");
    drain(&mut a_rx);

    disconnect(&state, b).await;

    assert_eq!(recv(&mut a_rx).await, ServerMessage::PeerDisconnected);
    let lobby = state.lobby.lock().await;
    assert!(lobby.rooms.is_empty());
    assert_eq!(lobby.connections.get(&a).and_then(|c| c.room), None);
    assert!(!lobby.connections.contains_key(&b));
}

#[tokio::test]
async fn survivor_can_requeue_after_peer_disconnects() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, _b_rx) = connect(&state).await;
    enqueue(&state, a, "A").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");
    disconnect(&state, b).await;
    drain(&mut a_rx);

    enqueue(&state, a, "A").await.expect("requeue");
    assert_eq!(recv(&mut a_rx).await, ServerMessage::Queued);
}

#[tokio::test]
async fn disconnect_while_waiting_leaves_queue() {
    let state = test_app_state();
    let (a, _a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;

    enqueue(&state, a, "A").await.expect("enqueue");
    disconnect(&state, a).await;
    enqueue(&state, b, "B").await.expect("enqueue");

    assert_eq!(recv(&mut b_rx).await, ServerMessage::Queued);
}

#[tokio::test]
async fn disconnect_of_identified_player_updates_presence() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, _b_rx) = connect(&state).await;
    identify(&state, a, "amy").await;
    identify(&state, b, "bob").await;
    drain(&mut a_rx);

    disconnect(&state, b).await;

    assert_eq!(recv(&mut a_rx).await, ServerMessage::Presence { names: vec!["amy".into()] });
}

#[tokio::test]
async fn disconnect_of_unidentified_idle_player_is_silent() {
    let state = test_app_state();
    let (_a, mut a_rx) = connect(&state).await;
    let (b, _b_rx) = connect(&state).await;

    disconnect(&state, b).await;
    disconnect(&state, b).await;

    assert_silent(&mut a_rx).await;
}

#[tokio::test]
async fn conclude_room_frees_both_members_quietly() {
    let state = test_app_state();
    let (a, mut a_rx) = connect(&state).await;
    let (b, mut b_rx) = connect(&state).await;
    enqueue(&state, a, "A").await.expect("enqueue");
    enqueue(&state, b, "B").await.expect("enqueue");
    let (room_id, _) = matched_room(&recv(&mut b_rx).await);
    drain(&mut a_rx);

    let mut lobby = state.lobby.lock().await;
    assert!(conclude_room(&mut lobby, room_id).is_some());
    assert!(conclude_room(&mut lobby, room_id).is_none());
    assert!(lobby.connections.values().all(|c| c.room.is_none()));
    drop(lobby);

    assert_silent(&mut a_rx).await;
    assert_silent(&mut b_rx).await;
}
