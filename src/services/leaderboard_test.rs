use super::*;

// =============================================================================
// validate_submission
// =============================================================================

#[test]
fn negative_score_is_rejected() {
    let err = validate_submission("x", -1).expect_err("negative score");
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert!(!err.retryable());
}

#[test]
fn blank_username_is_rejected() {
    assert!(matches!(validate_submission("", 5), Err(LeaderboardError::Validation(_))));
    assert!(matches!(validate_submission("   ", 5), Err(LeaderboardError::Validation(_))));
}

#[test]
fn valid_submission_is_trimmed() {
    assert_eq!(validate_submission("x", 5).expect("valid"), "x");
    assert_eq!(validate_submission("  ada ", 0).expect("valid"), "ada");
}

// =============================================================================
// clamp_limit
// =============================================================================

#[test]
fn limit_defaults_and_clamps() {
    assert_eq!(clamp_limit(None), 20);
    assert_eq!(clamp_limit(Some(5)), 5);
    assert_eq!(clamp_limit(Some(0)), 1);
    assert_eq!(clamp_limit(Some(-3)), 1);
    assert_eq!(clamp_limit(Some(1000)), 100);
}

// =============================================================================
// Memory backend
// =============================================================================

#[tokio::test]
async fn memory_top_is_sorted_descending() {
    let board = Leaderboard::memory();
    board.submit("low", 10).await.expect("submit");
    board.submit("high", 900).await.expect("submit");
    board.submit("mid", 300).await.expect("submit");

    let top = board.top(20).await.expect("top");
    let names: Vec<&str> = top.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, vec!["high", "mid", "low"]);
}

#[tokio::test]
async fn memory_ties_keep_submission_order() {
    let board = Leaderboard::memory();
    board.submit("first", 100).await.expect("submit");
    board.submit("second", 100).await.expect("submit");
    board.submit("third", 100).await.expect("submit");

    let top = board.top(3).await.expect("top");
    let names: Vec<&str> = top.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn memory_respects_limit() {
    let board = Leaderboard::memory();
    for score in 0..10 {
        board.submit("p", score).await.expect("submit");
    }
    let top = board.top(3).await.expect("top");
    assert_eq!(top.iter().map(|e| e.score).collect::<Vec<_>>(), vec![9, 8, 7]);
}

#[tokio::test]
async fn memory_is_capped_at_capacity() {
    let board = Leaderboard::memory();
    for score in 0..150 {
        board.submit("p", score).await.expect("submit");
    }
    let top = board.top(MAX_LIMIT).await.expect("top");
    assert_eq!(top.len(), MEMORY_CAPACITY);
    assert_eq!(top.first().map(|e| e.score), Some(149));
    assert_eq!(top.last().map(|e| e.score), Some(50));

    let Leaderboard::Memory(entries) = &board else {
        panic!("expected memory backend");
    };
    assert_eq!(entries.lock().expect("lock").len(), MEMORY_CAPACITY);
}

#[tokio::test]
async fn rejected_submission_is_not_stored() {
    let board = Leaderboard::memory();
    assert!(board.submit("cheater", -5).await.is_err());
    assert!(board.submit(" ", 5).await.is_err());
    assert!(board.top(10).await.expect("top").is_empty());
}

#[tokio::test]
async fn submit_stamps_timestamp() {
    let board = Leaderboard::memory();
    let entry = board.submit("ada", 40).await.expect("submit");
    assert_eq!(entry.username, "ada");
    assert_eq!(entry.score, 40);
    assert!(entry.timestamp > 0);
}

#[tokio::test]
async fn connect_without_url_uses_memory() {
    let board = Leaderboard::connect(None, 5).await;
    assert_eq!(board.backend(), "memory");
}

#[test]
fn entry_serializes_timestamp_as_ts() {
    let entry = ScoreEntry { username: "ada".into(), score: 40, timestamp: 1_700_000_000_000 };
    let wire = serde_json::to_value(&entry).expect("serialize");
    assert_eq!(wire, serde_json::json!({"username": "ada", "score": 40, "ts": 1_700_000_000_000_i64}));
}
