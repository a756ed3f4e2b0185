//! Score submission and leaderboard routes.
//!
//! `POST /api/score` takes `{username, score}`; `GET /api/leaderboard` takes
//! an optional `limit` query parameter. Errors are JSON `{error, code, retryable}`.

use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::protocol::ErrorCode;
use crate::services::leaderboard::{self, LeaderboardError};
use crate::state::AppState;

#[cfg(test)]
#[path = "scores_test.rs"]
mod tests;

/// Request body for `POST /api/score`. Fields are loosely typed so that type
/// errors become validation errors instead of extractor rejections.
#[derive(Debug, Deserialize)]
pub struct ScoreSubmission {
    #[serde(default)]
    pub username: Value,
    #[serde(default)]
    pub score: Value,
}

fn error_response(err: &LeaderboardError) -> Response {
    let status = match err {
        LeaderboardError::Validation(_) => StatusCode::BAD_REQUEST,
        LeaderboardError::Database(e) => {
            error!(error = %e, "leaderboard: database failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let body = serde_json::json!({
        "error": err.to_string(),
        "code": err.error_code(),
        "retryable": err.retryable(),
    });
    (status, Json(body)).into_response()
}

/// Pull `(username, score)` out of a loosely typed body.
///
/// # Errors
///
/// Returns `Validation` unless `username` is a string and `score` is an
/// integer.
pub fn parse_submission(body: &ScoreSubmission) -> Result<(String, i64), LeaderboardError> {
    let Some(username) = body.username.as_str() else {
        return Err(LeaderboardError::Validation("username must be a non-empty string".into()));
    };
    let Some(score) = body.score.as_i64() else {
        return Err(LeaderboardError::Validation("score must be a non-negative integer".into()));
    };
    Ok((username.to_owned(), score))
}

/// `POST /api/score`: record a final score.
pub async fn submit_score(
    State(state): State<AppState>,
    body: Result<Json<ScoreSubmission>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = LeaderboardError::Validation(format!("invalid body: {}", rejection.body_text()));
            return error_response(&err);
        }
    };

    let result = match parse_submission(&body) {
        Ok((username, score)) => state.leaderboard.submit(&username, score).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(entry) => {
            info!(username = %entry.username, score = entry.score, "leaderboard: score recorded");
            (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /api/leaderboard?limit=N`: top scores, highest first.
pub async fn leaderboard(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> Response {
    let requested = params.get("limit").and_then(|v| v.trim().parse::<i64>().ok());
    let limit = leaderboard::clamp_limit(requested);

    match state.leaderboard.top(limit).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => error_response(&e),
    }
}
