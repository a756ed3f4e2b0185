//! Leaderboard service — append a final score, read the top N.
//!
//! DESIGN
//! ======
//! Two backends behind one enum. `Postgres` is used when `DATABASE_URL` is set
//! and reachable at startup; otherwise the server falls back to `Memory`, a
//! bounded list kept sorted by score and trimmed to [`MEMORY_CAPACITY`]
//! entries. The fallback is chosen once at startup and never switches back.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures are the caller's fault and map to HTTP 400. Database
//! failures map to HTTP 500 and are logged by the route layer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::protocol::ErrorCode;

#[cfg(test)]
#[path = "leaderboard_test.rs"]
mod tests;

/// Entries kept by the in-memory backend.
pub const MEMORY_CAPACITY: usize = 100;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for LeaderboardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// One recorded final score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: String,
    pub score: i64,
    /// Milliseconds since Unix epoch.
    #[serde(rename = "ts")]
    pub timestamp: i64,
}

#[derive(Clone)]
pub enum Leaderboard {
    Postgres(PgPool),
    Memory(Arc<Mutex<Vec<ScoreEntry>>>),
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Leaderboard {
    /// Empty in-memory leaderboard.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(Mutex::new(Vec::with_capacity(MEMORY_CAPACITY + 1))))
    }

    /// Connect to Postgres if a URL is given, falling back to memory when the
    /// URL is missing or the database cannot be reached.
    pub async fn connect(database_url: Option<&str>, max_connections: u32) -> Self {
        let Some(url) = database_url else {
            info!("leaderboard: DATABASE_URL not set, using in-memory store");
            return Self::memory();
        };
        match crate::db::init_pool(url, max_connections).await {
            Ok(pool) => {
                info!(max_connections, "leaderboard: using postgres");
                Self::Postgres(pool)
            }
            Err(e) => {
                warn!(error = %e, "leaderboard: postgres unavailable, using in-memory store");
                Self::memory()
            }
        }
    }

    /// Backend name for logs and the health endpoint.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl Leaderboard {
    /// Validate and record a score stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty username or a negative score, and
    /// `Database` if the insert fails.
    pub async fn submit(&self, username: &str, score: i64) -> Result<ScoreEntry, LeaderboardError> {
        let username = validate_submission(username, score)?;
        let entry = ScoreEntry { username, score, timestamp: now_ms() };

        match self {
            Self::Postgres(pool) => {
                sqlx::query("INSERT INTO scores (username, score, ts) VALUES ($1, $2, $3)")
                    .bind(&entry.username)
                    .bind(entry.score)
                    .bind(entry.timestamp)
                    .execute(pool)
                    .await?;
            }
            Self::Memory(entries) => {
                let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
                entries.push(entry.clone());
                // Stable sort keeps earlier submissions ahead on ties.
                entries.sort_by(|a, b| b.score.cmp(&a.score));
                entries.truncate(MEMORY_CAPACITY);
            }
        }
        Ok(entry)
    }

    /// Highest scores first, at most `limit` entries.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn top(&self, limit: i64) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        match self {
            Self::Postgres(pool) => {
                let rows = sqlx::query_as::<_, (String, i64, i64)>(
                    "SELECT username, score, ts FROM scores ORDER BY score DESC, id ASC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(pool)
                .await?;
                Ok(rows
                    .into_iter()
                    .map(|(username, score, timestamp)| ScoreEntry { username, score, timestamp })
                    .collect())
            }
            Self::Memory(entries) => {
                let entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
                let take = usize::try_from(limit).unwrap_or(0);
                Ok(entries.iter().take(take).cloned().collect())
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Trimmed username if the submission is acceptable.
///
/// # Errors
///
/// Returns `Validation` for a blank username or a negative score.
pub fn validate_submission(username: &str, score: i64) -> Result<String, LeaderboardError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LeaderboardError::Validation("username must be a non-empty string".into()));
    }
    if score < 0 {
        return Err(LeaderboardError::Validation("score must be a non-negative integer".into()));
    }
    Ok(username.to_owned())
}

/// Requested limit, defaulting to [`DEFAULT_LIMIT`] and clamped to
/// `1..=MAX_LIMIT`.
#[must_use]
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
