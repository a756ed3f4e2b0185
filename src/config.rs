//! Server configuration loaded from the environment.
//!
//! Every knob has a default, so a bare `cargo run` starts a playable server
//! with an in-memory leaderboard. Invalid values fall back to the default
//! rather than aborting startup.

use std::path::PathBuf;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Postgres URL. `None` selects the in-memory leaderboard.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Directory served for any path the router does not match.
    pub public_dir: PathBuf,
    /// Per-connection outbound message buffer.
    pub outbound_queue_capacity: usize,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            public_dir: std::env::var("PUBLIC_DIR").map_or_else(|_| PathBuf::from(DEFAULT_PUBLIC_DIR), PathBuf::from),
            outbound_queue_capacity: env_parse("OUTBOUND_QUEUE_CAPACITY", DEFAULT_OUTBOUND_QUEUE_CAPACITY).max(1),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
