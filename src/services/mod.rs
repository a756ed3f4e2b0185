//! Service layer. Business logic shared by the WebSocket and HTTP routes.
//!
//! Services never touch sockets. They mutate [`crate::state::AppState`] and
//! push outbound messages onto per-connection channels.

pub mod leaderboard;
pub mod lobby;
pub mod relay;
