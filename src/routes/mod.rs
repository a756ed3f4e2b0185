//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the score API, the matchmaking WebSocket, and a
//! health check. Any other path falls through to the static game client in
//! `PUBLIC_DIR`.

pub mod scores;
pub mod ws;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState, public_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/score", post(scores::submit_score))
        .route("/api/leaderboard", get(scores::leaderboard))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
