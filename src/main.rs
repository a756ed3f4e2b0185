mod config;
mod db;
mod protocol;
mod routes;
mod services;
mod state;

use config::ServerConfig;
use services::leaderboard::Leaderboard;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();

    // Non-fatal: an unreachable database falls back to the in-memory store.
    let leaderboard = Leaderboard::connect(config.database_url.as_deref(), config.db_max_connections).await;
    tracing::info!(backend = leaderboard.backend(), "leaderboard ready");

    let state = state::AppState::new(leaderboard, config.outbound_queue_capacity);

    let app = routes::app(state, &config.public_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, public_dir = %config.public_dir.display(), "blockduel listening");
    axum::serve(listener, app).await.expect("server failed");
}
