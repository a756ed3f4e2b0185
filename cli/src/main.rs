mod autopilot;
mod wire;

use std::fmt;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use engine::bag::Bag;
use engine::board::Board;
use engine::session::{DropCurve, GameSession, SessionEvent};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use uuid::Uuid;

use autopilot::Autopilot;
use wire::ServerEvent;

type Stream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("timed out waiting for the lobby")]
    Timeout,
    #[error("server returned error for {context}: {message}")]
    ServerError { context: String, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        CliError::WsConnect(Box::new(error))
    }
}

#[derive(Parser, Debug)]
#[command(name = "blockduel-cli", about = "Blockduel leaderboard and headless player CLI")]
struct Cli {
    #[arg(long, env = "BLOCKDUEL_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Check the server health endpoint.
    Ping,
    /// Print the top scores.
    Leaderboard {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Record a score directly.
    Submit {
        #[arg(long)]
        username: String,
        #[arg(long)]
        score: u64,
    },
    /// Join the queue and play one match with the autopilot.
    Play(PlayArgs),
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[arg(long, default_value = "Autopilot")]
    name: String,
    #[arg(long, help = "Seed for a reproducible piece order")]
    seed: Option<u64>,
    #[arg(long, default_value_t = 50, help = "Milliseconds between frames")]
    frame_ms: u64,
    #[arg(long, default_value_t = 120, help = "Seconds to wait for an opponent")]
    match_timeout_secs: u64,
    #[arg(long, default_value_t = false, help = "Skip the leaderboard submission")]
    no_submit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Won,
    Lost,
    OpponentLeft,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Won => f.write_str("won"),
            Outcome::Lost => f.write_str("lost"),
            Outcome::OpponentLeft => f.write_str("opponent left"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let base_url = cli.base_url.trim_end_matches('/').to_owned();

    match cli.command {
        CliCommand::Ping => run_ping(&base_url).await,
        CliCommand::Leaderboard { limit } => {
            let path = match limit {
                Some(limit) => format!("/api/leaderboard?limit={limit}"),
                None => "/api/leaderboard".to_owned(),
            };
            let json = api_request(&base_url, reqwest::Method::GET, &path, None).await?;
            print_json(&json)
        }
        CliCommand::Submit { username, score } => {
            let json = submit_score(&base_url, &username, score).await?;
            print_json(&json)
        }
        CliCommand::Play(args) => run_play(&base_url, args).await,
    }
}

async fn run_ping(base_url: &str) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let response = client.get(format!("{base_url}/healthz")).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(CliError::ServerError {
            context: format!("HTTP {}", status.as_u16()),
            message: "health check failed".to_owned(),
        });
    }

    println!("ok");
    Ok(())
}

// =============================================================================
// PLAY
// =============================================================================

async fn run_play(base_url: &str, args: PlayArgs) -> Result<(), CliError> {
    let (mut stream, _) = connect_async(wire::ws_url(base_url)?).await?;

    send_json(&mut stream, &wire::identify(&args.name)).await?;
    send_json(&mut stream, &wire::enqueue(&args.name)).await?;

    let (room_id, opponent) = wait_for_match(&mut stream, Duration::from_secs(args.match_timeout_secs)).await?;
    eprintln!("matched with {opponent} (room {room_id})");

    let board = match args.seed {
        Some(seed) => Board::with_source(Box::new(Bag::seeded(seed))),
        None => Board::new(),
    };
    let mut session = GameSession::with_board(board, DropCurve::default());
    let outcome = play_match(&mut stream, &mut session, room_id, args.frame_ms.max(1)).await?;
    let _ = stream.close(None).await;

    let score = session.score();
    println!("{outcome}: score {score}");

    if !args.no_submit {
        // A failed submission does not change the outcome.
        if let Err(error) = submit_score(base_url, &args.name, score).await {
            warn!(%error, "score submission failed");
        }
    }
    Ok(())
}

async fn wait_for_match(stream: &mut Stream, timeout: Duration) -> Result<(Uuid, String), CliError> {
    let fut = async {
        loop {
            let Some(event) = read_event(stream.next().await)? else {
                continue;
            };
            match event {
                ServerEvent::Queued => info!("queued, waiting for an opponent"),
                ServerEvent::Presence { names } => debug!(?names, "presence"),
                ServerEvent::Matched { room_id, opponent_name } => return Ok((room_id, opponent_name)),
                ServerEvent::Error { code, message } => {
                    return Err(CliError::ServerError { context: code, message });
                }
                other => debug!(?other, "ignoring lobby event"),
            }
        }
    };

    tokio::time::timeout(timeout, fut).await.map_err(|_| CliError::Timeout)?
}

/// Drive the local session until someone loses or the opponent leaves.
async fn play_match(
    stream: &mut Stream,
    session: &mut GameSession,
    room_id: Uuid,
    frame_ms: u64,
) -> Result<Outcome, CliError> {
    let mut pilot = Autopilot::new();
    let mut frames = tokio::time::interval(Duration::from_millis(frame_ms));
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                let elapsed = u64::try_from(now.duration_since(last_frame).as_millis()).unwrap_or(u64::MAX);
                last_frame = now;

                let mut events = session.tick(elapsed);
                if let Some(command) = pilot.next_command(session.board()) {
                    events.extend(session.apply(command));
                }

                let mut lost = false;
                for event in events {
                    let message = match event {
                        SessionEvent::Snapshot(snapshot) => wire::relay_state(room_id, &snapshot),
                        SessionEvent::Lost { score } => {
                            lost = true;
                            wire::relay_lost(room_id, score)
                        }
                    };
                    send_json(stream, &message).await?;
                }
                if lost {
                    return Ok(Outcome::Lost);
                }
            }
            message = stream.next() => {
                let Some(event) = read_event(message)? else {
                    continue;
                };
                if event.is_opponent_loss() {
                    session.end();
                    return Ok(Outcome::Won);
                }
                let opponent_score = event.opponent_score();
                match event {
                    ServerEvent::PeerDisconnected => {
                        session.end();
                        return Ok(Outcome::OpponentLeft);
                    }
                    ServerEvent::Error { code, message } => warn!(%code, %message, "server error during match"),
                    ServerEvent::Relay { from_id, kind, .. } => debug!(%from_id, %kind, ?opponent_score, "opponent relay"),
                    other => debug!(?other, "ignoring lobby event"),
                }
            }
        }
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

async fn send_json(stream: &mut Stream, value: &Value) -> Result<(), CliError> {
    stream.send(Message::text(value.to_string())).await?;
    Ok(())
}

/// Decode one socket read. Non-text frames and undecodable text yield
/// `Ok(None)`; a closed socket is an error.
fn read_event(
    message: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
) -> Result<Option<ServerEvent>, CliError> {
    let Some(message) = message else {
        return Err(CliError::WsClosed);
    };
    match message? {
        Message::Text(text) => match wire::decode(text.as_str()) {
            Ok(event) => Ok(Some(event)),
            Err(error) => {
                debug!(%error, "skipping undecodable message");
                Ok(None)
            }
        },
        Message::Close(_) => Err(CliError::WsClosed),
        _ => Ok(None),
    }
}

async fn submit_score(base_url: &str, username: &str, score: u64) -> Result<Value, CliError> {
    let body = serde_json::json!({ "username": username, "score": score });
    api_request(base_url, reqwest::Method::POST, "/api/score", Some(body)).await
}

async fn api_request(
    base_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let client = reqwest::Client::new();
    let request = client.request(method, format!("{base_url}{path}"));
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = request.send().await?;
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or_else(|_| Value::Null);

    if !status.is_success() {
        return Err(CliError::ServerError {
            context: format!("HTTP {}", status.as_u16()),
            message: value.to_string(),
        });
    }

    Ok(value)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
