//! Shared numeric constants for the engine crate.

// ── Grid ────────────────────────────────────────────────────────

/// Number of columns on the board.
pub const WIDTH: usize = 10;

/// Number of rows on the board.
pub const HEIGHT: usize = 20;

// ── Scoring ─────────────────────────────────────────────────────

/// Points for clearing 0, 1, 2, 3 or 4 rows with a single lock.
pub const LINE_CLEAR_POINTS: [u64; 5] = [0, 40, 100, 300, 1200];

/// Bonus for each player-initiated soft drop.
pub const SOFT_DROP_POINTS: u64 = 1;

// ── Timing (milliseconds) ───────────────────────────────────────

/// Gravity interval at score zero.
pub const BASE_DROP_INTERVAL_MS: u64 = 500;

/// Interval reduction applied per [`DROP_SCORE_STEP`] points.
pub const DROP_INTERVAL_STEP_MS: u64 = 20;

/// Score granularity of the difficulty curve.
pub const DROP_SCORE_STEP: u64 = 100;

/// The interval never drops more than this below the base.
pub const MAX_DROP_SPEEDUP_MS: u64 = 400;

/// Cadence of opponent-facing board snapshots.
pub const SNAPSHOT_INTERVAL_MS: u64 = 250;
