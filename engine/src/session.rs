//! Local session controller.
//!
//! DESIGN
//! ======
//! The host owns the clock. Every frame it calls [`GameSession::tick`] with
//! the milliseconds elapsed since the previous frame, and feeds player input
//! through [`GameSession::apply`]. Both return the events the host must
//! forward to the relay: periodic snapshots and, exactly once, the loss
//! notice. Nothing here sleeps, reads time, or performs I/O, so the whole
//! controller is deterministic under test.
//!
//! LIFECYCLE
//! =========
//! `Running -> Lost` when a lock tops out, or `Running -> Ended` when the host
//! calls [`GameSession::end`] (the opponent lost or left). Both are terminal.

use crate::board::{Board, StepResult};
use crate::consts::{
    BASE_DROP_INTERVAL_MS, DROP_INTERVAL_STEP_MS, DROP_SCORE_STEP, MAX_DROP_SPEEDUP_MS, SNAPSHOT_INTERVAL_MS,
};
use crate::piece::Rotation;
use crate::snapshot::BoardSnapshot;

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

// =============================================================================
// DIFFICULTY
// =============================================================================

/// Gravity interval as a function of score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropCurve {
    pub base_ms: u64,
    pub step_ms: u64,
    pub per_score: u64,
    pub floor_ms: u64,
}

impl DropCurve {
    /// Interval for `score`: `base - (score / per_score) * step`, never below
    /// the floor.
    #[must_use]
    pub fn interval_for(&self, score: u64) -> u64 {
        let steps = score.checked_div(self.per_score).unwrap_or(0);
        self.base_ms.saturating_sub(steps.saturating_mul(self.step_ms)).max(self.floor_ms)
    }
}

impl Default for DropCurve {
    fn default() -> Self {
        Self {
            base_ms: BASE_DROP_INTERVAL_MS,
            step_ms: DROP_INTERVAL_STEP_MS,
            per_score: DROP_SCORE_STEP,
            floor_ms: BASE_DROP_INTERVAL_MS - MAX_DROP_SPEEDUP_MS,
        }
    }
}

// =============================================================================
// COMMANDS & EVENTS
// =============================================================================

/// Discrete player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateClockwise,
    RotateCounterClockwise,
}

/// Something the host must forward to the opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Snapshot(BoardSnapshot),
    /// The board topped out. Emitted once per session.
    Lost { score: u64 },
}

// =============================================================================
// SESSION
// =============================================================================

pub struct GameSession {
    board: Board,
    curve: DropCurve,
    drop_elapsed_ms: u64,
    sync_elapsed_ms: u64,
    loss_reported: bool,
    ended: bool,
}

impl GameSession {
    /// Fresh board with a random bag and the default curve.
    #[must_use]
    pub fn new() -> Self {
        Self::with_board(Board::new(), DropCurve::default())
    }

    #[must_use]
    pub fn with_board(board: Board, curve: DropCurve) -> Self {
        Self { board, curve, drop_elapsed_ms: 0, sync_elapsed_ms: 0, loss_reported: false, ended: false }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.board.score()
    }

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        self.board.snapshot()
    }

    /// Current gravity interval.
    #[must_use]
    pub fn drop_interval(&self) -> u64 {
        self.curve.interval_for(self.board.score())
    }

    /// True once the board has topped out or the session was ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.ended || self.board.is_locked()
    }

    /// Stop the session from the outside. No loss event follows.
    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Advance the clock by `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.ended {
            return events;
        }
        if self.board.is_locked() {
            self.report_loss(&mut events);
            return events;
        }

        self.drop_elapsed_ms = self.drop_elapsed_ms.saturating_add(elapsed_ms);
        if self.drop_elapsed_ms > self.drop_interval() {
            self.drop_elapsed_ms = 0;
            if let StepResult::ToppedOut { .. } = self.board.step() {
                self.report_loss(&mut events);
                return events;
            }
        }

        self.sync_elapsed_ms = self.sync_elapsed_ms.saturating_add(elapsed_ms);
        if self.sync_elapsed_ms >= SNAPSHOT_INTERVAL_MS {
            self.sync_elapsed_ms = 0;
            events.push(SessionEvent::Snapshot(self.board.snapshot()));
        }
        events
    }

    /// Apply one player command. Ignored once the session is over.
    pub fn apply(&mut self, command: Command) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }

        let result = match command {
            Command::MoveLeft => {
                self.board.try_shift(-1);
                None
            }
            Command::MoveRight => {
                self.board.try_shift(1);
                None
            }
            Command::RotateClockwise => {
                self.board.try_rotate(Rotation::Clockwise);
                None
            }
            Command::RotateCounterClockwise => {
                self.board.try_rotate(Rotation::CounterClockwise);
                None
            }
            Command::SoftDrop => Some(self.board.soft_drop()),
            Command::HardDrop => Some(self.board.hard_drop()),
        };

        if result.is_some() {
            self.drop_elapsed_ms = 0;
        }
        if let Some(StepResult::ToppedOut { .. }) = result {
            self.report_loss(&mut events);
        }
        events
    }

    fn report_loss(&mut self, events: &mut Vec<SessionEvent>) {
        if self.loss_reported {
            return;
        }
        self.loss_reported = true;
        events.push(SessionEvent::Snapshot(self.board.snapshot()));
        events.push(SessionEvent::Lost { score: self.board.score() });
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
