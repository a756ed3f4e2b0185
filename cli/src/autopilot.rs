//! Autopilot — picks a placement for each piece and emits the commands that
//! get it there.
//!
//! DESIGN
//! ======
//! For every rotation and column the current piece can occupy, drop a copy
//! onto a scratch grid and score the result with a weighted sum of aggregate
//! height, cleared lines, holes, and bumpiness. The best placement becomes a
//! [`Plan`]. The pilot then issues one command per call: rotate, shift toward
//! the target column, hard drop.

use engine::board::{Board, Grid, collides};
use engine::consts::{HEIGHT, WIDTH};
use engine::piece::{Piece, PieceKind, Rotation};
use engine::session::Command;

#[cfg(test)]
#[path = "autopilot_test.rs"]
mod tests;

const HEIGHT_WEIGHT: f64 = -0.51;
const LINES_WEIGHT: f64 = 0.76;
const HOLES_WEIGHT: f64 = -0.36;
const BUMPINESS_WEIGHT: f64 = -0.18;

/// Shifts allowed per piece before the pilot gives up and drops.
const MAX_SHIFTS: u32 = 20;

/// Where the current piece should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Clockwise quarter turns from the current orientation.
    pub rotations: u8,
    pub target_x: i32,
}

// =============================================================================
// EVALUATION
// =============================================================================

fn column_heights(grid: &Grid) -> [usize; WIDTH] {
    let mut heights = [0; WIDTH];
    for (x, height) in heights.iter_mut().enumerate() {
        if let Some(top) = grid.rows().iter().position(|row| row[x] != 0) {
            *height = HEIGHT - top;
        }
    }
    heights
}

fn count_holes(grid: &Grid) -> usize {
    (0..WIDTH)
        .map(|x| {
            grid.rows()
                .iter()
                .skip_while(|row| row[x] == 0)
                .filter(|row| row[x] == 0)
                .count()
        })
        .sum()
}

/// Heuristic value of a grid after `lines` rows were cleared. Higher is
/// better.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn evaluate(grid: &Grid, lines: usize) -> f64 {
    let heights = column_heights(grid);
    let aggregate: usize = heights.iter().sum();
    let bumpiness: usize = heights.windows(2).map(|pair| pair[0].abs_diff(pair[1])).sum();
    let holes = count_holes(grid);

    HEIGHT_WEIGHT * aggregate as f64
        + LINES_WEIGHT * lines as f64
        + HOLES_WEIGHT * holes as f64
        + BUMPINESS_WEIGHT * bumpiness as f64
}

/// Best placement for `piece` on `grid`, or `None` if it cannot move at all.
#[must_use]
pub fn best_plan(grid: &Grid, piece: &Piece) -> Option<Plan> {
    let mut best: Option<(f64, Plan)> = None;
    let mut turned = piece.clone();
    let span = i32::try_from(WIDTH).unwrap_or(i32::MAX);

    for rotations in 0..4_u8 {
        let reach = i32::try_from(turned.width()).unwrap_or(0);
        for x in -reach..span {
            let mut candidate = turned.clone();
            candidate.x = x;
            if collides(&candidate, grid) {
                continue;
            }
            loop {
                candidate.y += 1;
                if collides(&candidate, grid) {
                    candidate.y -= 1;
                    break;
                }
            }

            let mut scratch = grid.clone();
            scratch.merge(&candidate);
            let lines = scratch.clear_full_rows();
            let value = evaluate(&scratch, lines);

            if best.is_none_or(|(top, _)| value > top) {
                best = Some((value, Plan { rotations, target_x: x }));
            }
        }
        turned.rotate(Rotation::Clockwise);
    }

    best.map(|(_, plan)| plan)
}

// =============================================================================
// PILOT
// =============================================================================

/// Drives one board, one command at a time.
#[derive(Debug, Default)]
pub struct Autopilot {
    plan: Option<Plan>,
    rotations_done: u8,
    shifts: u32,
    last_seen: Option<(PieceKind, i32)>,
}

impl Autopilot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next command for `board`, or `None` once the board is locked.
    pub fn next_command(&mut self, board: &Board) -> Option<Command> {
        if board.is_locked() {
            return None;
        }
        let piece = board.active()?;

        // Gravity may have locked the previous piece before the plan finished.
        if self.last_seen.is_some_and(|(kind, y)| kind != piece.kind || piece.y < y) {
            self.plan = None;
        }
        self.last_seen = Some((piece.kind, piece.y));

        let plan = match self.plan {
            Some(plan) => plan,
            None => {
                let Some(plan) = best_plan(board.grid(), piece) else {
                    return Some(self.drop_piece());
                };
                self.plan = Some(plan);
                self.rotations_done = 0;
                self.shifts = 0;
                plan
            }
        };

        if self.rotations_done < plan.rotations {
            self.rotations_done += 1;
            return Some(Command::RotateClockwise);
        }
        if self.shifts >= MAX_SHIFTS {
            return Some(self.drop_piece());
        }
        match piece.x.cmp(&plan.target_x) {
            std::cmp::Ordering::Less => {
                self.shifts += 1;
                Some(Command::MoveRight)
            }
            std::cmp::Ordering::Greater => {
                self.shifts += 1;
                Some(Command::MoveLeft)
            }
            std::cmp::Ordering::Equal => Some(self.drop_piece()),
        }
    }

    fn drop_piece(&mut self) -> Command {
        self.plan = None;
        self.last_seen = None;
        Command::HardDrop
    }
}
