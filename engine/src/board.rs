//! Board simulation: the grid, the falling piece, and score.
//!
//! DESIGN
//! ======
//! `collides` is the only legality check. Every move is applied
//! optimistically and reverted if the result collides. Locking merges the
//! piece, clears full rows, and spawns the next piece; if that piece already
//! overlaps the stack the board is `Locked` and every further operation is a
//! silent no-op.
//!
//! STATE MACHINE
//! =============
//! `Spawning -> Active -> (Locking -> Spawning) | Locked`

use crate::bag::{Bag, PieceSource};
use crate::consts::{HEIGHT, LINE_CLEAR_POINTS, SOFT_DROP_POINTS, WIDTH};
use crate::piece::{Cell, Piece, Rotation};
use crate::snapshot::BoardSnapshot;

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

// =============================================================================
// GRID
// =============================================================================

/// Fixed `WIDTH x HEIGHT` cell array. Row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<[Cell; WIDTH]>,
}

impl Grid {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: vec![[0; WIDTH]; HEIGHT] }
    }

    fn index(x: i32, y: i32) -> Option<(usize, usize)> {
        let x = usize::try_from(x).ok().filter(|x| *x < WIDTH)?;
        let y = usize::try_from(y).ok().filter(|y| *y < HEIGHT)?;
        Some((x, y))
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        Self::index(x, y).map(|(x, y)| self.rows[y][x])
    }

    /// Write a cell. Returns `false` (and writes nothing) outside the grid.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        let Some((x, y)) = Self::index(x, y) else {
            return false;
        };
        self.rows[y][x] = cell;
        true
    }

    #[must_use]
    pub fn rows(&self) -> &[[Cell; WIDTH]] {
        &self.rows
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| **cell != 0).count()
    }

    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows.get(y).is_some_and(|row| row.iter().all(|cell| *cell != 0))
    }

    /// Copy every occupied piece cell into the grid. Cells above the top
    /// edge are dropped.
    pub fn merge(&mut self, piece: &Piece) {
        for (x, y, cell) in piece.cells() {
            self.set(x, y, cell);
        }
    }

    /// Remove full rows bottom to top, inserting an empty row at the top for
    /// each. After a removal the same index is checked again, since the row
    /// above has just moved into it. Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = HEIGHT;
        while y > 0 {
            if self.is_row_full(y - 1) {
                self.rows.remove(y - 1);
                self.rows.insert(0, [0; WIDTH]);
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        cleared
    }

    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        self.rows.iter().map(|row| row.to_vec()).collect()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

/// True if any occupied piece cell lies outside the grid (on any side) or
/// lands on an occupied grid cell. Pure: neither argument is modified.
#[must_use]
pub fn collides(piece: &Piece, grid: &Grid) -> bool {
    piece.cells().any(|(x, y, _)| grid.get(x, y).is_none_or(|cell| cell != 0))
}

/// Points for clearing `rows` rows with one lock.
#[must_use]
pub fn line_clear_points(rows: usize) -> u64 {
    LINE_CLEAR_POINTS.get(rows).copied().unwrap_or(LINE_CLEAR_POINTS[LINE_CLEAR_POINTS.len() - 1])
}

/// Column that horizontally centres a piece of the given width.
#[must_use]
pub fn spawn_column(piece_width: usize) -> i32 {
    i32::try_from(WIDTH.saturating_sub(piece_width) / 2).unwrap_or(0)
}

// =============================================================================
// BOARD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    Active,
    /// Terminal: a freshly spawned piece overlapped the stack.
    Locked,
}

/// What a gravity step or drop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The piece moved down one row.
    Moved,
    /// The piece locked and a new piece spawned cleanly.
    Landed { cleared: usize },
    /// The piece locked and the next piece could not spawn.
    ToppedOut { cleared: usize },
    /// The board was already locked.
    Ignored,
}

pub struct Board {
    grid: Grid,
    active: Option<Piece>,
    score: u64,
    state: BoardState,
    source: Box<dyn PieceSource>,
}

impl Board {
    /// Empty board fed by a fresh random bag.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(Box::new(Bag::new()))
    }

    #[must_use]
    pub fn with_source(source: Box<dyn PieceSource>) -> Self {
        Self::with_grid(Grid::new(), source)
    }

    /// Board over a pre-filled grid. The first piece is spawned immediately.
    #[must_use]
    pub fn with_grid(grid: Grid, source: Box<dyn PieceSource>) -> Self {
        let mut board = Self { grid, active: None, score: 0, state: BoardState::Active, source };
        board.spawn();
        board
    }

    // --- Queries ---

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn active(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn state(&self) -> BoardState {
        self.state
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state == BoardState::Locked
    }

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot { grid: self.grid.to_rows(), score: self.score }
    }

    // --- Operations ---

    /// Install the next piece centred at the top. Enters `Locked` if it
    /// overlaps the stack. The grid is never touched.
    pub fn spawn(&mut self) {
        let mut piece = Piece::new(self.source.next_kind());
        piece.x = spawn_column(piece.width());
        piece.y = 0;
        if collides(&piece, &self.grid) {
            self.state = BoardState::Locked;
        }
        self.active = Some(piece);
    }

    /// Move the piece sideways by `dx` columns if the target is free.
    pub fn try_shift(&mut self, dx: i32) -> bool {
        if self.is_locked() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        piece.x += dx;
        if collides(piece, &self.grid) {
            piece.x -= dx;
            return false;
        }
        true
    }

    /// Rotate with the alternating wall-kick search.
    ///
    /// Offsets `+1, -2, +3, -4, ...` are applied cumulatively; the search
    /// stops as soon as the next offset would exceed the piece width, and a
    /// failed rotation restores both orientation and column.
    pub fn try_rotate(&mut self, rotation: Rotation) -> bool {
        if self.is_locked() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        let origin_x = piece.x;
        piece.rotate(rotation);

        let width = i32::try_from(piece.width()).unwrap_or(i32::MAX);
        let mut offset: i32 = 1;
        while collides(piece, &self.grid) {
            piece.x += offset;
            offset = -(offset + offset.signum());
            if offset > width {
                piece.rotate(rotation.inverse());
                piece.x = origin_x;
                return false;
            }
        }
        true
    }

    /// Gravity tick: fall one row, or lock in place if blocked.
    pub fn step(&mut self) -> StepResult {
        if self.is_locked() {
            return StepResult::Ignored;
        }
        let Some(piece) = self.active.as_mut() else {
            return StepResult::Ignored;
        };
        piece.y += 1;
        if !collides(piece, &self.grid) {
            return StepResult::Moved;
        }
        piece.y -= 1;
        self.lock()
    }

    /// Player-initiated step worth one bonus point.
    pub fn soft_drop(&mut self) -> StepResult {
        let result = self.step();
        if result != StepResult::Ignored {
            self.score += SOFT_DROP_POINTS;
        }
        result
    }

    /// Fall as far as possible, then lock.
    pub fn hard_drop(&mut self) -> StepResult {
        if self.is_locked() {
            return StepResult::Ignored;
        }
        let Some(piece) = self.active.as_mut() else {
            return StepResult::Ignored;
        };
        loop {
            piece.y += 1;
            if collides(piece, &self.grid) {
                piece.y -= 1;
                break;
            }
        }
        self.lock()
    }

    /// Merge, clear, score, spawn, loss check.
    fn lock(&mut self) -> StepResult {
        let Some(piece) = self.active.take() else {
            return StepResult::Ignored;
        };
        self.grid.merge(&piece);
        let cleared = self.grid.clear_full_rows();
        self.score += line_clear_points(cleared);
        self.spawn();
        if self.is_locked() { StepResult::ToppedOut { cleared } } else { StepResult::Landed { cleared } }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
