//! Piece kinds, their canonical matrices, and in-place rotation.
//!
//! Every matrix is stored in a square bounding box, which is what makes the
//! transpose-and-reverse rotation correct without a rotation centre.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "piece_test.rs"]
mod piece_test;

/// Cell value: `0` is empty, `1..=7` is the id of the kind occupying it.
pub type Cell = u8;

/// Row-major square matrix of cells.
pub type Matrix = Vec<Vec<Cell>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Cell id written into the grid when this kind locks.
    #[must_use]
    pub fn id(self) -> Cell {
        match self {
            PieceKind::I => 1,
            PieceKind::J => 2,
            PieceKind::L => 3,
            PieceKind::O => 4,
            PieceKind::S => 5,
            PieceKind::T => 6,
            PieceKind::Z => 7,
        }
    }

    #[must_use]
    pub fn from_id(id: Cell) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Fresh copy of the spawn orientation.
    #[must_use]
    pub fn matrix(self) -> Matrix {
        let rows: &[&[Cell]] = match self {
            PieceKind::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            PieceKind::J => &[&[2, 0, 0], &[2, 2, 2], &[0, 0, 0]],
            PieceKind::L => &[&[0, 0, 3], &[3, 3, 3], &[0, 0, 0]],
            PieceKind::O => &[&[4, 4], &[4, 4]],
            PieceKind::S => &[&[0, 5, 5], &[5, 5, 0], &[0, 0, 0]],
            PieceKind::T => &[&[0, 6, 0], &[6, 6, 6], &[0, 0, 0]],
            PieceKind::Z => &[&[7, 7, 0], &[0, 7, 7], &[0, 0, 0]],
        };
        rows.iter().map(|row| row.to_vec()).collect()
    }
}

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Rotation::Clockwise => Rotation::CounterClockwise,
            Rotation::CounterClockwise => Rotation::Clockwise,
        }
    }
}

/// A piece matrix positioned in grid coordinates. `(x, y)` is where the
/// matrix's top-left corner sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub matrix: Matrix,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self { kind, matrix: kind.matrix(), x: 0, y: 0 }
    }

    /// Width of the bounding box.
    #[must_use]
    pub fn width(&self) -> usize {
        self.matrix.first().map_or(0, Vec::len)
    }

    /// Occupied cells as absolute `(x, y, value)` grid coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        self.matrix.iter().zip(0_i32..).flat_map(move |(row, dy)| {
            row.iter()
                .zip(0_i32..)
                .filter(|(cell, _)| **cell != 0)
                .map(move |(cell, dx)| (self.x + dx, self.y + dy, *cell))
        })
    }

    /// Rotate the matrix by 90 degrees in place. Position is unchanged.
    pub fn rotate(&mut self, rotation: Rotation) {
        rotate_matrix(&mut self.matrix, rotation);
    }
}

/// Transpose, then mirror: reversing each row gives a clockwise turn,
/// reversing the row order gives a counter-clockwise one.
pub fn rotate_matrix(matrix: &mut Matrix, rotation: Rotation) {
    for y in 0..matrix.len() {
        for x in 0..y {
            let upper = matrix[x][y];
            matrix[x][y] = matrix[y][x];
            matrix[y][x] = upper;
        }
    }
    match rotation {
        Rotation::Clockwise => matrix.iter_mut().for_each(|row| row.reverse()),
        Rotation::CounterClockwise => matrix.reverse(),
    }
}
