//! Opponent-facing board snapshot.
//!
//! Sent through the relay as the payload of a `state` message and rendered
//! read-only on the other side. The active piece is not included.

use serde::{Deserialize, Serialize};

use crate::piece::Cell;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Row-major locked cells, top row first.
    #[serde(alias = "arena")]
    pub grid: Vec<Vec<Cell>>,
    pub score: u64,
}

impl BoardSnapshot {
    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| **cell != 0).count()
    }

    /// Height of the tallest column, counted from the floor.
    #[must_use]
    pub fn stack_height(&self) -> usize {
        self.grid
            .iter()
            .position(|row| row.iter().any(|cell| *cell != 0))
            .map_or(0, |top| self.grid.len() - top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_legacy_arena_field() {
        let snap: BoardSnapshot = serde_json::from_str(r#"{"arena":[[0,1],[2,0]],"score":9}"#).expect("parse");
        assert_eq!(snap.grid, vec![vec![0, 1], vec![2, 0]]);
        assert_eq!(snap.score, 9);
    }

    #[test]
    fn serializes_grid_field() {
        let snap = BoardSnapshot { grid: vec![vec![0, 4]], score: 40 };
        let json = serde_json::to_value(&snap).expect("serialize");
        assert_eq!(json, serde_json::json!({"grid": [[0, 4]], "score": 40}));
    }

    #[test]
    fn counts_and_heights() {
        let snap = BoardSnapshot { grid: vec![vec![0, 0], vec![0, 3], vec![5, 5]], score: 0 };
        assert_eq!(snap.occupied(), 3);
        assert_eq!(snap.stack_height(), 2);

        let empty = BoardSnapshot { grid: vec![vec![0; 10]; 20], score: 0 };
        assert_eq!(empty.stack_height(), 0);
    }
}
