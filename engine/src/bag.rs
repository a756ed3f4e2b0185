//! Piece supply: the 7-bag randomizer and the [`PieceSource`] seam.
//!
//! A bag holds each of the seven kinds exactly once. It is drained from the
//! front and regenerated only once empty, so the last kind of one bag may
//! equal the first kind of the next.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::piece::PieceKind;

#[cfg(test)]
#[path = "bag_test.rs"]
mod bag_test;

/// Anything that can hand the board its next piece kind.
pub trait PieceSource {
    fn next_kind(&mut self) -> PieceKind;
}

/// Shuffled bag of the seven kinds.
pub struct Bag {
    rng: StdRng,
    pending: VecDeque<PieceKind>,
}

impl Bag {
    /// Bag seeded from the thread-local generator.
    #[must_use]
    pub fn new() -> Self {
        Self::seeded(rand::rng().random())
    }

    /// Bag with a reproducible order.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), pending: VecDeque::with_capacity(PieceKind::ALL.len()) }
    }

    /// Kinds left before the next reshuffle.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Build a new bag by drawing uniformly from the kinds not yet drawn.
    fn refill(&mut self) {
        let mut undrawn = PieceKind::ALL.to_vec();
        while !undrawn.is_empty() {
            let pick = self.rng.random_range(0..undrawn.len());
            self.pending.push_back(undrawn.remove(pick));
        }
    }
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSource for Bag {
    fn next_kind(&mut self) -> PieceKind {
        loop {
            if let Some(kind) = self.pending.pop_front() {
                return kind;
            }
            self.refill();
        }
    }
}

/// Repeats a fixed list of kinds forever. Drills and tests use it to make
/// the piece order predictable.
pub struct FixedSequence {
    kinds: Vec<PieceKind>,
    cursor: usize,
}

impl FixedSequence {
    /// Falls back to `O` when given an empty list.
    #[must_use]
    pub fn new(kinds: Vec<PieceKind>) -> Self {
        let kinds = if kinds.is_empty() { vec![PieceKind::O] } else { kinds };
        Self { kinds, cursor: 0 }
    }
}

impl PieceSource for FixedSequence {
    fn next_kind(&mut self) -> PieceKind {
        let kind = self.kinds[self.cursor % self.kinds.len()];
        self.cursor = self.cursor.wrapping_add(1);
        kind
    }
}
