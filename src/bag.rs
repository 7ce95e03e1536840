//! 7-bag randomizer for piece generation.
//!
//! All 7 kinds are shuffled and dealt out before reshuffling, so no kind
//! can drought for more than 12 draws. The queue is topped up before a pop
//! whenever fewer than 2 pieces remain, and again if it runs empty after
//! the pop, so there is always at least one piece to preview.

use crate::tetromino::PieceKind;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The 7-bag piece randomizer.
#[derive(Debug, Clone)]
pub struct Bag {
    queue: Vec<PieceKind>,
    rng: ChaCha8Rng,
}

impl Bag {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Seeded constructor for reproducible shuffles in tests.
    pub fn with_seed(seed: u64) -> Self {
        let mut bag = Self {
            queue: Vec::with_capacity(14),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        bag.refill();
        bag
    }

    /// Drop any queued pieces and start from a fresh bag (new game).
    pub fn reset(&mut self) {
        self.queue.clear();
        self.refill();
    }

    /// Pop the next piece kind, keeping the queue stocked.
    pub fn next(&mut self) -> PieceKind {
        if self.queue.len() < 2 {
            self.refill();
        }
        let kind = self.queue.remove(0);
        if self.queue.is_empty() {
            self.refill();
        }
        kind
    }

    /// The upcoming piece, for the preview box.
    pub fn peek(&self) -> Option<PieceKind> {
        self.queue.first().copied()
    }

    /// Append one uniformly-shuffled bag of all 7 kinds.
    fn refill(&mut self) {
        let mut pieces = PieceKind::all().to_vec();
        pieces.shuffle(&mut self.rng);
        self.queue.extend(pieces);
    }
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}
