//! Deterministic utilities for reproducible runs
//!
//! Seeded LCG, a reproducible train/validation split and the tie-breaking
//! order used when two splits have equal gain.

use std::num::Wrapping;

/// Linear congruential generator with glibc constants
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 1_103_515_245;
    const INCREMENT: u64 = 12_345;
    const MODULUS: u64 = 1 << 31;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed % Self::MODULUS),
        }
    }

    /// Next value in `[0, 2^31)`
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Next value in `[0, max)`; 0 when `max` is 0
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as usize
    }

    /// Fisher–Yates shuffle driven by this generator
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i + 1);
            items.swap(i, j);
        }
    }
}

/// Row indices of a holdout split, each side in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Split `n` rows into train and validation sets.
///
/// The validation side receives `ceil(n * fraction)` rows, capped so that at
/// least one training row remains. Same `n`, fraction and seed give the same
/// split on every platform.
pub fn train_validation_split(n: usize, validation_fraction: f64, seed: u64) -> SplitIndices {
    let wanted = (n as f64 * validation_fraction).ceil() as usize;
    let n_validation = wanted.min(n.saturating_sub(1));

    let mut order: Vec<usize> = (0..n).collect();
    LcgRng::new(seed).shuffle(&mut order);

    let mut validation = order[..n_validation].to_vec();
    let mut train = order[n_validation..].to_vec();
    validation.sort_unstable();
    train.sort_unstable();

    SplitIndices { train, validation }
}

/// Ordering for split candidates of equal gain: lower feature index first,
/// then lower threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: i64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: i64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }
}
