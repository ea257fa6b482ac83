//! Exploration implementation of EntropySource backed by OS entropy.

use crate::EntropySource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Entropy source seeded once from the operating system.
///
/// Used for ad-hoc runs where reproducibility is not wanted. Runs driven by
/// this source cannot be replayed.
pub struct OsEntropy {
    rng: StdRng,
}

impl OsEntropy {
    /// Creates a new OsEntropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for OsEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for OsEntropy {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn seed(&self) -> u64 {
        // Not seeded
        0
    }
}
