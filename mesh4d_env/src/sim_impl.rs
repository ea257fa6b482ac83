//! Reproducible entropy sources for simulation runs and tests.

use crate::{EntropySource, EnvError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Entropy source backed by a seeded ChaCha8 RNG.
///
/// Same seed, same sequence: any run can be reproduced from its seed.
#[derive(Clone)]
pub struct SeededEntropy {
    /// Master seed for this stream
    seed: u64,

    rng: ChaCha8Rng,
}

impl SeededEntropy {
    /// Creates a new SeededEntropy with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Entropy source that replays a fixed sequence of samples.
///
/// The sequence wraps around once exhausted. Each engine decision consumes
/// exactly one sample, so tests can pin drain jitter, range jitter, and
/// fault rolls individually.
#[derive(Debug, Clone)]
pub struct ScriptedEntropy {
    samples: Vec<f64>,
    cursor: usize,
    draws: u64,
}

impl ScriptedEntropy {
    /// Creates a scripted source from samples in `[0, 1)`.
    pub fn new(samples: Vec<f64>) -> Result<Self, EnvError> {
        if samples.is_empty() {
            return Err(EnvError::EmptySequence);
        }
        if let Some(bad) = samples.iter().find(|s| !(0.0..1.0).contains(*s)) {
            return Err(EnvError::InvalidSample(*bad));
        }
        Ok(Self {
            samples,
            cursor: 0,
            draws: 0,
        })
    }

    /// Creates a source that always returns `sample`.
    pub fn constant(sample: f64) -> Result<Self, EnvError> {
        Self::new(vec![sample])
    }

    /// Number of samples consumed so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl EntropySource for ScriptedEntropy {
    fn next_unit(&mut self) -> f64 {
        let sample = self.samples[self.cursor];
        self.cursor = (self.cursor + 1) % self.samples.len();
        self.draws += 1;
        sample
    }

    fn seed(&self) -> u64 {
        0
    }
}
