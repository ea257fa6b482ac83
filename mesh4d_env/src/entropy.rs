//! Core randomness trait for the mesh engine.

/// The central interface for stochastic decisions.
///
/// The mesh engine draws every random number through this trait so that a
/// run can be explored with fresh entropy or replayed from a seed.
///
/// # Implementations
///
/// - **Exploration**: `OsEntropy` - seeded once from the operating system
/// - **Reproducible**: `SeededEntropy` - ChaCha8 stream from a 64-bit seed
/// - **Unit tests**: `ScriptedEntropy` - replays a fixed sequence
///
/// # Contract
///
/// `next_unit` returns a sample in `[0, 1)`. The provided helpers derive
/// every other draw from it, one sample per call, so a scripted sequence maps
/// one-to-one onto engine decisions.
pub trait EntropySource {
    /// Returns the next sample, uniform in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Returns a sample uniform in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_unit()
    }

    /// Returns `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// Returns the source's seed (for logging/debugging).
    ///
    /// Unseeded sources return 0.
    fn seed(&self) -> u64;
}

impl<E: EntropySource + ?Sized> EntropySource for &mut E {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}

impl<E: EntropySource + ?Sized> EntropySource for Box<E> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}
