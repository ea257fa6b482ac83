//! Error types for the mesh4d environment abstraction.

use thiserror::Error;

/// Errors that can occur while building an entropy source.
#[derive(Debug, Error, PartialEq)]
pub enum EnvError {
    /// A scripted source needs at least one value to replay
    #[error("Scripted entropy sequence is empty")]
    EmptySequence,

    /// Scripted samples must lie in the unit interval [0, 1)
    #[error("Scripted sample {0} is outside [0, 1)")]
    InvalidSample(f64),
}
