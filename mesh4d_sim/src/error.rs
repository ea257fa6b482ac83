//! Error types for the simulation driver.

use mesh4d_core::{CommunicationType, ConfigError};
use thiserror::Error;

/// Errors that abort a simulation run before or while it is set up.
#[derive(Debug, Error)]
pub enum SimError {
    /// Engine-level configuration was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Config or export file could not be read/written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config JSON could not be parsed, or a summary could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol assignment probability outside [0, 1]
    #[error("Assignment probability for {protocol} must lie in [0, 1], got {value}")]
    InvalidProbability {
        protocol: CommunicationType,
        value: f64,
    },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}

impl SimError {
    /// Creates an I/O error tagged with the offending path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
