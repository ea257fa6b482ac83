//! Configuration errors for the mesh engine.
//!
//! The engine has no runtime failure modes of its own: every error below is
//! raised while building or configuring a mesh, never mid-tick.

use crate::node::NodeState;
use crate::protocol::CommunicationType;
use mesh4d_env::NodeId;
use thiserror::Error;

/// Errors raised when a mesh, node, or protocol table is misconfigured.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("World bounds must be positive and finite, got ({x}, {y}, {z})")]
    InvalidBounds { x: f64, y: f64, z: f64 },

    #[error("Tick duration must be finite and non-negative, got {0}")]
    InvalidTimeStep(f64),

    #[error("Node must support at least one communication protocol")]
    EmptyProtocolSet,

    #[error("Battery level must lie in [0, 100], got {0}")]
    InvalidBattery(f64),

    #[error("Invalid profile for {protocol}: {reason}")]
    InvalidProtocolProfile {
        protocol: CommunicationType,
        reason: String,
    },

    #[error("Node cannot start {state} with battery {battery}: OFFLINE means an empty battery")]
    InvalidState { state: NodeState, battery: f64 },

    #[error("Invalid motion parameters: {0}")]
    InvalidMotion(String),

    #[error("Node {0} is already part of the mesh")]
    DuplicateNode(NodeId),
}
