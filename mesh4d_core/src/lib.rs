//! mesh4d Core - Mobility, Energy and Connectivity Engine
//!
//! This library models a mobile ad-hoc mesh of wireless nodes over discrete
//! time:
//! 1. **Motion**: Euler-integrated velocities with soft reflection at the
//!    world bounds
//! 2. **Energy**: protocol-dependent battery drain driving a one-way
//!    ACTIVE → INTERMITTENT → OFFLINE state machine
//! 3. **Connectivity**: jittered, protocol-specific range checks between
//!    every ordered pair of nodes, first protocol in declaration order wins
//!
//! All randomness comes from an injected [`mesh4d_env::EntropySource`].
//!
//! ```
//! use mesh4d_core::{CommunicationType, Mesh, MeshConfig, Node, Position, ProtocolSet};
//! use mesh4d_env::{NodeId, SeededEntropy};
//!
//! let mut mesh = Mesh::new(MeshConfig::default(), SeededEntropy::new(42)).unwrap();
//! let ble = ProtocolSet::single(CommunicationType::Ble);
//! mesh.add_node(Node::new(NodeId(0), Position::new(10.0, 10.0, 1.0), ble.clone())).unwrap();
//! mesh.add_node(Node::new(NodeId(1), Position::new(12.0, 10.0, 1.0), ble)).unwrap();
//!
//! let report = mesh.step(1.0).unwrap();
//! assert_eq!(report.node_count(), 2);
//! ```

pub mod error;
pub mod mesh;
pub mod metrics;
pub mod node;
pub mod packet;
pub mod position;
pub mod protocol;
pub mod snapshot;

// Re-export key types for convenience
pub use error::ConfigError;
pub use mesh::{EncounterAttribution, Mesh, MeshConfig, MotionConfig};
pub use metrics::{BatterySummary, Connection, TickReport};
pub use node::{Encounter, Node, NodeState, StateTransition};
pub use packet::NetworkPacket;
pub use position::{Position, WorldBounds};
pub use protocol::{CommunicationType, ProtocolProfile, ProtocolSet, ProtocolTable};
pub use snapshot::{MeshSnapshot, NodeSnapshot};
