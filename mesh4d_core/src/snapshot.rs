//! Read-only views of mesh state for external renderers and exporters.

use crate::node::{Node, NodeState};
use crate::position::Position;
use crate::protocol::CommunicationType;
use mesh4d_env::NodeId;
use serde::{Deserialize, Serialize};

/// Renderer-facing state of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub position: Position,
    pub state: NodeState,
    pub battery_level: f64,
    pub protocols: Vec<CommunicationType>,
    pub encounter_count: usize,
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id(),
            position: *node.position(),
            state: node.state(),
            battery_level: node.battery_level(),
            protocols: node.protocols().iter().collect(),
            encounter_count: node.encounters().len(),
        }
    }
}

/// Renderer-facing state of the whole mesh at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub tick: u64,
    pub time: f64,
    pub bounds: [f64; 3],
    pub nodes: Vec<NodeSnapshot>,
}

impl MeshSnapshot {
    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn count_in_state(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state == state).count()
    }
}
