//! Message envelope for multi-hop delivery.
//!
//! Declared for the data model only: the engine does not route, forward, or
//! deliver packets.

use mesh4d_env::NodeId;
use serde::{Deserialize, Serialize};

/// Default hop budget for a new packet.
pub const DEFAULT_TTL: u32 = 10;

/// A message travelling through the mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPacket {
    pub source: NodeId,

    /// Destination, or `None` for a broadcast
    pub target: Option<NodeId>,

    /// Simulation time the packet was created at
    pub timestamp: f64,

    /// Opaque application payload
    pub data: serde_json::Value,

    #[serde(default)]
    pub hop_count: u32,

    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

impl NetworkPacket {
    /// Creates a fresh packet with zero hops and the default TTL.
    pub fn new(
        source: NodeId,
        target: Option<NodeId>,
        timestamp: f64,
        data: serde_json::Value,
    ) -> Self {
        Self {
            source,
            target,
            timestamp,
            data,
            hop_count: 0,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.target.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_packet_defaults() {
        let packet = NetworkPacket::new(NodeId(1), None, 4.0, json!({"kind": "hello"}));

        assert_eq!(packet.hop_count, 0);
        assert_eq!(packet.ttl, DEFAULT_TTL);
        assert!(packet.is_broadcast());
    }

    #[test]
    fn test_missing_counters_use_defaults() {
        let packet: NetworkPacket = serde_json::from_str(
            r#"{"source": 2, "target": 5, "timestamp": 1.5, "data": null}"#,
        )
        .unwrap();

        assert_eq!(packet.target, Some(NodeId(5)));
        assert_eq!(packet.ttl, 10);
        assert_eq!(packet.hop_count, 0);
    }
}
