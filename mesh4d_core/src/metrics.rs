//! Per-tick metrics emitted by the stepping engine.

use crate::protocol::CommunicationType;
use mesh4d_env::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A connection formed during one tick, from `source`'s point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    pub protocol: CommunicationType,
}

/// Battery statistics over the whole roster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatterySummary {
    pub min: f64,
    pub avg: f64,
}

impl BatterySummary {
    /// Summarizes `levels`; `None` when there are no levels at all.
    pub fn from_levels<I>(levels: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        for level in levels {
            count += 1;
            sum += level;
            min = min.min(level);
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            min,
            avg: sum / count as f64,
        })
    }
}

/// Everything an external reporter needs to know about one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick index
    pub tick: u64,

    /// Simulation time after the tick
    pub time: f64,

    pub active_nodes: usize,
    pub intermittent_nodes: usize,
    pub offline_nodes: usize,

    /// Ordered connections, one per (initiator, peer) pair at most
    pub connections: Vec<Connection>,

    /// Roster battery statistics; `None` for an empty roster
    pub battery: Option<BatterySummary>,
}

impl TickReport {
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of distinct unordered node pairs that connected this tick.
    pub fn link_count(&self) -> usize {
        self.connections
            .iter()
            .map(|c| (c.source.min(c.target), c.source.max(c.target)))
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of connections established over `protocol`.
    pub fn connections_via(&self, protocol: CommunicationType) -> usize {
        self.connections
            .iter()
            .filter(|c| c.protocol == protocol)
            .count()
    }

    pub fn node_count(&self) -> usize {
        self.active_nodes + self.intermittent_nodes + self.offline_nodes
    }
}

impl std::fmt::Display for TickReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Step {}: Time={:.1}, Active nodes={}, Connections={}, Battery levels: ",
            self.tick,
            self.time,
            self.active_nodes,
            self.connection_count()
        )?;
        match &self.battery {
            Some(battery) => write!(f, "min={:.1}, avg={:.1}", battery.min, battery.avg),
            None => write!(f, "n/a"),
        }
    }
}
