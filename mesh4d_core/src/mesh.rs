//! The Mesh - roster owner and per-tick stepping engine.
//!
//! # Tick algorithm
//!
//! 1. Advance the clock by `dt`.
//! 2. Every non-offline node moves, reflects off the bounds, and drains.
//! 3. Barrier: every active node tries every other node, protocols in
//!    declaration order; the first success is the pair's connection.
//! 4. Aggregate counts and battery statistics into a [`TickReport`].
//!
//! Connectivity reads the roster immutably; encounter logs are written after
//! all pairs are evaluated, so every pair sees post-drain positions.

use crate::error::ConfigError;
use crate::metrics::{BatterySummary, Connection, TickReport};
use crate::node::{Encounter, Node, NodeState};
use crate::position::WorldBounds;
use crate::protocol::{CommunicationType, ProtocolTable};
use crate::snapshot::{MeshSnapshot, NodeSnapshot};
use mesh4d_env::{EntropySource, NodeId};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Initial velocity assignment for nodes joining the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Horizontal speed limit per axis (units per time)
    pub max_speed: f64,

    /// Fraction of `max_speed` allowed on the vertical axis
    pub vertical_factor: f64,
}

impl MotionConfig {
    /// Nodes join the mesh standing still.
    pub fn stationary() -> Self {
        Self {
            max_speed: 0.0,
            vertical_factor: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(ConfigError::InvalidMotion(format!(
                "max speed must be finite and non-negative, got {}",
                self.max_speed
            )));
        }
        if !self.vertical_factor.is_finite() || self.vertical_factor < 0.0 {
            return Err(ConfigError::InvalidMotion(format!(
                "vertical factor must be finite and non-negative, got {}",
                self.vertical_factor
            )));
        }
        Ok(())
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            vertical_factor: 0.1,
        }
    }
}

/// Which protocol label an encounter record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterAttribution {
    /// Earliest protocol both nodes support, regardless of which one
    /// actually connected them
    #[default]
    SharedFirst,

    /// The protocol that won the connection tie-break
    Triggering,
}

/// Static configuration of a mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    pub bounds: WorldBounds,
    pub protocols: ProtocolTable,
    pub motion: MotionConfig,
    pub attribution: EncounterAttribution,
}

impl MeshConfig {
    pub fn with_bounds(mut self, bounds: WorldBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_attribution(mut self, attribution: EncounterAttribution) -> Self {
        self.attribution = attribution;
        self
    }

    pub fn with_protocols(mut self, protocols: ProtocolTable) -> Self {
        self.protocols = protocols;
        self
    }
}

/// A connection found during discovery, not yet logged.
struct PendingLink {
    initiator: usize,
    connection: Connection,
    peer_position: [f64; 3],
    label: CommunicationType,
}

/// The mesh: roster, world, clock, and the random source driving them.
pub struct Mesh<E: EntropySource> {
    nodes: Vec<Node>,
    config: MeshConfig,
    time: f64,
    tick: u64,
    entropy: E,
}

impl<E: EntropySource> Mesh<E> {
    /// Creates an empty mesh.
    pub fn new(config: MeshConfig, entropy: E) -> Result<Self, ConfigError> {
        config.motion.validate()?;
        config.protocols.validate()?;
        Ok(Self {
            nodes: Vec::new(),
            config,
            time: 0.0,
            tick: 0,
            entropy,
        })
    }

    /// Adds `node` with a random initial velocity and returns its id.
    ///
    /// Horizontal components are drawn from `±max_speed`, the vertical one
    /// from `±max_speed * vertical_factor`. The node is not repositioned.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, ConfigError> {
        let id = node.id();
        if self.nodes.iter().any(|n| n.id() == id) {
            return Err(ConfigError::DuplicateNode(id));
        }

        let speed = self.config.motion.max_speed;
        let vertical = speed * self.config.motion.vertical_factor;
        let velocity = Vector3::new(
            self.entropy.uniform(-speed, speed),
            self.entropy.uniform(-speed, speed),
            self.entropy.uniform(-vertical, vertical),
        );
        node.set_velocity(velocity);

        debug!(
            "Node {} joined at ({:.1}, {:.1}, {:.1}) with protocols {}",
            id,
            node.position().x,
            node.position().y,
            node.position().z,
            node.protocols()
        );
        self.nodes.push(node);
        Ok(id)
    }

    /// Advances the simulation by one tick of length `dt`.
    pub fn step(&mut self, dt: f64) -> Result<TickReport, ConfigError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(ConfigError::InvalidTimeStep(dt));
        }

        self.time += dt;
        self.tick += 1;

        // Motion and energy
        for node in self.nodes.iter_mut().filter(|n| !n.is_offline()) {
            node.advance(dt);
            node.reflect(&self.config.bounds);
            if let Some(transition) = node.drain(dt, &self.config.protocols, &mut self.entropy) {
                debug!(
                    "Node {} {} -> {} (battery={:.2})",
                    transition.node, transition.from, transition.to, transition.battery_level
                );
            }
        }

        // Connectivity, against post-drain state of every node
        let links = discover_links(&self.nodes, &self.config, &mut self.entropy);
        let mut connections = Vec::with_capacity(links.len());
        for link in links {
            trace!(
                "Link {} -> {} via {}",
                link.connection.source,
                link.connection.target,
                link.connection.protocol
            );
            self.nodes[link.initiator].record_encounter(Encounter {
                peer: link.connection.target,
                timestamp: self.time,
                peer_position: link.peer_position,
                protocol: link.label,
            });
            connections.push(link.connection);
        }

        let report = TickReport {
            tick: self.tick,
            time: self.time,
            active_nodes: self.count_in_state(NodeState::Active),
            intermittent_nodes: self.count_in_state(NodeState::Intermittent),
            offline_nodes: self.count_in_state(NodeState::Offline),
            connections,
            battery: BatterySummary::from_levels(self.nodes.iter().map(Node::battery_level)),
        };
        debug!("{}", report);

        Ok(report)
    }

    /// Roster in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Smallest id not yet used by any node.
    pub fn next_node_id(&self) -> NodeId {
        self.nodes
            .iter()
            .map(|n| n.id().get() + 1)
            .max()
            .map_or(NodeId(0), NodeId)
    }

    pub fn count_in_state(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state() == state).count()
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of ticks executed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.config.bounds
    }

    pub fn protocol_table(&self) -> &ProtocolTable {
        &self.config.protocols
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Seed of the random source (0 when unseeded).
    pub fn seed(&self) -> u64 {
        self.entropy.seed()
    }

    /// Captures the renderer-facing state of every node.
    pub fn snapshot(&self) -> MeshSnapshot {
        MeshSnapshot {
            tick: self.tick,
            time: self.time,
            bounds: self.config.bounds.extents(),
            nodes: self.nodes.iter().map(NodeSnapshot::from).collect(),
        }
    }
}

/// Finds this tick's connections: active initiators only, first protocol wins.
fn discover_links<E: EntropySource + ?Sized>(
    nodes: &[Node],
    config: &MeshConfig,
    entropy: &mut E,
) -> Vec<PendingLink> {
    let mut links = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        if node.state() != NodeState::Active {
            continue;
        }
        for (j, peer) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            let winner = CommunicationType::ALL
                .into_iter()
                .find(|p| node.can_communicate(peer, *p, &config.protocols, entropy));

            if let Some(protocol) = winner {
                let label = match config.attribution {
                    EncounterAttribution::SharedFirst => node
                        .protocols()
                        .first_shared(peer.protocols())
                        .unwrap_or(protocol),
                    EncounterAttribution::Triggering => protocol,
                };
                links.push(PendingLink {
                    initiator: i,
                    connection: Connection {
                        source: node.id(),
                        target: peer.id(),
                        protocol,
                    },
                    peer_position: peer.position().coords(),
                    label,
                });
            }
        }
    }

    links
}
