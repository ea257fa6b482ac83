//! The Node entity: motion, energy drain, and the reachability test.
//!
//! # State machine
//!
//! ```text
//!   ACTIVE ──(battery < 20, p = 0.3 per tick)──► INTERMITTENT
//!     │                                              │
//!     └──────────────(battery == 0)──────────────────┴──► OFFLINE (terminal)
//! ```
//!
//! There is no charging path, so every transition is one-way.

use crate::error::ConfigError;
use crate::position::{Position, WorldBounds};
use crate::protocol::{CommunicationType, ProtocolSet, ProtocolTable};
use mesh4d_env::{EntropySource, NodeId};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Battery level of a fresh node.
pub const FULL_BATTERY: f64 = 100.0;

/// Below this level an active node may start dropping out.
pub const LOW_BATTERY_THRESHOLD: f64 = 20.0;

/// Per-tick chance that a low-battery active node turns intermittent.
pub const INTERMITTENT_ONSET_PROBABILITY: f64 = 0.3;

/// Chance that a link attempt involving an intermittent node fails outright.
pub const INTERMITTENT_FAILURE_PROBABILITY: f64 = 0.7;

/// Multiplicative jitter applied to every drain.
pub const DRAIN_JITTER: (f64, f64) = (0.8, 1.2);

/// Multiplicative jitter applied to nominal range on every attempt.
pub const RANGE_JITTER: (f64, f64) = (0.9, 1.1);

/// Connectivity state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeState {
    #[default]
    Active,
    Offline,
    Intermittent,
}

impl NodeState {
    pub fn label(&self) -> &'static str {
        match self {
            NodeState::Active => "ACTIVE",
            NodeState::Offline => "OFFLINE",
            NodeState::Intermittent => "INTERMITTENT",
        }
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A state change produced by [`Node::drain`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateTransition {
    pub node: NodeId,
    pub from: NodeState,
    pub to: NodeState,
    /// Battery level right after the drain that caused the change
    pub battery_level: f64,
}

/// A successful connection, from the initiating node's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    /// Peer the connection was made to
    pub peer: NodeId,

    /// Simulation time of the tick the connection happened in
    pub timestamp: f64,

    /// Peer position [x, y, z] at that time
    pub peer_position: [f64; 3],

    /// Protocol label recorded for the encounter
    pub protocol: CommunicationType,
}

/// A mobile, battery-powered mesh node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    position: Position,
    velocity: Vector3<f64>,
    state: NodeState,
    battery_level: f64,
    protocols: ProtocolSet,
    encounters: Vec<Encounter>,
}

impl Node {
    /// Creates an active, fully charged, stationary node.
    pub fn new(id: NodeId, position: Position, protocols: ProtocolSet) -> Self {
        Self {
            id,
            position,
            velocity: Vector3::zeros(),
            state: NodeState::Active,
            battery_level: FULL_BATTERY,
            protocols,
            encounters: Vec::new(),
        }
    }

    /// Sets the starting battery level.
    ///
    /// A node starting at 0 starts offline.
    pub fn with_battery(mut self, level: f64) -> Result<Self, ConfigError> {
        if !(0.0..=FULL_BATTERY).contains(&level) {
            return Err(ConfigError::InvalidBattery(level));
        }
        self.battery_level = level;
        if level == 0.0 {
            self.state = NodeState::Offline;
        }
        Ok(self)
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the starting state.
    ///
    /// OFFLINE is reached only through an empty battery, so it is rejected on
    /// a charged node, as is any other state on an empty one.
    pub fn with_state(mut self, state: NodeState) -> Result<Self, ConfigError> {
        if (state == NodeState::Offline) != (self.battery_level == 0.0) {
            return Err(ConfigError::InvalidState {
                state,
                battery: self.battery_level,
            });
        }
        self.state = state;
        Ok(self)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn velocity(&self) -> &Vector3<f64> {
        &self.velocity
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn battery_level(&self) -> f64 {
        self.battery_level
    }

    pub fn protocols(&self) -> &ProtocolSet {
        &self.protocols
    }

    pub fn encounters(&self) -> &[Encounter] {
        &self.encounters
    }

    pub fn is_offline(&self) -> bool {
        self.state == NodeState::Offline
    }

    pub(crate) fn set_velocity(&mut self, velocity: Vector3<f64>) {
        self.velocity = velocity;
    }

    /// Euler step: `position += velocity * dt`. Offline nodes are frozen.
    pub fn advance(&mut self, dt: f64) {
        if self.is_offline() {
            return;
        }
        self.position.integrate(&self.velocity, dt);
    }

    /// Negates each velocity component whose axis is out of bounds.
    ///
    /// Position is left where it is, so an overshooting node sits outside
    /// the world for one tick and walks back in on the next.
    pub fn reflect(&mut self, bounds: &WorldBounds) {
        if self.is_offline() {
            return;
        }
        let coords = self.position.coords();
        for (axis, value) in coords.iter().enumerate() {
            if *value < 0.0 || *value > bounds.extent(axis) {
                self.velocity[axis] = -self.velocity[axis];
            }
        }
    }

    /// Drains battery for `dt` of protocol usage and applies state changes.
    ///
    /// Consumes one sample for the drain jitter, plus one for the
    /// intermittent roll when an active node is below the low threshold.
    pub fn drain<E: EntropySource + ?Sized>(
        &mut self,
        dt: f64,
        table: &ProtocolTable,
        entropy: &mut E,
    ) -> Option<StateTransition> {
        if self.is_offline() {
            return None;
        }

        let drain = self.protocols.drain_rate(table) * dt;
        let actual = drain * entropy.uniform(DRAIN_JITTER.0, DRAIN_JITTER.1);
        self.battery_level = (self.battery_level - actual).max(0.0);

        let from = self.state;
        if self.battery_level == 0.0 {
            self.state = NodeState::Offline;
        } else if self.battery_level < LOW_BATTERY_THRESHOLD
            && self.state == NodeState::Active
            && entropy.chance(INTERMITTENT_ONSET_PROBABILITY)
        {
            self.state = NodeState::Intermittent;
        }

        (from != self.state).then_some(StateTransition {
            node: self.id,
            from,
            to: self.state,
            battery_level: self.battery_level,
        })
    }

    /// Whether this node reaches `other` over `protocol` this tick.
    ///
    /// Missing protocol support or an offline endpoint fails without
    /// consuming randomness. An intermittent endpoint costs one sample (the
    /// fault roll); a range check costs one more (the range jitter).
    pub fn can_communicate<E: EntropySource + ?Sized>(
        &self,
        other: &Node,
        protocol: CommunicationType,
        table: &ProtocolTable,
        entropy: &mut E,
    ) -> bool {
        if !self.protocols.contains(protocol)
            || !other.protocols.contains(protocol)
            || self.is_offline()
            || other.is_offline()
        {
            return false;
        }

        // Sporadic connectivity
        if (self.state == NodeState::Intermittent || other.state == NodeState::Intermittent)
            && entropy.chance(INTERMITTENT_FAILURE_PROBABILITY)
        {
            return false;
        }

        let distance = self.position.distance_to(&other.position);
        let effective_range =
            table.range(protocol) * entropy.uniform(RANGE_JITTER.0, RANGE_JITTER.1);
        distance <= effective_range
    }

    pub fn record_encounter(&mut self, encounter: Encounter) {
        self.encounters.push(encounter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh4d_env::ScriptedEntropy;

    fn ble_node(id: u64, x: f64) -> Node {
        Node::new(
            NodeId(id),
            Position::new(x, 0.0, 0.0),
            ProtocolSet::single(CommunicationType::Ble),
        )
    }

    fn scripted(samples: &[f64]) -> ScriptedEntropy {
        ScriptedEntropy::new(samples.to_vec()).unwrap()
    }

    #[test]
    fn test_new_node_defaults() {
        let node = ble_node(3, 1.0);

        assert_eq!(node.id(), NodeId(3));
        assert_eq!(node.state(), NodeState::Active);
        assert_relative_eq!(node.battery_level(), 100.0);
        assert_eq!(node.velocity(), &Vector3::zeros());
        assert!(node.encounters().is_empty());
    }

    #[test]
    fn test_with_battery_validation() {
        assert_eq!(
            ble_node(0, 0.0).with_battery(120.0).unwrap_err(),
            ConfigError::InvalidBattery(120.0)
        );
        assert!(ble_node(0, 0.0).with_battery(-0.5).is_err());

        let empty = ble_node(0, 0.0).with_battery(0.0).unwrap();
        assert_eq!(empty.state(), NodeState::Offline);

        assert!(empty.clone().with_state(NodeState::Active).is_err());
        assert_eq!(
            empty.with_state(NodeState::Offline).unwrap().state(),
            NodeState::Offline
        );
    }

    #[test]
    fn test_charged_node_cannot_start_offline() {
        let err = ble_node(0, 0.0)
            .with_battery(60.0)
            .unwrap()
            .with_state(NodeState::Offline)
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::InvalidState {
                state: NodeState::Offline,
                battery: 60.0
            }
        );
    }

    #[test]
    fn test_drain_to_empty_goes_offline() {
        let table = ProtocolTable::default();
        let mut node = Node::new(
            NodeId(0),
            Position::default(),
            ProtocolSet::single(CommunicationType::Gps),
        )
        .with_battery(0.05)
        .unwrap();
        // Lowest jitter: 0.1 * 0.8 = 0.08 > 0.05
        let mut entropy = scripted(&[0.0]);

        let transition = node.drain(1.0, &table, &mut entropy).unwrap();

        assert_eq!(node.battery_level(), 0.0);
        assert_eq!(node.state(), NodeState::Offline);
        assert_eq!(transition.from, NodeState::Active);
        assert_eq!(transition.to, NodeState::Offline);
        assert_eq!(entropy.draws(), 1);
    }

    #[test]
    fn test_drain_applies_jitter() {
        let table = ProtocolTable::default();
        let mut node = Node::new(NodeId(0), Position::default(), ProtocolSet::all());
        // 0.8 + 0.4 * 0.75 = 1.1
        let mut entropy = scripted(&[0.75]);

        assert!(node.drain(10.0, &table, &mut entropy).is_none());
        assert_relative_eq!(node.battery_level(), 100.0 - 0.19 * 10.0 * 1.1, epsilon = 1e-9);
    }

    #[test]
    fn test_low_battery_roll_succeeds() {
        let table = ProtocolTable::default();
        let mut node = ble_node(1, 0.0).with_battery(20.0).unwrap();
        let mut entropy = scripted(&[0.5, 0.1]);

        let transition = node.drain(1.0, &table, &mut entropy);

        assert_eq!(node.state(), NodeState::Intermittent);
        assert_eq!(transition.map(|t| t.to), Some(NodeState::Intermittent));
        assert_eq!(entropy.draws(), 2);
    }

    #[test]
    fn test_low_battery_roll_fails() {
        let table = ProtocolTable::default();
        let mut node = ble_node(1, 0.0).with_battery(20.0).unwrap();
        let mut entropy = scripted(&[0.5, 0.9]);

        assert!(node.drain(1.0, &table, &mut entropy).is_none());
        assert_eq!(node.state(), NodeState::Active);
        assert!(node.battery_level() < LOW_BATTERY_THRESHOLD);
    }

    #[test]
    fn test_intermittent_never_reverts() {
        let table = ProtocolTable::default();
        let mut node = ble_node(1, 0.0)
            .with_battery(80.0)
            .unwrap()
            .with_state(NodeState::Intermittent)
            .unwrap();
        let mut entropy = scripted(&[0.5]);

        for _ in 0..10 {
            node.drain(1.0, &table, &mut entropy);
        }
        assert_eq!(node.state(), NodeState::Intermittent);
        // No roll is taken for a node that is already intermittent
        assert_eq!(entropy.draws(), 10);
    }

    #[test]
    fn test_offline_node_is_frozen() {
        let table = ProtocolTable::default();
        let bounds = WorldBounds::new(10.0, 10.0, 10.0).unwrap();
        let mut node = ble_node(1, 5.0)
            .with_velocity(Vector3::new(1.0, 1.0, 1.0))
            .with_battery(0.0)
            .unwrap();
        let mut entropy = scripted(&[0.5]);

        node.advance(1.0);
        node.reflect(&bounds);
        assert!(node.drain(1.0, &table, &mut entropy).is_none());

        assert_eq!(node.position(), &Position::new(5.0, 0.0, 0.0));
        assert_eq!(node.battery_level(), 0.0);
        assert_eq!(entropy.draws(), 0);
    }

    #[test]
    fn test_reflection_does_not_clamp() {
        let bounds = WorldBounds::new(10.0, 10.0, 10.0).unwrap();
        let mut node = ble_node(1, 9.5).with_velocity(Vector3::new(1.0, 0.0, 0.0));

        node.advance(1.0);
        node.reflect(&bounds);
        assert_relative_eq!(node.position().x, 10.5);
        assert_relative_eq!(node.velocity().x, -1.0);
        assert_relative_eq!(node.position().t, 1.0);

        node.advance(1.0);
        node.reflect(&bounds);
        assert_relative_eq!(node.position().x, 9.5);
        assert_relative_eq!(node.velocity().x, -1.0);
    }

    #[test]
    fn test_reflection_per_axis() {
        let bounds = WorldBounds::new(10.0, 10.0, 10.0).unwrap();
        let mut node = Node::new(
            NodeId(0),
            Position::new(5.0, -0.5, 10.5),
            ProtocolSet::single(CommunicationType::Ble),
        )
        .with_velocity(Vector3::new(1.0, -2.0, 3.0));

        node.reflect(&bounds);

        assert_eq!(node.velocity(), &Vector3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn test_can_communicate_requires_shared_protocol() {
        let table = ProtocolTable::default();
        let a = ble_node(0, 0.0);
        let b = Node::new(
            NodeId(1),
            Position::new(1.0, 0.0, 0.0),
            ProtocolSet::single(CommunicationType::Wifi),
        );
        let mut entropy = scripted(&[0.5]);

        assert!(!a.can_communicate(&b, CommunicationType::Ble, &table, &mut entropy));
        assert!(!a.can_communicate(&b, CommunicationType::Wifi, &table, &mut entropy));
        assert_eq!(entropy.draws(), 0);
    }

    #[test]
    fn test_can_communicate_rejects_offline() {
        let table = ProtocolTable::default();
        let a = ble_node(0, 0.0);
        let b = ble_node(1, 1.0).with_battery(0.0).unwrap();
        let mut entropy = scripted(&[0.5]);

        assert!(!a.can_communicate(&b, CommunicationType::Ble, &table, &mut entropy));
        assert!(!b.can_communicate(&a, CommunicationType::Ble, &table, &mut entropy));
        assert_eq!(entropy.draws(), 0);
    }

    #[test]
    fn test_range_jitter_bounds() {
        let table = ProtocolTable::default();
        let a = ble_node(0, 0.0);
        let near = ble_node(1, 8.9);
        let far = ble_node(2, 11.01);

        // Lowest jitter: effective range 9.0
        let mut low = scripted(&[0.0]);
        assert!(a.can_communicate(&near, CommunicationType::Ble, &table, &mut low));

        // Highest jitter still falls short of 11.01
        let mut high = scripted(&[0.999_999]);
        assert!(!a.can_communicate(&far, CommunicationType::Ble, &table, &mut high));
    }

    #[test]
    fn test_intermittent_fault_roll() {
        let table = ProtocolTable::default();
        let a = ble_node(0, 0.0);
        let b = ble_node(1, 1.0)
            .with_state(NodeState::Intermittent)
            .unwrap();

        // 0.5 < 0.7: fault, range never checked
        let mut faulty = scripted(&[0.5]);
        assert!(!a.can_communicate(&b, CommunicationType::Ble, &table, &mut faulty));
        assert_eq!(faulty.draws(), 1);

        // 0.8 survives the fault roll, then range jitter
        let mut lucky = scripted(&[0.8, 0.5]);
        assert!(b.can_communicate(&a, CommunicationType::Ble, &table, &mut lucky));
        assert_eq!(lucky.draws(), 2);
    }

    #[test]
    fn test_gps_has_unbounded_range() {
        let table = ProtocolTable::default();
        let gps = ProtocolSet::single(CommunicationType::Gps);
        let a = Node::new(NodeId(0), Position::new(0.0, 0.0, 0.0), gps.clone());
        let b = Node::new(NodeId(1), Position::new(1.0e9, 1.0e9, 1.0e9), gps);
        let mut entropy = scripted(&[0.0]);

        assert!(a.can_communicate(&b, CommunicationType::Gps, &table, &mut entropy));
    }

    #[test]
    fn test_record_encounter() {
        let mut node = ble_node(0, 0.0);
        node.record_encounter(Encounter {
            peer: NodeId(4),
            timestamp: 2.0,
            peer_position: [1.0, 2.0, 3.0],
            protocol: CommunicationType::Ble,
        });

        assert_eq!(node.encounters().len(), 1);
        assert_eq!(node.encounters()[0].peer, NodeId(4));
    }
}
