//! Named run presets.

use crate::config::{ProtocolOdds, SimConfig};
use crate::error::SimError;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// 20 mixed-protocol nodes in a 200x200x50 world
    Baseline,

    /// 40 nodes spread over a 1000x1000x100 field
    OpenField,

    /// 60 nodes packed into 50x50x10
    DenseSwarm,

    /// Baseline world, BLE radios only
    BleOnly,

    /// Nodes start at 15% battery with every radio on
    Brownout,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::OpenField,
            ScenarioId::DenseSwarm,
            ScenarioId::BleOnly,
            ScenarioId::Brownout,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::OpenField => "open_field",
            ScenarioId::DenseSwarm => "dense_swarm",
            ScenarioId::BleOnly => "ble_only",
            ScenarioId::Brownout => "brownout",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "20 nodes, 200x200x50 world, mixed protocols, 100 steps",
            ScenarioId::OpenField => "40 nodes over 1000x1000x100, long-range links dominate",
            ScenarioId::DenseSwarm => "60 nodes in 50x50x10, BLE saturates the mesh",
            ScenarioId::BleOnly => "20 BLE-only nodes, reachability from short range alone",
            ScenarioId::Brownout => "30 nodes at 15% battery, all radios, 400 steps to blackout",
        }
    }

    /// Builds the run configuration for this scenario.
    pub fn config(&self, seed: u64) -> SimConfig {
        let base = SimConfig {
            seed,
            ..SimConfig::default()
        };
        match self {
            ScenarioId::Baseline => base,
            ScenarioId::OpenField => SimConfig {
                num_nodes: 40,
                bounds: [1000.0, 1000.0, 100.0],
                ..base
            },
            ScenarioId::DenseSwarm => SimConfig {
                num_nodes: 60,
                bounds: [50.0, 50.0, 10.0],
                max_speed: 2.0,
                ..base
            },
            ScenarioId::BleOnly => SimConfig {
                protocol_odds: ProtocolOdds::ble_only(),
                ..base
            },
            ScenarioId::Brownout => SimConfig {
                num_nodes: 30,
                steps: 400,
                initial_battery: 15.0,
                protocol_odds: ProtocolOdds::universal(),
                log_every: 20,
                ..base
            },
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "default" => Ok(ScenarioId::Baseline),
            "open_field" | "openfield" => Ok(ScenarioId::OpenField),
            "dense_swarm" | "denseswarm" | "dense" => Ok(ScenarioId::DenseSwarm),
            "ble_only" | "bleonly" | "ble" => Ok(ScenarioId::BleOnly),
            "brownout" => Ok(ScenarioId::Brownout),
            _ => Err(SimError::UnknownScenario(s.to_string())),
        }
    }
}
