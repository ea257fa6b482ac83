//! Run configuration: defaults, JSON loading, validation.

use crate::error::SimError;
use mesh4d_core::{
    CommunicationType, ConfigError, EncounterAttribution, MeshConfig, MotionConfig,
    ProtocolTable, WorldBounds,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Probability that a generated node supports each optional protocol.
///
/// BLE is not listed: every generated node carries it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolOdds {
    pub wifi: f64,
    pub gps: f64,
    pub custom: f64,
}

impl ProtocolOdds {
    /// Protocols drawn per node, in tie-break order.
    pub const OPTIONAL: [CommunicationType; 3] = [
        CommunicationType::Wifi,
        CommunicationType::Gps,
        CommunicationType::Custom,
    ];

    /// Probability for `protocol`. Always 1 for BLE.
    pub fn odds(&self, protocol: CommunicationType) -> f64 {
        match protocol {
            CommunicationType::Ble => 1.0,
            CommunicationType::Wifi => self.wifi,
            CommunicationType::Gps => self.gps,
            CommunicationType::Custom => self.custom,
        }
    }

    /// Every node supports every protocol.
    pub fn universal() -> Self {
        Self {
            wifi: 1.0,
            gps: 1.0,
            custom: 1.0,
        }
    }

    /// Nodes carry BLE alone.
    pub fn ble_only() -> Self {
        Self {
            wifi: 0.0,
            gps: 0.0,
            custom: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        for protocol in Self::OPTIONAL {
            let value = self.odds(protocol);
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidProbability { protocol, value });
            }
        }
        Ok(())
    }
}

impl Default for ProtocolOdds {
    fn default() -> Self {
        Self {
            wifi: 0.7,
            gps: 0.3,
            custom: 0.2,
        }
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of nodes to generate
    pub num_nodes: usize,

    /// World extents [x, y, z]
    pub bounds: [f64; 3],

    /// Number of ticks to run
    pub steps: u64,

    /// Tick duration in simulated time units
    pub dt: f64,

    /// Optional-protocol probabilities for generated nodes
    pub protocol_odds: ProtocolOdds,

    /// Horizontal speed limit for initial velocities
    pub max_speed: f64,

    /// Battery level generated nodes start with
    pub initial_battery: f64,

    /// Protocol label policy for encounter records
    pub attribution: EncounterAttribution,

    /// Log the tick summary every N ticks (0 = never)
    pub log_every: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_nodes: 20,
            bounds: [200.0, 200.0, 50.0],
            steps: 100,
            dt: 1.0,
            protocol_odds: ProtocolOdds::default(),
            max_speed: 5.0,
            initial_battery: 100.0,
            attribution: EncounterAttribution::SharedFirst,
            log_every: 1,
        }
    }
}

impl SimConfig {
    /// Loads and validates a JSON config file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SimError::io(path.display().to_string(), e))?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(text: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects any value the engine or the generator cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        self.world_bounds()?;
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(ConfigError::InvalidTimeStep(self.dt).into());
        }
        if !(0.0..=100.0).contains(&self.initial_battery) {
            return Err(ConfigError::InvalidBattery(self.initial_battery).into());
        }
        self.motion().validate()?;
        self.protocol_odds.validate()?;
        Ok(())
    }

    pub fn world_bounds(&self) -> Result<WorldBounds, ConfigError> {
        let [x, y, z] = self.bounds;
        WorldBounds::new(x, y, z)
    }

    pub fn motion(&self) -> MotionConfig {
        MotionConfig {
            max_speed: self.max_speed,
            ..MotionConfig::default()
        }
    }

    /// Engine configuration derived from this run configuration.
    pub fn mesh_config(&self) -> Result<MeshConfig, ConfigError> {
        Ok(MeshConfig::default()
            .with_bounds(self.world_bounds()?)
            .with_protocols(ProtocolTable::default())
            .with_motion(self.motion())
            .with_attribution(self.attribution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.num_nodes, 20);
        assert_eq!(config.bounds, [200.0, 200.0, 50.0]);
        assert_eq!(config.protocol_odds.odds(CommunicationType::Wifi), 0.7);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json_str(
            r#"{"seed": 7, "num_nodes": 5, "protocol_odds": {"gps": 0.0}}"#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.num_nodes, 5);
        assert_eq!(config.steps, 100);
        assert_eq!(config.protocol_odds.gps, 0.0);
        assert_eq!(config.protocol_odds.wifi, 0.7);
    }

    #[test]
    fn test_attribution_parses_snake_case() {
        let config = SimConfig::from_json_str(r#"{"attribution": "triggering"}"#).unwrap();
        assert_eq!(config.attribution, EncounterAttribution::Triggering);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_bounds = SimConfig::from_json_str(r#"{"bounds": [100.0, 0.0, 10.0]}"#);
        assert!(matches!(
            bad_bounds,
            Err(SimError::Config(ConfigError::InvalidBounds { .. }))
        ));

        let bad_dt = SimConfig::from_json_str(r#"{"dt": -1.0}"#);
        assert!(matches!(
            bad_dt,
            Err(SimError::Config(ConfigError::InvalidTimeStep(_)))
        ));

        let bad_odds = SimConfig::from_json_str(r#"{"protocol_odds": {"custom": 1.5}}"#);
        assert!(matches!(
            bad_odds,
            Err(SimError::InvalidProbability {
                protocol: CommunicationType::Custom,
                ..
            })
        ));

        let negative_steps = SimConfig::from_json_str(r#"{"steps": -3}"#);
        assert!(matches!(negative_steps, Err(SimError::Json(_))));
    }

    #[test]
    fn test_ble_odds_cannot_be_configured() {
        let result = SimConfig::from_json_str(
            r#"{"seed": 3, "num_nodes": 40, "protocol_odds": {"ble": 0.5}}"#,
        );

        assert!(matches!(result, Err(SimError::Json(_))));
        assert_eq!(ProtocolOdds::ble_only().odds(CommunicationType::Ble), 1.0);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SimConfig::from_json_file("/nonexistent/mesh4d.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/mesh4d.json"));
    }

    #[test]
    fn test_mesh_config_carries_settings() {
        let config = SimConfig {
            max_speed: 2.0,
            attribution: EncounterAttribution::Triggering,
            ..Default::default()
        };

        let mesh_config = config.mesh_config().unwrap();

        assert_eq!(mesh_config.motion.max_speed, 2.0);
        assert_eq!(mesh_config.bounds.extents(), [200.0, 200.0, 50.0]);
        assert_eq!(mesh_config.attribution, EncounterAttribution::Triggering);
    }
}
