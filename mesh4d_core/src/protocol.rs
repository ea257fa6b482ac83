//! Communication protocols and their capability tables.
//!
//! Range and drain-rate data live in an immutable [`ProtocolTable`] owned by
//! the mesh rather than in shared global state, so two meshes can run with
//! different radio assumptions side by side.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// COMMUNICATION TYPE
// =============================================================================

/// A wireless protocol a node may support.
///
/// Declaration order is the connection tie-break order: when several
/// protocols would connect a pair, the earliest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommunicationType {
    /// Short range (~10 units)
    Ble,
    /// Mid range (~100 units)
    Wifi,
    /// Unlimited range, expensive
    Gps,
    /// Custom medium (e.g. audio), ~50 units
    Custom,
}

impl CommunicationType {
    /// All protocols in tie-break order.
    pub const ALL: [CommunicationType; 4] = [
        CommunicationType::Ble,
        CommunicationType::Wifi,
        CommunicationType::Gps,
        CommunicationType::Custom,
    ];

    /// Returns the protocol label.
    pub fn label(&self) -> &'static str {
        match self {
            CommunicationType::Ble => "BLE",
            CommunicationType::Wifi => "WIFI",
            CommunicationType::Gps => "GPS",
            CommunicationType::Custom => "CUSTOM",
        }
    }

    fn index(&self) -> usize {
        match self {
            CommunicationType::Ble => 0,
            CommunicationType::Wifi => 1,
            CommunicationType::Gps => 2,
            CommunicationType::Custom => 3,
        }
    }
}

impl std::fmt::Display for CommunicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for CommunicationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BLE" => Ok(CommunicationType::Ble),
            "WIFI" => Ok(CommunicationType::Wifi),
            "GPS" => Ok(CommunicationType::Gps),
            "CUSTOM" => Ok(CommunicationType::Custom),
            _ => Err(format!("Unknown protocol: {}", s)),
        }
    }
}

// =============================================================================
// PROTOCOL TABLE
// =============================================================================

/// Nominal characteristics of one protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtocolProfile {
    /// Nominal range in distance units (may be infinite)
    pub range: f64,

    /// Battery drained per unit of simulated time while supported
    pub drain_rate: f64,
}

impl ProtocolProfile {
    pub const fn new(range: f64, drain_rate: f64) -> Self {
        Self { range, drain_rate }
    }

    /// Ranges must be positive (infinity allowed); drain rates must be finite
    /// and non-negative.
    pub fn validate(&self, protocol: CommunicationType) -> Result<(), ConfigError> {
        if self.range.is_nan() || self.range <= 0.0 {
            return Err(ConfigError::InvalidProtocolProfile {
                protocol,
                reason: format!("range must be positive, got {}", self.range),
            });
        }
        if !self.drain_rate.is_finite() || self.drain_rate < 0.0 {
            return Err(ConfigError::InvalidProtocolProfile {
                protocol,
                reason: format!(
                    "drain rate must be finite and non-negative, got {}",
                    self.drain_rate
                ),
            });
        }
        Ok(())
    }
}

/// Immutable per-protocol range and drain-rate map.
///
/// Deserialization runs the same checks as [`ProtocolTable::with_profile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProtocolTable")]
pub struct ProtocolTable {
    profiles: [ProtocolProfile; 4],
}

/// Unchecked wire form of [`ProtocolTable`].
#[derive(Deserialize)]
struct RawProtocolTable {
    profiles: [ProtocolProfile; 4],
}

impl TryFrom<RawProtocolTable> for ProtocolTable {
    type Error = ConfigError;

    fn try_from(raw: RawProtocolTable) -> Result<Self, Self::Error> {
        let table = Self {
            profiles: raw.profiles,
        };
        table.validate()?;
        Ok(table)
    }
}

impl ProtocolTable {
    /// Returns a copy of the table with `protocol` reconfigured.
    pub fn with_profile(
        mut self,
        protocol: CommunicationType,
        profile: ProtocolProfile,
    ) -> Result<Self, ConfigError> {
        profile.validate(protocol)?;
        self.profiles[protocol.index()] = profile;
        Ok(self)
    }

    /// Checks every profile in the table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        CommunicationType::ALL
            .into_iter()
            .try_for_each(|protocol| self.profile(protocol).validate(protocol))
    }

    pub fn profile(&self, protocol: CommunicationType) -> ProtocolProfile {
        self.profiles[protocol.index()]
    }

    /// Nominal range of `protocol`.
    pub fn range(&self, protocol: CommunicationType) -> f64 {
        self.profile(protocol).range
    }

    /// Drain rate of `protocol`.
    pub fn drain_rate(&self, protocol: CommunicationType) -> f64 {
        self.profile(protocol).drain_rate
    }
}

impl Default for ProtocolTable {
    fn default() -> Self {
        Self {
            profiles: [
                ProtocolProfile::new(10.0, 0.01),
                ProtocolProfile::new(100.0, 0.05),
                ProtocolProfile::new(f64::INFINITY, 0.10),
                ProtocolProfile::new(50.0, 0.03),
            ],
        }
    }
}

// =============================================================================
// PROTOCOL SET
// =============================================================================

/// Non-empty set of protocols supported by a node, iterated in tie-break order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<CommunicationType>", into = "Vec<CommunicationType>")]
pub struct ProtocolSet(BTreeSet<CommunicationType>);

impl ProtocolSet {
    /// Builds a set, rejecting an empty one.
    pub fn new<I>(protocols: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = CommunicationType>,
    {
        let set: BTreeSet<_> = protocols.into_iter().collect();
        if set.is_empty() {
            return Err(ConfigError::EmptyProtocolSet);
        }
        Ok(Self(set))
    }

    /// A set holding exactly one protocol.
    pub fn single(protocol: CommunicationType) -> Self {
        Self(BTreeSet::from([protocol]))
    }

    /// A set holding every protocol.
    pub fn all() -> Self {
        Self(CommunicationType::ALL.into_iter().collect())
    }

    pub fn contains(&self, protocol: CommunicationType) -> bool {
        self.0.contains(&protocol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates protocols in tie-break order.
    pub fn iter(&self) -> impl Iterator<Item = CommunicationType> + '_ {
        self.0.iter().copied()
    }

    /// Protocols supported by both sets, in tie-break order.
    pub fn shared_with<'a>(
        &'a self,
        other: &'a ProtocolSet,
    ) -> impl Iterator<Item = CommunicationType> + 'a {
        self.0.intersection(&other.0).copied()
    }

    /// Earliest protocol (in tie-break order) both sets support.
    pub fn first_shared(&self, other: &ProtocolSet) -> Option<CommunicationType> {
        self.shared_with(other).next()
    }

    /// Combined drain rate of every protocol in the set.
    pub fn drain_rate(&self, table: &ProtocolTable) -> f64 {
        self.iter().map(|p| table.drain_rate(p)).sum()
    }
}

impl TryFrom<Vec<CommunicationType>> for ProtocolSet {
    type Error = ConfigError;

    fn try_from(protocols: Vec<CommunicationType>) -> Result<Self, Self::Error> {
        Self::new(protocols)
    }
}

impl From<ProtocolSet> for Vec<CommunicationType> {
    fn from(set: ProtocolSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl std::fmt::Display for ProtocolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.iter().map(|p| p.label()).collect();
        write!(f, "{{{}}}", labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_enumeration_order_is_tie_break_order() {
        let mut shuffled = vec![
            CommunicationType::Custom,
            CommunicationType::Ble,
            CommunicationType::Gps,
            CommunicationType::Wifi,
        ];
        shuffled.sort();
        assert_eq!(shuffled, CommunicationType::ALL.to_vec());
    }

    #[test]
    fn test_label_round_trip() {
        for protocol in CommunicationType::ALL {
            assert_eq!(protocol.label().parse::<CommunicationType>(), Ok(protocol));
        }
        assert_eq!("wifi".parse::<CommunicationType>(), Ok(CommunicationType::Wifi));
        assert!("lora".parse::<CommunicationType>().is_err());
    }

    #[test]
    fn test_default_table() {
        let table = ProtocolTable::default();

        assert_relative_eq!(table.range(CommunicationType::Ble), 10.0);
        assert_relative_eq!(table.range(CommunicationType::Wifi), 100.0);
        assert!(table.range(CommunicationType::Gps).is_infinite());
        assert_relative_eq!(table.range(CommunicationType::Custom), 50.0);

        assert_relative_eq!(table.drain_rate(CommunicationType::Ble), 0.01);
        assert_relative_eq!(table.drain_rate(CommunicationType::Wifi), 0.05);
        assert_relative_eq!(table.drain_rate(CommunicationType::Gps), 0.10);
        assert_relative_eq!(table.drain_rate(CommunicationType::Custom), 0.03);
    }

    #[test]
    fn test_with_profile_validates() {
        let table = ProtocolTable::default()
            .with_profile(CommunicationType::Ble, ProtocolProfile::new(25.0, 0.02))
            .unwrap();
        assert_relative_eq!(table.range(CommunicationType::Ble), 25.0);

        let bad_range = ProtocolTable::default()
            .with_profile(CommunicationType::Wifi, ProtocolProfile::new(0.0, 0.05));
        assert!(matches!(
            bad_range,
            Err(ConfigError::InvalidProtocolProfile { protocol: CommunicationType::Wifi, .. })
        ));

        let bad_rate = ProtocolTable::default()
            .with_profile(CommunicationType::Gps, ProtocolProfile::new(f64::INFINITY, -0.1));
        assert!(bad_rate.is_err());
    }

    #[test]
    fn test_deserialized_table_is_validated() {
        let json = r#"{"profiles": [
            {"range": 10.0, "drain_rate": -5.0},
            {"range": 100.0, "drain_rate": 0.05},
            {"range": 1e12, "drain_rate": 0.1},
            {"range": 50.0, "drain_rate": 0.03}
        ]}"#;
        let err = serde_json::from_str::<ProtocolTable>(json).unwrap_err();
        assert!(err.to_string().contains("drain rate"));

        let zero_range = json.replace("-5.0", "0.01").replace("\"range\": 50.0", "\"range\": 0.0");
        let err = serde_json::from_str::<ProtocolTable>(&zero_range).unwrap_err();
        assert!(err.to_string().contains("CUSTOM"));

        let valid = json.replace("-5.0", "0.01");
        let table: ProtocolTable = serde_json::from_str(&valid).unwrap();
        assert!(table.validate().is_ok());
        assert_relative_eq!(table.drain_rate(CommunicationType::Ble), 0.01);
    }

    #[test]
    fn test_protocol_set_rejects_empty() {
        assert_eq!(ProtocolSet::new(Vec::new()), Err(ConfigError::EmptyProtocolSet));

        let from_json: Result<ProtocolSet, _> = serde_json::from_str("[]");
        assert!(from_json.is_err());
    }

    #[test]
    fn test_protocol_set_dedups_and_orders() {
        let set = ProtocolSet::new([
            CommunicationType::Gps,
            CommunicationType::Ble,
            CommunicationType::Gps,
        ])
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![CommunicationType::Ble, CommunicationType::Gps]
        );
        assert_eq!(set.to_string(), "{BLE, GPS}");
    }

    #[test]
    fn test_shared_protocols() {
        let a = ProtocolSet::new([CommunicationType::Wifi, CommunicationType::Custom]).unwrap();
        let b = ProtocolSet::new([
            CommunicationType::Custom,
            CommunicationType::Wifi,
            CommunicationType::Ble,
        ])
        .unwrap();
        let c = ProtocolSet::single(CommunicationType::Gps);

        assert_eq!(a.first_shared(&b), Some(CommunicationType::Wifi));
        assert_eq!(a.shared_with(&b).count(), 2);
        assert_eq!(a.first_shared(&c), None);
    }

    #[test]
    fn test_drain_rate_sum() {
        let table = ProtocolTable::default();

        assert_relative_eq!(ProtocolSet::all().drain_rate(&table), 0.19, epsilon = 1e-12);
        assert_relative_eq!(ProtocolSet::single(CommunicationType::Gps).drain_rate(&table), 0.1);
    }
}
