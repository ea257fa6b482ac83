//! Spatial value types: timestamped positions and world bounds.

use crate::error::ConfigError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A point in the world plus the simulated time it was last updated at.
///
/// `t` is bookkeeping, not a fourth coordinate: distances ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Simulated timestamp of the last update
    pub t: f64,
}

impl Position {
    /// Creates a position at time zero.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, t: 0.0 }
    }

    /// Creates a position stamped with time `t`.
    pub fn at(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    /// Returns the spatial part as a vector.
    pub fn spatial(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Returns `[x, y, z]`.
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Euclidean distance to `other`, ignoring timestamps.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.spatial() - other.spatial()).norm()
    }

    /// Moves by `velocity * dt` and advances the timestamp by `dt`.
    pub fn integrate(&mut self, velocity: &Vector3<f64>, dt: f64) {
        let next = self.spatial() + velocity * dt;
        self.x = next.x;
        self.y = next.y;
        self.z = next.z;
        self.t += dt;
    }
}

/// Extents of the simulated world; each axis spans `[0, extent]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct WorldBounds {
    extents: [f64; 3],
}

impl WorldBounds {
    /// Creates bounds, rejecting non-positive or non-finite extents.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, ConfigError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !(valid(x) && valid(y) && valid(z)) {
            return Err(ConfigError::InvalidBounds { x, y, z });
        }
        Ok(Self {
            extents: [x, y, z],
        })
    }

    /// Extent along `axis` (0 = x, 1 = y, 2 = z).
    pub fn extent(&self, axis: usize) -> f64 {
        self.extents[axis]
    }

    /// Returns `[x, y, z]` extents.
    pub fn extents(&self) -> [f64; 3] {
        self.extents
    }

    /// Whether the spatial part of `position` lies inside the bounds.
    pub fn contains(&self, position: &Position) -> bool {
        position
            .coords()
            .iter()
            .zip(self.extents.iter())
            .all(|(v, extent)| (0.0..=*extent).contains(v))
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            extents: [1000.0, 1000.0, 100.0],
        }
    }
}

impl TryFrom<[f64; 3]> for WorldBounds {
    type Error = ConfigError;

    fn try_from(extents: [f64; 3]) -> Result<Self, Self::Error> {
        Self::new(extents[0], extents[1], extents[2])
    }
}

impl From<WorldBounds> for [f64; 3] {
    fn from(bounds: WorldBounds) -> Self {
        bounds.extents
    }
}
