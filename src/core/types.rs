//! Core type definitions used throughout the codebase

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Simulation time in seconds
pub type Seconds = f64;

/// Stable identifier for a unit across phase boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Position and heading of a unit in simulation space
///
/// Rotation is in radians, 0 facing +x, counter-clockwise positive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec2,
    pub rotation: f64,
}

impl Pose {
    pub fn new(position: DVec2, rotation: f64) -> Self {
        Self { position, rotation }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}
