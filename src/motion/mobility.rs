//! Per-unit kinematic limits

use serde::{Deserialize, Serialize};

use crate::motion::planner::PlanError;

/// Kinematic capability limits of a unit
///
/// Linear values are in simulation units per second (squared), angular
/// values in radians per second (squared). Every field must be finite
/// and non-negative; a zero bound makes motion along that axis
/// unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MobilityProfile {
    pub max_linear_velocity: f64,
    pub max_linear_acceleration: f64,
    pub max_angular_velocity: f64,
    pub max_angular_acceleration: f64,
}

impl MobilityProfile {
    pub fn new(
        max_linear_velocity: f64,
        max_linear_acceleration: f64,
        max_angular_velocity: f64,
        max_angular_acceleration: f64,
    ) -> Self {
        Self {
            max_linear_velocity,
            max_linear_acceleration,
            max_angular_velocity,
            max_angular_acceleration,
        }
    }

    /// Profile that can only turn in place
    pub fn rotation_only(max_angular_velocity: f64, max_angular_acceleration: f64) -> Self {
        Self::new(0.0, 0.0, max_angular_velocity, max_angular_acceleration)
    }

    /// Reject negative, NaN or infinite bounds
    pub fn validate(&self) -> Result<(), PlanError> {
        let fields = [
            ("max_linear_velocity", self.max_linear_velocity),
            ("max_linear_acceleration", self.max_linear_acceleration),
            ("max_angular_velocity", self.max_angular_velocity),
            ("max_angular_acceleration", self.max_angular_acceleration),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PlanError::InvalidMobility { field, value });
            }
        }
        Ok(())
    }

    /// Can this profile translate at all?
    pub fn can_translate(&self) -> bool {
        self.max_linear_velocity > 0.0 && self.max_linear_acceleration > 0.0
    }

    /// Can this profile rotate at all?
    pub fn can_rotate(&self) -> bool {
        self.max_angular_velocity > 0.0 && self.max_angular_acceleration > 0.0
    }
}
