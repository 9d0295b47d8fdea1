//! Instantaneous kinematic state and angle helpers

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::core::types::Pose;

/// Wrap an angle into [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negatives up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest turn from `from` to `to`, in (−π, π]
pub fn shortest_angle_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        delta - TAU
    } else {
        delta
    }
}

/// Heading of a direction vector in [0, 2π)
pub fn direction_angle(direction: DVec2) -> f64 {
    normalize_angle(direction.y.atan2(direction.x))
}

/// Interpolate between two headings along the shorter arc
pub fn lerp_angle(from: f64, to: f64, fraction: f64) -> f64 {
    normalize_angle(from + shortest_angle_delta(from, to) * fraction)
}

/// Exact physical state of a unit at one instant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementState {
    pub position: DVec2,
    /// Radians; may be unwrapped, see `heading`
    pub rotation: f64,
    pub velocity: DVec2,
    pub rot_velocity: f64,
}

impl MovementState {
    pub fn new(position: DVec2, rotation: f64, velocity: DVec2, rot_velocity: f64) -> Self {
        Self {
            position,
            rotation,
            velocity,
            rot_velocity,
        }
    }

    /// A stationary state
    pub fn at_rest(position: DVec2, rotation: f64) -> Self {
        Self::new(position, rotation, DVec2::ZERO, 0.0)
    }

    pub fn from_pose(pose: Pose) -> Self {
        Self::at_rest(pose.position, pose.rotation)
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.heading())
    }

    /// Rotation normalized into [0, 2π)
    pub fn heading(&self) -> f64 {
        normalize_angle(self.rotation)
    }

    /// Blend two states; rotation follows the shorter arc
    pub fn interpolate(&self, other: &MovementState, fraction: f64) -> MovementState {
        MovementState {
            position: self.position.lerp(other.position, fraction),
            rotation: lerp_angle(self.rotation, other.rotation, fraction),
            velocity: self.velocity.lerp(other.velocity, fraction),
            rot_velocity: self.rot_velocity + (other.rot_velocity - self.rot_velocity) * fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_normalize_wraps_negative() {
        assert!((normalize_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < EPS);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < EPS);
        assert_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_normalize_never_returns_tau() {
        let tiny = -1e-18;
        let wrapped = normalize_angle(tiny);
        assert!(wrapped < TAU);
        assert!(wrapped >= 0.0);
    }

    #[test]
    fn test_shortest_delta_range() {
        assert!((shortest_angle_delta(0.0, 3.0 * PI / 2.0) + PI / 2.0).abs() < EPS);
        assert!((shortest_angle_delta(3.0 * PI / 2.0, 0.0) - PI / 2.0).abs() < EPS);
        // Half turn resolves to +π, never −π
        assert!((shortest_angle_delta(0.0, PI) - PI).abs() < EPS);
        assert!((shortest_angle_delta(PI, 0.0) - PI).abs() < EPS);
    }

    #[test]
    fn test_direction_angle() {
        assert!((direction_angle(DVec2::new(0.0, 1.0)) - PI / 2.0).abs() < EPS);
        assert!((direction_angle(DVec2::new(0.0, -1.0)) - 3.0 * PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_interpolate_crosses_zero() {
        let a = MovementState::at_rest(DVec2::ZERO, TAU - 0.1);
        let b = MovementState::at_rest(DVec2::new(2.0, 0.0), 0.1);
        let mid = a.interpolate(&b, 0.5);
        assert!(mid.rotation.abs() < EPS || (mid.rotation - TAU).abs() < EPS);
        assert_eq!(mid.position, DVec2::new(1.0, 0.0));
    }

    #[test]
    fn test_pose_uses_heading() {
        let state = MovementState::at_rest(DVec2::new(3.0, 4.0), -PI);
        let pose = state.pose();
        assert!((pose.rotation - PI).abs() < EPS);
        assert_eq!(state.velocity, DVec2::ZERO);
    }
}
