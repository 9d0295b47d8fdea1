//! Bounded-acceleration motion law along one axis
//!
//! Accelerate at the bound until the velocity cap (trapezoid) or the
//! midpoint (triangle), cruise, then decelerate symmetrically to stop
//! exactly on the target. Evaluated in closed form so the terminal state
//! carries no integration drift.

/// Velocity profile covering a non-negative distance from rest to rest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedProfile {
    distance: f64,
    acceleration: f64,
    peak_velocity: f64,
    accel_time: f64,
    cruise_time: f64,
    duration: f64,
}

impl BoundedProfile {
    /// A profile that does not move
    pub fn stationary() -> Self {
        Self {
            distance: 0.0,
            acceleration: 0.0,
            peak_velocity: 0.0,
            accel_time: 0.0,
            cruise_time: 0.0,
            duration: 0.0,
        }
    }

    /// Build the profile for `distance`, or None if a zero bound makes it
    /// unreachable
    pub fn new(distance: f64, max_velocity: f64, max_acceleration: f64) -> Option<Self> {
        let distance = distance.abs();
        if distance == 0.0 {
            return Some(Self::stationary());
        }
        if max_velocity <= 0.0 || max_acceleration <= 0.0 {
            return None;
        }

        // Distance spent reaching the cap and stopping again
        let ramp_distance = max_velocity * max_velocity / max_acceleration;

        let (peak_velocity, cruise_time) = if ramp_distance >= distance {
            ((max_acceleration * distance).sqrt(), 0.0)
        } else {
            (max_velocity, (distance - ramp_distance) / max_velocity)
        };
        let accel_time = peak_velocity / max_acceleration;

        Some(Self {
            distance,
            acceleration: max_acceleration,
            peak_velocity,
            accel_time,
            cruise_time,
            duration: 2.0 * accel_time + cruise_time,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Distance covered at time `t` (clamped to the profile)
    pub fn position_at(&self, t: f64) -> f64 {
        if t <= 0.0 || self.duration == 0.0 {
            return 0.0;
        }
        if t >= self.duration {
            return self.distance;
        }

        let a = self.acceleration;
        if t <= self.accel_time {
            0.5 * a * t * t
        } else if t <= self.accel_time + self.cruise_time {
            0.5 * a * self.accel_time * self.accel_time + self.peak_velocity * (t - self.accel_time)
        } else {
            let remaining = self.duration - t;
            self.distance - 0.5 * a * remaining * remaining
        }
    }

    /// Speed at time `t` (clamped to the profile)
    pub fn velocity_at(&self, t: f64) -> f64 {
        if t <= 0.0 || t >= self.duration {
            return 0.0;
        }

        if t <= self.accel_time {
            self.acceleration * t
        } else if t <= self.accel_time + self.cruise_time {
            self.peak_velocity
        } else {
            self.acceleration * (self.duration - t)
        }
    }
}

/// Closed-form time to cover `distance` from rest to rest
///
/// Infinite when a zero bound makes the distance unreachable.
pub fn completion_time(distance: f64, max_velocity: f64, max_acceleration: f64) -> f64 {
    BoundedProfile::new(distance, max_velocity, max_acceleration)
        .map(|profile| profile.duration())
        .unwrap_or(f64::INFINITY)
}
