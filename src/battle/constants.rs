//! Battlefield constants - all tunable defaults in one place
//!
//! Distances are simulation units (1 unit ≈ 1 metre), times are seconds,
//! angles are radians.

use std::f64::consts::PI;

// Turn timing
pub const DEFAULT_TURN_PERIOD: f64 = 10.0;
pub const DEFAULT_SAMPLE_DELTA: f64 = 0.04; // 25 samples per second
pub const DEFAULT_COMMAND_TIME_BUDGET: f64 = 60.0;

// Commit planning on the rayon pool from this many units up
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

// Footprints (frontage x depth)
pub const INFANTRY_WIDTH: f64 = 4.0;
pub const INFANTRY_DEPTH: f64 = 2.0;
pub const CAVALRY_WIDTH: f64 = 5.0;
pub const CAVALRY_DEPTH: f64 = 3.0;

// Mobility
// Real-world reference: infantry march ~1.4 m/s, cavalry trot ~3.9 m/s
pub const INFANTRY_SPEED: f64 = 1.5;
pub const INFANTRY_ACCELERATION: f64 = 0.75;
pub const INFANTRY_TURN_RATE: f64 = PI / 4.0;
pub const INFANTRY_TURN_ACCELERATION: f64 = PI / 8.0;

pub const CAVALRY_SPEED: f64 = 4.0;
pub const CAVALRY_ACCELERATION: f64 = 1.5;
pub const CAVALRY_TURN_RATE: f64 = PI / 3.0;
pub const CAVALRY_TURN_ACCELERATION: f64 = PI / 6.0;
