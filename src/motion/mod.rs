//! Unit motion: commands, kinematic limits, and trajectory planning
//!
//! Everything here is independent of the battlefield. The planner turns a
//! command plus a mobility profile into a sampled trajectory; the command
//! queue chains several commands for one unit.

pub mod command;
pub mod mobility;
pub mod planner;
pub mod profile;
pub mod queue;
pub mod state;
pub mod trajectory;

pub use command::{CouplingPolicy, MoveCommand};
pub use mobility::MobilityProfile;
pub use planner::{plan, plan_with_coupling, MotionAxis, MotionPlanner, PlanError};
pub use profile::{completion_time, BoundedProfile};
pub use queue::CommandQueue;
pub use state::{normalize_angle, shortest_angle_delta, MovementState};
pub use trajectory::{Trajectory, TrajectorySample, TIME_EPSILON};
