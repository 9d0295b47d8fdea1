//! Motion planner: command + mobility limits → sampled trajectory
//!
//! A command is broken into legs. Each leg moves the unit along a straight
//! line and/or turns it, every axis on its own bounded-acceleration
//! profile, from rest to rest. Sequential coupling chains several legs;
//! simultaneous coupling runs both axes inside one leg.

use glam::DVec2;
use thiserror::Error;

use crate::core::types::Seconds;
use crate::motion::command::{CouplingPolicy, MoveCommand};
use crate::motion::mobility::MobilityProfile;
use crate::motion::profile::BoundedProfile;
use crate::motion::state::{direction_angle, normalize_angle, shortest_angle_delta, MovementState};
use crate::motion::trajectory::{Trajectory, TrajectorySample, TIME_EPSILON};

/// Axis a command needs capability along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAxis {
    Linear,
    Angular,
}

impl std::fmt::Display for MotionAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionAxis::Linear => write!(f, "linear"),
            MotionAxis::Angular => write!(f, "angular"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Mobility bound {field} must be finite and >= 0, got {value}")]
    InvalidMobility { field: &'static str, value: f64 },

    #[error("Command needs {axis} motion but the unit has no {axis} capability")]
    Unreachable { axis: MotionAxis },

    #[error("Command needs {required:.3}s but the budget is {budget:.3}s")]
    BudgetExceeded {
        required: Seconds,
        budget: Seconds,
        partial: Trajectory,
    },

    #[error("Invalid sampling: budget {budget}s, delta {delta}s")]
    InvalidSampling { budget: Seconds, delta: Seconds },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl PlanError {
    /// Partial trajectory carried by `BudgetExceeded`
    pub fn partial(&self) -> Option<&Trajectory> {
        match self {
            PlanError::BudgetExceeded { partial, .. } => Some(partial),
            _ => None,
        }
    }

    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, PlanError::BudgetExceeded { .. })
    }
}

/// Straight-line move and/or turn between two rest states
#[derive(Debug, Clone, Copy)]
struct Leg {
    start_position: DVec2,
    start_heading: f64,
    direction: DVec2,
    linear: BoundedProfile,
    end_position: DVec2,
    turn_sign: f64,
    angular: BoundedProfile,
    end_heading: f64,
}

impl Leg {
    fn new(
        start: &MovementState,
        offset: DVec2,
        target_heading: f64,
        mobility: &MobilityProfile,
    ) -> Result<Self, PlanError> {
        let start_heading = start.heading();
        let distance = offset.length();
        let direction = if distance > 0.0 { offset / distance } else { DVec2::ZERO };
        if distance > 0.0 && !mobility.can_translate() {
            return Err(PlanError::Unreachable {
                axis: MotionAxis::Linear,
            });
        }
        let linear = BoundedProfile::new(
            distance,
            mobility.max_linear_velocity,
            mobility.max_linear_acceleration,
        )
        .ok_or(PlanError::Unreachable {
            axis: MotionAxis::Linear,
        })?;

        let turn = shortest_angle_delta(start_heading, target_heading);
        if turn != 0.0 && !mobility.can_rotate() {
            return Err(PlanError::Unreachable {
                axis: MotionAxis::Angular,
            });
        }
        let angular = BoundedProfile::new(
            turn,
            mobility.max_angular_velocity,
            mobility.max_angular_acceleration,
        )
        .ok_or(PlanError::Unreachable {
            axis: MotionAxis::Angular,
        })?;

        Ok(Self {
            start_position: start.position,
            start_heading,
            direction,
            linear,
            end_position: start.position + offset,
            turn_sign: if turn < 0.0 { -1.0 } else { 1.0 },
            angular,
            end_heading: normalize_angle(target_heading),
        })
    }

    fn duration(&self) -> Seconds {
        self.linear.duration().max(self.angular.duration())
    }

    fn end_state(&self) -> MovementState {
        MovementState::at_rest(self.end_position, self.end_heading)
    }

    fn state_at(&self, t: Seconds) -> MovementState {
        let (position, velocity) = if t >= self.linear.duration() {
            (self.end_position, DVec2::ZERO)
        } else {
            (
                self.start_position + self.direction * self.linear.position_at(t),
                self.direction * self.linear.velocity_at(t),
            )
        };

        let (rotation, rot_velocity) = if t >= self.angular.duration() {
            (self.end_heading, 0.0)
        } else {
            (
                normalize_angle(self.start_heading + self.turn_sign * self.angular.position_at(t)),
                self.turn_sign * self.angular.velocity_at(t),
            )
        };

        MovementState::new(position, rotation, velocity, rot_velocity)
    }
}

/// Legs of one command, laid end to end in time
struct LegPlan {
    initial: MovementState,
    legs: Vec<Leg>,
}

impl LegPlan {
    fn build(
        command: &MoveCommand,
        mobility: &MobilityProfile,
        initial: &MovementState,
        coupling: CouplingPolicy,
    ) -> Result<Self, PlanError> {
        let mut plan = Self {
            initial: *initial,
            legs: Vec::new(),
        };
        let heading = initial.heading();

        match *command {
            MoveCommand::Translate { offset } => {
                check_vector("translate offset", offset)?;
                plan.push(offset, heading, mobility)?;
            }
            MoveCommand::Rotate { target } => {
                if !target.is_finite() {
                    return Err(PlanError::InvalidCommand(format!(
                        "rotate target must be finite, got {}",
                        target
                    )));
                }
                plan.push(DVec2::ZERO, target, mobility)?;
            }
            MoveCommand::Wheel { offset } => {
                check_vector("wheel offset", offset)?;
                if offset != DVec2::ZERO {
                    let travel = direction_angle(offset);
                    match coupling {
                        CouplingPolicy::Sequential => {
                            plan.push(DVec2::ZERO, travel, mobility)?;
                            plan.push(offset, travel, mobility)?;
                        }
                        CouplingPolicy::Simultaneous => plan.push(offset, travel, mobility)?,
                    }
                }
            }
            MoveCommand::Reposition { offset, direction } => {
                check_vector("reposition offset", offset)?;
                check_vector("reposition direction", direction)?;
                if direction == DVec2::ZERO {
                    return Err(PlanError::InvalidCommand(
                        "reposition direction must not be zero".into(),
                    ));
                }
                let facing = direction_angle(direction);

                if offset == DVec2::ZERO {
                    plan.push(DVec2::ZERO, facing, mobility)?;
                } else {
                    match coupling {
                        CouplingPolicy::Sequential => {
                            let travel = direction_angle(offset);
                            plan.push(DVec2::ZERO, travel, mobility)?;
                            plan.push(offset, travel, mobility)?;
                            plan.push(DVec2::ZERO, facing, mobility)?;
                        }
                        CouplingPolicy::Simultaneous => plan.push(offset, facing, mobility)?,
                    }
                }
            }
        }

        Ok(plan)
    }

    fn push(
        &mut self,
        offset: DVec2,
        target_heading: f64,
        mobility: &MobilityProfile,
    ) -> Result<(), PlanError> {
        let start = self.end_state();
        let leg = Leg::new(&start, offset, target_heading, mobility)?;
        self.legs.push(leg);
        Ok(())
    }

    fn duration(&self) -> Seconds {
        self.legs.iter().map(Leg::duration).sum()
    }

    fn end_state(&self) -> MovementState {
        match self.legs.last() {
            Some(leg) => leg.end_state(),
            None => MovementState::at_rest(self.initial.position, self.initial.heading()),
        }
    }

    fn state_at(&self, t: Seconds) -> MovementState {
        let mut leg_start = 0.0;
        for leg in &self.legs {
            let leg_end = leg_start + leg.duration();
            if t < leg_end {
                return leg.state_at(t - leg_start);
            }
            leg_start = leg_end;
        }
        self.end_state()
    }

    /// Samples on the fixed grid up to `end`, closed by `terminal` at `end`
    fn sample(&self, end: Seconds, delta: Seconds, terminal: MovementState) -> Vec<TrajectorySample> {
        let mut samples = vec![TrajectorySample::new(0.0, self.initial)];
        let mut k: u64 = 1;
        loop {
            let t = k as f64 * delta;
            if t >= end - TIME_EPSILON {
                break;
            }
            samples.push(TrajectorySample::new(t, self.state_at(t)));
            k += 1;
        }
        if end > 0.0 {
            samples.push(TrajectorySample::new(end, terminal));
        }
        samples
    }
}

fn check_vector(what: &str, value: DVec2) -> Result<(), PlanError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PlanError::InvalidCommand(format!(
            "{} must be finite, got {:?}",
            what, value
        )))
    }
}

/// Plan one command with the default (sequential) coupling
pub fn plan(
    command: &MoveCommand,
    mobility: &MobilityProfile,
    initial: &MovementState,
    time_budget: Seconds,
    sample_delta: Seconds,
) -> Result<Trajectory, PlanError> {
    plan_with_coupling(
        command,
        mobility,
        initial,
        time_budget,
        sample_delta,
        CouplingPolicy::default(),
    )
}

/// Plan one command into a trajectory sampled every `sample_delta`
///
/// Ends early at the completion time when that is within `time_budget`;
/// otherwise returns `BudgetExceeded` carrying the motion up to the budget.
pub fn plan_with_coupling(
    command: &MoveCommand,
    mobility: &MobilityProfile,
    initial: &MovementState,
    time_budget: Seconds,
    sample_delta: Seconds,
    coupling: CouplingPolicy,
) -> Result<Trajectory, PlanError> {
    let sampling_ok = time_budget.is_finite()
        && sample_delta.is_finite()
        && time_budget > 0.0
        && sample_delta > 0.0
        && sample_delta <= time_budget;
    if !sampling_ok {
        return Err(PlanError::InvalidSampling {
            budget: time_budget,
            delta: sample_delta,
        });
    }
    mobility.validate()?;

    let legs = LegPlan::build(command, mobility, initial, coupling)?;
    let required = legs.duration();

    if required > time_budget + TIME_EPSILON {
        let cutoff = legs.state_at(time_budget);
        let partial = Trajectory::from_samples(legs.sample(time_budget, sample_delta, cutoff), cutoff);
        tracing::trace!(
            command = command.name(),
            required,
            time_budget,
            "plan exceeds budget"
        );
        return Err(PlanError::BudgetExceeded {
            required,
            budget: time_budget,
            partial,
        });
    }

    let terminal = legs.end_state();
    let samples = legs.sample(required, sample_delta, terminal);
    tracing::trace!(
        command = command.name(),
        duration = required,
        samples = samples.len(),
        "planned command"
    );
    Ok(Trajectory::from_samples(samples, terminal))
}

/// Planner settings shared by every command a unit issues
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlanner {
    pub time_budget: Seconds,
    pub sample_delta: Seconds,
    pub coupling: CouplingPolicy,
}

impl MotionPlanner {
    pub fn new(time_budget: Seconds, sample_delta: Seconds, coupling: CouplingPolicy) -> Self {
        Self {
            time_budget,
            sample_delta,
            coupling,
        }
    }

    pub fn plan(
        &self,
        command: &MoveCommand,
        mobility: &MobilityProfile,
        initial: &MovementState,
    ) -> Result<Trajectory, PlanError> {
        plan_with_coupling(
            command,
            mobility,
            initial,
            self.time_budget,
            self.sample_delta,
            self.coupling,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn turner() -> MobilityProfile {
        MobilityProfile::new(10.0, 5.0, PI / 2.0, PI / 4.0)
    }

    fn origin() -> MovementState {
        MovementState::at_rest(DVec2::ZERO, 0.0)
    }

    #[test]
    fn test_rotate_half_turn_completes_early() {
        let trajectory = plan(&MoveCommand::rotate(PI), &turner(), &origin(), 10.0, 0.1).unwrap();

        // Triangle with peak π/2 rad/s: 2 s up, 2 s down
        assert!((trajectory.duration() - 4.0).abs() < 1e-9);
        assert!((trajectory.final_state().rotation - PI).abs() < 1e-6);
        assert_eq!(trajectory.final_state().rot_velocity, 0.0);
        assert!(trajectory.is_time_monotonic());
    }

    #[test]
    fn test_rotate_takes_shorter_way() {
        let trajectory = plan(
            &MoveCommand::rotate(3.0 * PI / 2.0),
            &turner(),
            &origin(),
            10.0,
            0.1,
        )
        .unwrap();

        // Turning −π/2 means negative angular velocity on the way
        let mid = trajectory.state_at(trajectory.duration() / 2.0);
        assert!(mid.rot_velocity < 0.0);
        assert!((trajectory.final_state().rotation - 3.0 * PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_budget_exceeded_carries_partial() {
        let result = plan(
            &MoveCommand::rotate(3.0 * PI / 2.0),
            &turner(),
            &origin(),
            0.5,
            0.1,
        );

        match result {
            Err(PlanError::BudgetExceeded {
                required,
                budget,
                partial,
            }) => {
                assert!(required > budget);
                assert_eq!(budget, 0.5);
                assert!((partial.duration() - 0.5).abs() < 1e-12);
                assert!(partial.final_state().rot_velocity < 0.0);
            }
            other => panic!("expected BudgetExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_final_sample_clamped_to_completion() {
        // 4.0 s completion with a 0.3 s step: last grid point is 3.9
        let trajectory = plan(&MoveCommand::rotate(PI), &turner(), &origin(), 10.0, 0.3).unwrap();
        let samples = trajectory.samples();
        let last = samples[samples.len() - 1].time;
        let before = samples[samples.len() - 2].time;
        assert!((last - 4.0).abs() < 1e-9);
        assert!((before - 3.9).abs() < 1e-9);
    }

    #[test]
    fn test_translate_reaches_offset() {
        let offset = DVec2::new(30.0, 40.0);
        let trajectory = plan(&MoveCommand::translate(offset), &turner(), &origin(), 60.0, 0.1).unwrap();
        assert_eq!(trajectory.final_state().position, offset);
        assert_eq!(trajectory.final_state().velocity, DVec2::ZERO);
        assert_eq!(trajectory.final_state().rotation, 0.0);
    }

    #[test]
    fn test_translate_without_linear_capability() {
        let mobility = MobilityProfile::rotation_only(1.0, 1.0);
        let result = plan(
            &MoveCommand::translate(DVec2::new(1.0, 0.0)),
            &mobility,
            &origin(),
            10.0,
            0.1,
        );
        assert_eq!(
            result,
            Err(PlanError::Unreachable {
                axis: MotionAxis::Linear
            })
        );
    }

    #[test]
    fn test_rotate_without_angular_capability() {
        let mobility = MobilityProfile::new(1.0, 1.0, 0.0, 1.0);
        let result = plan(&MoveCommand::rotate(1.0), &mobility, &origin(), 10.0, 0.1);
        assert_eq!(
            result,
            Err(PlanError::Unreachable {
                axis: MotionAxis::Angular
            })
        );
    }

    #[test]
    fn test_zero_rotation_with_zero_capability_is_fine() {
        let mobility = MobilityProfile::default();
        let trajectory = plan(&MoveCommand::rotate(0.0), &mobility, &origin(), 10.0, 0.1).unwrap();
        assert_eq!(trajectory.len(), 1);
    }

    #[test]
    fn test_invalid_mobility() {
        let mobility = MobilityProfile::new(1.0, 1.0, -1.0, 1.0);
        let result = plan(&MoveCommand::rotate(1.0), &mobility, &origin(), 10.0, 0.1);
        assert!(matches!(result, Err(PlanError::InvalidMobility { .. })));
    }

    #[test]
    fn test_invalid_sampling() {
        let command = MoveCommand::rotate(1.0);
        for (budget, delta) in [(0.0, 0.1), (1.0, 0.0), (1.0, 2.0), (f64::NAN, 0.1)] {
            let result = plan(&command, &turner(), &origin(), budget, delta);
            assert!(
                matches!(result, Err(PlanError::InvalidSampling { .. })),
                "budget {} delta {}",
                budget,
                delta
            );
        }
    }

    #[test]
    fn test_wheel_sequential_turns_then_moves() {
        let offset = DVec2::new(0.0, 10.0);
        let trajectory = plan(&MoveCommand::wheel(offset), &turner(), &origin(), 60.0, 0.05).unwrap();

        let final_state = trajectory.final_state();
        assert_eq!(final_state.position, offset);
        assert!((final_state.rotation - PI / 2.0).abs() < 1e-9);

        // While turning the unit stays put
        let turn_time = crate::motion::profile::completion_time(PI / 2.0, PI / 2.0, PI / 4.0);
        let during_turn = trajectory.state_at(turn_time / 2.0);
        assert_eq!(during_turn.position, DVec2::ZERO);
        assert!(during_turn.rot_velocity > 0.0);
    }

    #[test]
    fn test_wheel_simultaneous_is_not_slower() {
        let command = MoveCommand::wheel(DVec2::new(0.0, 10.0));
        let sequential = plan_with_coupling(
            &command,
            &turner(),
            &origin(),
            60.0,
            0.05,
            CouplingPolicy::Sequential,
        )
        .unwrap();
        let simultaneous = plan_with_coupling(
            &command,
            &turner(),
            &origin(),
            60.0,
            0.05,
            CouplingPolicy::Simultaneous,
        )
        .unwrap();

        assert!(simultaneous.duration() < sequential.duration());
        assert_eq!(
            simultaneous.final_state().position,
            sequential.final_state().position
        );
        let early = simultaneous.state_at(0.5);
        assert!(early.position.y > 0.0);
        assert!(early.rot_velocity > 0.0);
    }

    #[test]
    fn test_reposition_ends_facing_direction() {
        let command = MoveCommand::reposition(DVec2::new(10.0, 0.0), DVec2::new(0.0, -1.0));
        let trajectory = plan(&command, &turner(), &origin(), 60.0, 0.05).unwrap();
        assert_eq!(trajectory.final_state().position, DVec2::new(10.0, 0.0));
        assert!((trajectory.final_state().rotation - 3.0 * PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reposition_zero_direction_rejected() {
        let command = MoveCommand::reposition(DVec2::new(10.0, 0.0), DVec2::ZERO);
        let result = plan(&command, &turner(), &origin(), 60.0, 0.05);
        assert!(matches!(result, Err(PlanError::InvalidCommand(_))));
    }

    #[test]
    fn test_planner_value_matches_free_function() {
        let planner = MotionPlanner::new(10.0, 0.1, CouplingPolicy::Sequential);
        let command = MoveCommand::rotate(1.0);
        assert_eq!(
            planner.plan(&command, &turner(), &origin()),
            plan(&command, &turner(), &origin(), 10.0, 0.1)
        );
    }
}
