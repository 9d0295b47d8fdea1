//! Ordered movement commands for one unit
//!
//! Commands are planned one after another, each starting from the final
//! state of the previous one. Mutations drop the cached preview; callers
//! refresh it explicitly.

use crate::core::types::Seconds;
use crate::motion::command::MoveCommand;
use crate::motion::mobility::MobilityProfile;
use crate::motion::planner::{MotionPlanner, PlanError};
use crate::motion::state::MovementState;
use crate::motion::trajectory::Trajectory;

#[derive(Debug, Clone)]
pub struct CommandQueue {
    initial: MovementState,
    mobility: MobilityProfile,
    planner: MotionPlanner,
    commands: Vec<MoveCommand>,
    preview: Option<Result<Trajectory, PlanError>>,
}

impl CommandQueue {
    pub fn new(initial: MovementState, mobility: MobilityProfile, planner: MotionPlanner) -> Self {
        Self {
            initial,
            mobility,
            planner,
            commands: Vec::new(),
            preview: None,
        }
    }

    pub fn initial_state(&self) -> &MovementState {
        &self.initial
    }

    pub fn mobility(&self) -> &MobilityProfile {
        &self.mobility
    }

    pub fn commands(&self) -> &[MoveCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn append(&mut self, command: MoveCommand) {
        self.commands.push(command);
        self.preview = None;
    }

    /// Insert before `index`; false if `index > len`
    pub fn insert(&mut self, index: usize, command: MoveCommand) -> bool {
        if index > self.commands.len() {
            return false;
        }
        self.commands.insert(index, command);
        self.preview = None;
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<MoveCommand> {
        if index >= self.commands.len() {
            return None;
        }
        self.preview = None;
        Some(self.commands.remove(index))
    }

    /// Move the command at `from` so it ends up at `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.commands.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let command = self.commands.remove(from);
            self.commands.insert(to, command);
            self.preview = None;
        }
        true
    }

    pub fn clear(&mut self) {
        if !self.commands.is_empty() {
            self.commands.clear();
            self.preview = None;
        }
    }

    /// Plan the whole queue, chaining final states into initial states
    ///
    /// A command that overruns its budget stops the chain; the error then
    /// carries everything planned so far, including that command's
    /// partial motion.
    pub fn trajectory_preview(&self) -> Result<Trajectory, PlanError> {
        let mut trajectory = Trajectory::stationary(self.initial);

        for command in &self.commands {
            let start = *trajectory.final_state();
            match self.planner.plan(command, &self.mobility, &start) {
                Ok(next) => trajectory.splice(next),
                Err(PlanError::BudgetExceeded {
                    required,
                    budget,
                    partial,
                }) => {
                    trajectory.splice(partial);
                    return Err(PlanError::BudgetExceeded {
                        required,
                        budget,
                        partial: trajectory,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(trajectory)
    }

    /// Recompute and cache the preview
    pub fn refresh_preview(&mut self) -> &Result<Trajectory, PlanError> {
        let preview = self.trajectory_preview();
        self.preview.insert(preview)
    }

    /// Cached preview, planning it first if a mutation dropped it
    pub fn ensure_preview(&mut self) -> &Result<Trajectory, PlanError> {
        let preview = match self.preview.take() {
            Some(preview) => preview,
            None => self.trajectory_preview(),
        };
        self.preview.insert(preview)
    }

    /// Cached preview, if fresh; partial motion when it overran its budget
    pub fn cached_preview(&self) -> Option<&Trajectory> {
        match self.preview.as_ref()? {
            Ok(trajectory) => Some(trajectory),
            Err(err) => err.partial(),
        }
    }

    /// Where the unit will stand when the Acting phase cuts off at
    /// `turn_period`, per the cached preview
    pub fn end_of_turn_state(&self, turn_period: Seconds) -> Option<MovementState> {
        self.cached_preview()
            .map(|trajectory| trajectory.state_at(turn_period))
    }

    /// Freeze the queue into its trajectory
    pub fn commit(self) -> Result<Trajectory, PlanError> {
        match self.preview {
            Some(preview) => preview,
            None => self.trajectory_preview(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::command::CouplingPolicy;
    use glam::DVec2;
    use std::f64::consts::PI;

    fn queue() -> CommandQueue {
        CommandQueue::new(
            MovementState::at_rest(DVec2::ZERO, 0.0),
            MobilityProfile::new(10.0, 5.0, PI / 2.0, PI / 4.0),
            MotionPlanner::new(60.0, 0.1, CouplingPolicy::Sequential),
        )
    }

    #[test]
    fn test_empty_queue_is_stationary() {
        let trajectory = queue().trajectory_preview().unwrap();
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.final_state().position, DVec2::ZERO);
    }

    #[test]
    fn test_chain_concatenates_time() {
        let mut q = queue();
        q.append(MoveCommand::rotate(PI));
        q.append(MoveCommand::translate(DVec2::new(10.0, 0.0)));

        let trajectory = q.trajectory_preview().unwrap();
        assert!(trajectory.is_time_monotonic());
        // 4 s half turn, then a 10 unit triangle at a=5: 2·√2 s
        let expected = 4.0 + 2.0 * 2f64.sqrt();
        assert!((trajectory.duration() - expected).abs() < 1e-9);
        assert_eq!(trajectory.final_state().position, DVec2::new(10.0, 0.0));
        assert!((trajectory.final_state().rotation - PI).abs() < 1e-9);
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut q = queue();
        q.append(MoveCommand::translate(DVec2::new(5.0, 0.0)));
        assert!(q.refresh_preview().is_ok());
        assert!(q.cached_preview().is_some());

        q.append(MoveCommand::rotate(1.0));
        assert!(q.cached_preview().is_none());
    }

    #[test]
    fn test_remove_and_reorder() {
        let mut q = queue();
        q.append(MoveCommand::rotate(1.0));
        q.append(MoveCommand::translate(DVec2::new(1.0, 0.0)));
        q.append(MoveCommand::rotate(2.0));

        assert!(q.reorder(2, 0));
        assert_eq!(q.commands()[0], MoveCommand::rotate(2.0));
        assert_eq!(q.remove(1), Some(MoveCommand::rotate(1.0)));
        assert_eq!(q.remove(5), None);
        assert!(!q.reorder(0, 9));
        assert!(!q.insert(4, MoveCommand::rotate(0.0)));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_budget_overrun_keeps_prior_commands() {
        let mut q = CommandQueue::new(
            MovementState::at_rest(DVec2::ZERO, 0.0),
            MobilityProfile::new(1.0, 1.0, PI / 2.0, PI / 4.0),
            MotionPlanner::new(3.0, 0.1, CouplingPolicy::Sequential),
        );
        q.append(MoveCommand::translate(DVec2::new(1.0, 0.0)));
        q.append(MoveCommand::translate(DVec2::new(100.0, 0.0)));

        let err = q.trajectory_preview().unwrap_err();
        let partial = err.partial().expect("partial trajectory");
        // 2 s for the first unit step, then the 3 s budget of the second
        assert!((partial.duration() - 5.0).abs() < 1e-9);
        assert!(partial.final_state().position.x > 1.0);
    }

    #[test]
    fn test_end_of_turn_state_cuts_preview() {
        let mut q = queue();
        q.append(MoveCommand::translate(DVec2::new(100.0, 0.0)));
        q.refresh_preview();

        let at_cutoff = q.end_of_turn_state(2.0).unwrap();
        assert!(at_cutoff.position.x > 0.0);
        assert!(at_cutoff.position.x < 100.0);
    }

    #[test]
    fn test_ensure_preview_keeps_fresh_cache() {
        let mut q = queue();
        q.append(MoveCommand::rotate(1.0));
        assert!(q.cached_preview().is_none());

        let planned = q.ensure_preview().clone().unwrap();
        assert_eq!(q.cached_preview(), Some(&planned));
        assert_eq!(q.ensure_preview().as_ref().ok(), Some(&planned));
        assert_eq!(q.commit().unwrap(), planned);
    }

    #[test]
    fn test_commit_uses_current_commands() {
        let mut q = queue();
        q.append(MoveCommand::translate(DVec2::new(3.0, 4.0)));
        q.refresh_preview();
        q.append(MoveCommand::translate(DVec2::new(1.0, 0.0)));

        let trajectory = q.commit().unwrap();
        assert_eq!(trajectory.final_state().position, DVec2::new(4.0, 4.0));
    }
}
