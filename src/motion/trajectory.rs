//! Time-sampled record of planned motion

use serde::Serialize;

use crate::core::types::Seconds;
use crate::motion::state::MovementState;

/// Sample times closer than this are treated as the same instant
pub const TIME_EPSILON: Seconds = 1e-9;

/// State of a unit at one sampled instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub time: Seconds,
    pub state: MovementState,
}

impl TrajectorySample {
    pub fn new(time: Seconds, state: MovementState) -> Self {
        Self { time, state }
    }
}

/// Planned motion for one or more commands
///
/// Sample times strictly increase and start at 0. Once built a trajectory
/// is read-only; the planner and the command queue are the only producers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
    #[serde(rename = "final")]
    final_state: MovementState,
}

impl Trajectory {
    /// A trajectory that stays at `state`
    pub fn stationary(state: MovementState) -> Self {
        Self {
            samples: vec![TrajectorySample::new(0.0, state)],
            final_state: state,
        }
    }

    pub(crate) fn from_samples(samples: Vec<TrajectorySample>, final_state: MovementState) -> Self {
        debug_assert!(!samples.is_empty());
        debug_assert_eq!(samples[0].time, 0.0);
        debug_assert!(samples.windows(2).all(|w| w[0].time < w[1].time));
        Self {
            samples,
            final_state,
        }
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn initial_state(&self) -> &MovementState {
        &self.samples[0].state
    }

    pub fn final_state(&self) -> &MovementState {
        &self.final_state
    }

    /// Time of the last sample
    pub fn duration(&self) -> Seconds {
        self.samples.last().map(|s| s.time).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Strictly increasing times starting at zero
    pub fn is_time_monotonic(&self) -> bool {
        self.samples.first().map(|s| s.time == 0.0).unwrap_or(false)
            && self.samples.windows(2).all(|w| w[0].time < w[1].time)
    }

    /// State at time `t`, linearly interpolated between samples
    ///
    /// Clamped: before 0 is the initial state, past the end is `final`.
    pub fn state_at(&self, t: Seconds) -> MovementState {
        if t <= 0.0 {
            return *self.initial_state();
        }
        if t >= self.duration() {
            return self.final_state;
        }

        let next = self.samples.partition_point(|s| s.time <= t);
        let a = &self.samples[next - 1];
        let b = &self.samples[next];
        let fraction = (t - a.time) / (b.time - a.time);
        a.state.interpolate(&b.state, fraction)
    }

    /// Append `next`, which must start where this trajectory ends
    ///
    /// The first sample of `next` duplicates our terminal state and is
    /// dropped; the rest are shifted by our duration.
    pub(crate) fn splice(&mut self, next: Trajectory) {
        let offset = self.duration();
        for sample in next.samples.into_iter().skip(1) {
            let time = offset + sample.time;
            match self.samples.last_mut() {
                Some(last) if time <= last.time => last.state = sample.state,
                _ => self.samples.push(TrajectorySample::new(time, sample.state)),
            }
        }
        self.final_state = next.final_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn line(from: f64, to: f64, duration: f64) -> Trajectory {
        let start = MovementState::at_rest(DVec2::new(from, 0.0), 0.0);
        let end = MovementState::at_rest(DVec2::new(to, 0.0), 0.0);
        Trajectory::from_samples(
            vec![
                TrajectorySample::new(0.0, start),
                TrajectorySample::new(duration, end),
            ],
            end,
        )
    }

    #[test]
    fn test_stationary() {
        let state = MovementState::at_rest(DVec2::new(1.0, 1.0), 0.5);
        let trajectory = Trajectory::stationary(state);
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.duration(), 0.0);
        assert_eq!(trajectory.state_at(3.0), state);
    }

    #[test]
    fn test_state_at_interpolates() {
        let trajectory = line(0.0, 10.0, 2.0);
        assert_eq!(trajectory.state_at(1.0).position, DVec2::new(5.0, 0.0));
        assert_eq!(trajectory.state_at(-1.0).position, DVec2::ZERO);
        assert_eq!(trajectory.state_at(5.0).position, DVec2::new(10.0, 0.0));
    }

    #[test]
    fn test_splice_offsets_time() {
        let mut first = line(0.0, 10.0, 2.0);
        first.splice(line(10.0, 15.0, 1.0));

        assert_eq!(first.len(), 3);
        assert_eq!(first.duration(), 3.0);
        assert!(first.is_time_monotonic());
        assert_eq!(first.final_state().position, DVec2::new(15.0, 0.0));
        assert_eq!(first.state_at(2.5).position, DVec2::new(12.5, 0.0));
    }

    #[test]
    fn test_splice_stationary_keeps_samples() {
        let mut first = line(0.0, 10.0, 2.0);
        let end = *first.final_state();
        first.splice(Trajectory::stationary(end));
        assert_eq!(first.len(), 2);
        assert_eq!(first.duration(), 2.0);
    }
}
