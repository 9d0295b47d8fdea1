//! Units in each turn phase
//!
//! A unit is a different type in every phase. At a phase boundary each
//! unit is rebuilt as the next variant, keeping its id and pose; nothing
//! survives from the old variant except what the new one is built from.
//! The roster holds exactly one variant set, so units of two phases can
//! never coexist.

use serde::Serialize;

use crate::battle::phase::TurnPhase;
use crate::battle::unit_type::UnitTypeSpec;
use crate::battle::zones::FootprintSize;
use crate::core::types::{Pose, Seconds, UnitId};
use crate::motion::planner::MotionPlanner;
use crate::motion::queue::CommandQueue;
use crate::motion::state::{normalize_angle, MovementState};
use crate::motion::trajectory::Trajectory;

/// Identity carried by a unit through every phase
#[derive(Debug, Clone, PartialEq)]
pub struct UnitInfo {
    pub id: UnitId,
    pub unit_type: String,
    pub spec: UnitTypeSpec,
}

impl UnitInfo {
    pub fn new(id: UnitId, unit_type: impl Into<String>, spec: UnitTypeSpec) -> Self {
        Self {
            id,
            unit_type: unit_type.into(),
            spec,
        }
    }

    pub fn footprint_size(&self) -> FootprintSize {
        FootprintSize::new(self.spec.width, self.spec.depth)
    }
}

/// What every phase variant can answer
pub trait Unit {
    fn info(&self) -> &UnitInfo;
    fn pose(&self) -> Pose;
    fn is_valid(&self) -> bool;
    fn is_busy(&self) -> bool;

    fn id(&self) -> UnitId {
        self.info().id
    }
}

/// Unit being placed before the battle
#[derive(Debug, Clone)]
pub struct DeployingUnit {
    info: UnitInfo,
    pose: Pose,
    valid: bool,
    /// Pose before the current interaction; Some while held
    held_from: Option<Pose>,
    /// Requested but never placed
    fresh: bool,
}

impl DeployingUnit {
    /// A freshly requested unit, already held
    pub fn requested(info: UnitInfo, pose: Pose) -> Self {
        Self {
            info,
            pose,
            valid: false,
            held_from: Some(pose),
            fresh: true,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held_from.is_some()
    }

    /// Has this unit ever been placed?
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn pick(&mut self) {
        self.held_from = Some(self.pose);
    }

    /// Heading is stored normalized into [0, 2π)
    pub fn move_to(&mut self, pose: Pose) {
        self.pose = Pose::new(pose.position, normalize_angle(pose.rotation));
    }

    pub fn place(&mut self) {
        self.held_from = None;
        self.fresh = false;
    }

    /// Drop the interaction and return to the pose it started from
    pub fn cancel(&mut self) {
        if let Some(pose) = self.held_from.take() {
            self.pose = pose;
        }
    }

    /// Returns true if validity flipped
    pub fn set_valid(&mut self, valid: bool) -> bool {
        std::mem::replace(&mut self.valid, valid) != valid
    }
}

impl Unit for DeployingUnit {
    fn info(&self) -> &UnitInfo {
        &self.info
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn is_busy(&self) -> bool {
        self.is_held()
    }
}

/// Unit receiving orders
#[derive(Debug, Clone)]
pub struct MovingUnit {
    info: UnitInfo,
    queue: CommandQueue,
    valid: bool,
    editing: bool,
}

impl MovingUnit {
    /// Start a Moving turn at rest at `pose`
    pub fn new(info: UnitInfo, pose: Pose, valid: bool, planner: MotionPlanner) -> Self {
        let queue = CommandQueue::new(MovementState::from_pose(pose), info.spec.mobility, planner);
        Self {
            info,
            queue,
            valid,
            editing: false,
        }
    }

    pub fn from_deploying(unit: DeployingUnit, planner: MotionPlanner) -> Self {
        Self::new(unit.info, unit.pose, unit.valid, planner)
    }

    pub fn from_acting(unit: ActingUnit, planner: MotionPlanner) -> Self {
        Self::new(unit.info, unit.pose, unit.valid, planner)
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut CommandQueue {
        &mut self.queue
    }

    pub fn replace_queue(&mut self, queue: CommandQueue) {
        self.queue = queue;
    }

    /// Split into what an Acting unit is built from
    pub fn into_parts(self) -> (UnitInfo, bool, CommandQueue) {
        (self.info, self.valid, self.queue)
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    pub fn set_valid(&mut self, valid: bool) -> bool {
        std::mem::replace(&mut self.valid, valid) != valid
    }
}

impl Unit for MovingUnit {
    fn info(&self) -> &UnitInfo {
        &self.info
    }

    fn pose(&self) -> Pose {
        self.queue.initial_state().pose()
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn is_busy(&self) -> bool {
        self.editing
    }
}

/// Unit playing back its committed trajectory
#[derive(Debug, Clone)]
pub struct ActingUnit {
    info: UnitInfo,
    trajectory: Trajectory,
    cursor: Seconds,
    pose: Pose,
    valid: bool,
}

impl ActingUnit {
    pub fn new(info: UnitInfo, trajectory: Trajectory, valid: bool) -> Self {
        let pose = trajectory.initial_state().pose();
        Self {
            info,
            trajectory,
            cursor: 0.0,
            pose,
            valid,
        }
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn state(&self) -> MovementState {
        self.trajectory.state_at(self.cursor)
    }

    /// Move the playback cursor forward by `dt`
    pub fn advance(&mut self, dt: Seconds) {
        self.cursor += dt;
        self.pose = self.state().pose();
    }

    pub fn set_valid(&mut self, valid: bool) -> bool {
        std::mem::replace(&mut self.valid, valid) != valid
    }
}

impl Unit for ActingUnit {
    fn info(&self) -> &UnitInfo {
        &self.info
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn is_busy(&self) -> bool {
        false
    }
}

/// Serializable snapshot of one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitView {
    pub id: UnitId,
    pub unit_type: String,
    pub phase: TurnPhase,
    pub pose: Pose,
    pub valid: bool,
    pub busy: bool,
}

impl UnitView {
    pub fn of(unit: &dyn Unit, phase: TurnPhase) -> Self {
        Self {
            id: unit.id(),
            unit_type: unit.info().unit_type.clone(),
            phase,
            pose: unit.pose(),
            valid: unit.is_valid(),
            busy: unit.is_busy(),
        }
    }
}

/// The active units, tagged by phase
#[derive(Debug, Clone)]
pub enum UnitRoster {
    Deploying(Vec<DeployingUnit>),
    Moving(Vec<MovingUnit>),
    Acting(Vec<ActingUnit>),
}

impl Default for UnitRoster {
    fn default() -> Self {
        UnitRoster::Deploying(Vec::new())
    }
}

impl UnitRoster {
    pub fn phase(&self) -> TurnPhase {
        match self {
            UnitRoster::Deploying(_) => TurnPhase::Deploying,
            UnitRoster::Moving(_) => TurnPhase::Moving,
            UnitRoster::Acting(_) => TurnPhase::Acting,
        }
    }

    /// Units in insertion order
    pub fn iter(&self) -> Box<dyn Iterator<Item = &dyn Unit> + '_> {
        match self {
            UnitRoster::Deploying(units) => Box::new(units.iter().map(|u| u as &dyn Unit)),
            UnitRoster::Moving(units) => Box::new(units.iter().map(|u| u as &dyn Unit)),
            UnitRoster::Acting(units) => Box::new(units.iter().map(|u| u as &dyn Unit)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            UnitRoster::Deploying(units) => units.len(),
            UnitRoster::Moving(units) => units.len(),
            UnitRoster::Acting(units) => units.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: UnitId) -> Option<&dyn Unit> {
        self.iter().find(|unit| unit.id() == id)
    }

    pub fn ids(&self) -> Vec<UnitId> {
        self.iter().map(|unit| unit.id()).collect()
    }

    pub fn views(&self) -> Vec<UnitView> {
        let phase = self.phase();
        self.iter().map(|unit| UnitView::of(unit, phase)).collect()
    }

    /// Every active unit is valid (vacuously true when empty)
    pub fn all_valid(&self) -> bool {
        self.iter().all(|unit| unit.is_valid())
    }

    pub fn any_busy(&self) -> bool {
        self.iter().any(|unit| unit.is_busy())
    }
}
