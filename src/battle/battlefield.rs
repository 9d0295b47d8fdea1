//! Turn phase controller
//!
//! Owns the zone geometry, the unit roster and the event bus, and moves
//! the battle through Deploying → Moving → Acting → Moving → …
//!
//! Every operation checks the current phase first. Unit validity is
//! recomputed right after any change to a unit's pose or orders; the
//! aggregate valid/busy flags are derived from the roster and announced
//! only when they flip.
//!
//! Validity is judged per phase: a deploying or acting unit by its
//! footprint where it stands, a moving unit by the footprint at every
//! sample of its planned path.

use glam::DVec2;
use rayon::prelude::*;
use serde::Serialize;

use crate::battle::events::{BattlefieldEvent, EventBus};
use crate::battle::phase::TurnPhase;
use crate::battle::units::{
    ActingUnit, DeployingUnit, MovingUnit, Unit, UnitInfo, UnitRoster, UnitView,
};
use crate::battle::zones::{Violation, ZoneMap, ZoneValidator};
use crate::core::config::{BattlefieldConfig, DeploymentGate};
use crate::core::error::{BattleError, Result};
use crate::core::types::{Pose, Seconds, UnitId};
use crate::motion::command::MoveCommand;
use crate::motion::planner::{MotionPlanner, PlanError};
use crate::motion::queue::CommandQueue;
use crate::motion::state::MovementState;
use crate::motion::trajectory::{Trajectory, TIME_EPSILON};

/// Result of one Acting tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    /// Still inside the turn period
    Running,
    /// The turn period has elapsed; further ticks do nothing
    TurnComplete,
}

pub struct Battlefield {
    config: BattlefieldConfig,
    validator: ZoneValidator,
    roster: UnitRoster,
    events: EventBus,
    next_id: u32,
    /// Unit in a placement interaction
    held: Option<UnitId>,
    /// Seconds into the current Acting phase
    elapsed: Seconds,
    turn: u32,
    acting_done: bool,
    // Last announced aggregates
    reported_valid: bool,
    reported_busy: bool,
}

impl Battlefield {
    pub fn new(config: BattlefieldConfig, zones: ZoneMap) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Battlefield ready: {} terrain zones, {} unit types, turn period {}s",
            zones.terrain().len(),
            config.unit_types.len(),
            config.turn_period
        );
        for zone in zones.iter() {
            tracing::debug!(
                "Zone '{}' ({:?}): {} polygon(s)",
                zone.name(),
                zone.kind(),
                zone.shape().0.len()
            );
        }

        Ok(Self {
            config,
            validator: ZoneValidator::new(zones),
            roster: UnitRoster::default(),
            events: EventBus::new(),
            next_id: 1,
            held: None,
            elapsed: 0.0,
            turn: 0,
            acting_done: false,
            reported_valid: true,
            reported_busy: false,
        })
    }

    // ---- Queries ----

    pub fn phase(&self) -> TurnPhase {
        self.roster.phase()
    }

    /// Seconds played in the current Acting phase (0 outside Acting)
    pub fn current_time(&self) -> Seconds {
        self.elapsed
    }

    pub fn turn_period(&self) -> Seconds {
        self.config.turn_period
    }

    /// Number of turns committed so far
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Every active unit is legal
    pub fn is_valid(&self) -> bool {
        self.roster.all_valid()
    }

    /// Some active unit is mid-interaction
    pub fn is_busy(&self) -> bool {
        self.roster.any_busy()
    }

    pub fn unit(&self, id: UnitId) -> Option<UnitView> {
        self.roster
            .get(id)
            .map(|unit| UnitView::of(unit, self.phase()))
    }

    /// Active units in insertion order
    pub fn units(&self) -> Vec<UnitView> {
        self.roster.views()
    }

    pub fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    pub fn zones(&self) -> &ZoneMap {
        self.validator.zones()
    }

    /// Unit currently held by a placement interaction
    pub fn held_unit(&self) -> Option<UnitId> {
        self.held
    }

    // ---- Events ----

    pub fn subscribe(&mut self, listener: impl FnMut(&BattlefieldEvent) + Send + 'static) {
        self.events.subscribe(listener);
    }

    pub fn drain_events(&mut self) -> Vec<BattlefieldEvent> {
        self.events.drain()
    }

    // ---- Deploying ----

    /// Create a unit at the deploy zone centroid, held for placement
    pub fn request_deploy(&mut self, unit_type: &str) -> Result<UnitId> {
        let phase = self.phase();
        let UnitRoster::Deploying(units) = &mut self.roster else {
            return Err(BattleError::PhaseViolation {
                operation: "request_deploy",
                phase,
            });
        };
        if let Some(held) = self.held {
            return Err(BattleError::InteractionInProgress { held });
        }
        let spec = *self
            .config
            .unit_types
            .get(unit_type)
            .ok_or_else(|| BattleError::UnknownUnitType(unit_type.to_string()))?;

        let id = UnitId::new(self.next_id);
        self.next_id += 1;

        let info = UnitInfo::new(id, unit_type, spec);
        let pose = Pose::new(self.validator.zones().deploy_centroid(), 0.0);
        let valid = footprint_legal(&self.validator, &info, pose, TurnPhase::Deploying);
        let mut unit = DeployingUnit::requested(info, pose);
        unit.set_valid(valid);
        units.push(unit);
        self.held = Some(id);

        tracing::debug!("Requested {} ({}), valid: {}", id, unit_type, valid);
        self.events.emit(BattlefieldEvent::UnitCreated {
            unit: id,
            unit_type: unit_type.to_string(),
        });
        self.sync_aggregates();
        Ok(id)
    }

    /// Start moving an already placed unit
    pub fn pick(&mut self, id: UnitId) -> Result<()> {
        match self.held {
            Some(held) if held == id => return Ok(()),
            Some(held) => return Err(BattleError::InteractionInProgress { held }),
            None => {}
        }
        self.deploying_unit_mut("pick", id)?.pick();
        self.held = Some(id);
        self.sync_aggregates();
        Ok(())
    }

    /// Move the held unit and revalidate it
    pub fn drag_to(&mut self, id: UnitId, position: DVec2, rotation: f64) -> Result<()> {
        self.ensure_held("drag_to", id)?;
        self.deploying_unit_mut("drag_to", id)?
            .move_to(Pose::new(position, rotation));
        self.revalidate_deploying(id);
        self.sync_aggregates();
        Ok(())
    }

    /// End the interaction where the unit stands
    pub fn place(&mut self, id: UnitId) -> Result<()> {
        self.ensure_held("place", id)?;
        self.deploying_unit_mut("place", id)?.place();
        self.held = None;
        self.revalidate_deploying(id);
        self.sync_aggregates();
        Ok(())
    }

    /// Undo the interaction; a never-placed unit is removed
    pub fn cancel_interaction(&mut self, id: UnitId) -> Result<()> {
        self.ensure_held("cancel_interaction", id)?;
        let phase = self.phase();
        let UnitRoster::Deploying(units) = &mut self.roster else {
            return Err(BattleError::PhaseViolation {
                operation: "cancel_interaction",
                phase,
            });
        };
        let index = units
            .iter()
            .position(|unit| unit.id() == id)
            .ok_or(BattleError::UnknownUnit(id))?;

        self.held = None;
        if units[index].is_fresh() {
            units.remove(index);
            tracing::debug!("Removed {} before placement", id);
            self.events.emit(BattlefieldEvent::UnitRemoved { unit: id });
        } else {
            units[index].cancel();
            self.revalidate_deploying(id);
        }
        self.sync_aggregates();
        Ok(())
    }

    /// Close deployment and start the first Moving phase
    pub fn advance_to_move(&mut self) -> Result<()> {
        let phase = self.phase();
        let planner = self.planner();
        let UnitRoster::Deploying(units) = &mut self.roster else {
            return Err(BattleError::PhaseViolation {
                operation: "advance_to_move",
                phase,
            });
        };
        if let Some(held) = self.held {
            return Err(BattleError::InteractionInProgress { held });
        }
        if self.config.deployment_gate == DeploymentGate::RequireValid {
            let invalid: Vec<UnitId> = units
                .iter()
                .filter(|unit| !unit.is_valid())
                .map(|unit| unit.id())
                .collect();
            if !invalid.is_empty() {
                return Err(BattleError::InvalidDeployment { units: invalid });
            }
        }

        let moving: Vec<MovingUnit> = std::mem::take(units)
            .into_iter()
            .map(|unit| MovingUnit::from_deploying(unit, planner))
            .collect();
        self.roster = UnitRoster::Moving(moving);
        self.announce_phase(TurnPhase::Deploying);
        self.events.emit(BattlefieldEvent::DeploymentClosed);

        for id in self.roster.ids() {
            self.revalidate_moving(id);
        }
        self.sync_aggregates();
        Ok(())
    }

    // ---- Moving ----

    pub fn append_command(&mut self, id: UnitId, command: MoveCommand) -> Result<()> {
        self.edit_queue("append_command", id, |queue| {
            queue.append(command);
            Ok(())
        })
    }

    pub fn insert_command(&mut self, id: UnitId, index: usize, command: MoveCommand) -> Result<()> {
        self.edit_queue("insert_command", id, |queue| {
            if queue.insert(index, command) {
                Ok(())
            } else {
                Err(BattleError::CommandIndex {
                    unit: id,
                    index,
                    len: queue.len(),
                })
            }
        })
    }

    pub fn remove_command(&mut self, id: UnitId, index: usize) -> Result<MoveCommand> {
        self.edit_queue("remove_command", id, |queue| {
            let len = queue.len();
            queue.remove(index).ok_or(BattleError::CommandIndex {
                unit: id,
                index,
                len,
            })
        })
    }

    pub fn reorder_command(&mut self, id: UnitId, from: usize, to: usize) -> Result<()> {
        self.edit_queue("reorder_command", id, |queue| {
            let len = queue.len();
            if queue.reorder(from, to) {
                Ok(())
            } else {
                Err(BattleError::CommandIndex {
                    unit: id,
                    index: if from >= len { from } else { to },
                    len,
                })
            }
        })
    }

    pub fn clear_commands(&mut self, id: UnitId) -> Result<()> {
        self.edit_queue("clear_commands", id, |queue| {
            queue.clear();
            Ok(())
        })
    }

    /// Mark a unit busy while one of its commands is being dragged
    pub fn begin_edit(&mut self, id: UnitId) -> Result<()> {
        self.moving_unit_mut("begin_edit", id)?.set_editing(true);
        self.sync_aggregates();
        Ok(())
    }

    pub fn end_edit(&mut self, id: UnitId) -> Result<()> {
        self.moving_unit_mut("end_edit", id)?.set_editing(false);
        self.sync_aggregates();
        Ok(())
    }

    /// Planned trajectory of a unit's queue
    ///
    /// When the queue overruns the command budget this is the partial
    /// trajectory up to the cutoff.
    pub fn preview(&self, id: UnitId) -> Result<Trajectory> {
        let unit = self.moving_unit("preview", id)?;
        match unit.queue().cached_preview() {
            Some(trajectory) => Ok(trajectory.clone()),
            None => match unit.queue().trajectory_preview() {
                Ok(trajectory) => Ok(trajectory),
                Err(PlanError::BudgetExceeded { partial, .. }) => Ok(partial),
                Err(err) => Err(BattleError::Plan(err)),
            },
        }
    }

    /// Where the unit will stand when the next Acting phase ends
    pub fn end_of_turn_state(&self, id: UnitId) -> Result<MovementState> {
        let unit = self.moving_unit("end_of_turn_state", id)?;
        Ok(unit
            .queue()
            .end_of_turn_state(self.config.turn_period)
            .unwrap_or(*unit.queue().initial_state()))
    }

    /// First point where a unit's planned path becomes illegal
    pub fn path_violation(&self, id: UnitId) -> Result<Option<(Seconds, Violation)>> {
        let unit = self.moving_unit("path_violation", id)?;
        let trajectory = self.preview(id)?;
        Ok(self.validator.first_violation_along(
            &trajectory,
            unit.info().footprint_size(),
            TurnPhase::Moving,
        )?)
    }

    /// Freeze every queue into a trajectory and start Acting
    ///
    /// Queues that overrun the command budget commit their partial
    /// trajectory. Any other planning failure leaves the battlefield
    /// untouched.
    pub fn commit_turn(&mut self) -> Result<()> {
        let phase = self.phase();
        let UnitRoster::Moving(units) = &mut self.roster else {
            return Err(BattleError::PhaseViolation {
                operation: "commit_turn",
                phase,
            });
        };
        let parallel = units.len() >= self.config.parallel_threshold;

        // Plan stale queues up front so the commits below only read caches
        let blocked: Option<PlanError> = if parallel {
            units.par_iter_mut().find_map_first(commit_blocker)
        } else {
            units.iter_mut().find_map(commit_blocker)
        };
        if let Some(err) = blocked {
            tracing::warn!("Commit refused: {}", err);
            return Err(BattleError::Plan(err));
        }

        let moving = std::mem::take(units);
        let acting: Vec<ActingUnit> = if parallel {
            moving.into_par_iter().map(commit_unit).collect()
        } else {
            moving.into_iter().map(commit_unit).collect()
        };

        self.roster = UnitRoster::Acting(acting);
        self.elapsed = 0.0;
        self.acting_done = false;
        self.turn += 1;
        self.announce_phase(TurnPhase::Moving);
        self.revalidate_acting();
        self.sync_aggregates();
        Ok(())
    }

    // ---- Acting ----

    /// Play every committed trajectory forward by `dt`, clamped to the
    /// turn period
    pub fn tick(&mut self, dt: Seconds) -> Result<TickStatus> {
        let phase = self.phase();
        let UnitRoster::Acting(units) = &mut self.roster else {
            return Err(BattleError::PhaseViolation {
                operation: "tick",
                phase,
            });
        };
        if !dt.is_finite() || dt <= 0.0 {
            return Err(BattleError::InvalidTimeStep(dt));
        }
        if self.acting_done {
            return Ok(TickStatus::TurnComplete);
        }

        let step = dt.min(self.config.turn_period - self.elapsed);
        for unit in units.iter_mut() {
            unit.advance(step);
        }
        self.elapsed += step;
        tracing::trace!("Acting tick: +{:.3}s, t = {:.3}s", step, self.elapsed);

        self.revalidate_acting();

        let status = if self.elapsed >= self.config.turn_period - TIME_EPSILON {
            self.elapsed = self.config.turn_period;
            self.acting_done = true;
            tracing::info!("Turn {} finished acting", self.turn);
            self.events
                .emit(BattlefieldEvent::ActingDone { turn: self.turn });
            TickStatus::TurnComplete
        } else {
            TickStatus::Running
        };
        self.sync_aggregates();
        Ok(status)
    }

    /// Start the next Moving phase from where units stopped
    pub fn advance_to_next_move_turn(&mut self) -> Result<()> {
        let phase = self.phase();
        let planner = self.planner();
        let UnitRoster::Acting(units) = &mut self.roster else {
            return Err(BattleError::PhaseViolation {
                operation: "advance_to_next_move_turn",
                phase,
            });
        };
        if !self.acting_done {
            return Err(BattleError::PhaseViolation {
                operation: "advance_to_next_move_turn",
                phase,
            });
        }

        let moving: Vec<MovingUnit> = std::mem::take(units)
            .into_iter()
            .map(|unit| MovingUnit::from_acting(unit, planner))
            .collect();
        self.roster = UnitRoster::Moving(moving);
        self.elapsed = 0.0;
        self.acting_done = false;
        self.announce_phase(TurnPhase::Acting);

        for id in self.roster.ids() {
            self.revalidate_moving(id);
        }
        self.sync_aggregates();
        Ok(())
    }

    // ---- Internals ----

    fn planner(&self) -> MotionPlanner {
        MotionPlanner::new(
            self.config.command_time_budget,
            self.config.sample_delta,
            self.config.coupling,
        )
    }

    fn announce_phase(&mut self, from: TurnPhase) {
        let to = from.next();
        debug_assert_eq!(to, self.phase());
        tracing::info!("Phase changed: {} -> {} (turn {})", from, to, self.turn);
        self.events.emit(BattlefieldEvent::PhaseChanged { from, to });
    }

    fn ensure_held(&self, operation: &'static str, id: UnitId) -> Result<()> {
        if self.phase() != TurnPhase::Deploying {
            return Err(BattleError::PhaseViolation {
                operation,
                phase: self.phase(),
            });
        }
        if self.held != Some(id) {
            return Err(BattleError::NotInteracting(id));
        }
        Ok(())
    }

    fn deploying_unit_mut(&mut self, operation: &'static str, id: UnitId) -> Result<&mut DeployingUnit> {
        let phase = self.phase();
        match &mut self.roster {
            UnitRoster::Deploying(units) => units
                .iter_mut()
                .find(|unit| unit.id() == id)
                .ok_or(BattleError::UnknownUnit(id)),
            _ => Err(BattleError::PhaseViolation { operation, phase }),
        }
    }

    fn moving_unit(&self, operation: &'static str, id: UnitId) -> Result<&MovingUnit> {
        match &self.roster {
            UnitRoster::Moving(units) => units
                .iter()
                .find(|unit| unit.id() == id)
                .ok_or(BattleError::UnknownUnit(id)),
            _ => Err(BattleError::PhaseViolation {
                operation,
                phase: self.phase(),
            }),
        }
    }

    fn moving_unit_mut(&mut self, operation: &'static str, id: UnitId) -> Result<&mut MovingUnit> {
        let phase = self.phase();
        match &mut self.roster {
            UnitRoster::Moving(units) => units
                .iter_mut()
                .find(|unit| unit.id() == id)
                .ok_or(BattleError::UnknownUnit(id)),
            _ => Err(BattleError::PhaseViolation { operation, phase }),
        }
    }

    /// Apply `edit` to a copy of the unit's queue and keep it only if the
    /// copy still plans (a budget overrun is acceptable)
    fn edit_queue<T>(
        &mut self,
        operation: &'static str,
        id: UnitId,
        edit: impl FnOnce(&mut CommandQueue) -> Result<T>,
    ) -> Result<T> {
        let unit = self.moving_unit_mut(operation, id)?;
        let mut candidate = unit.queue().clone();
        let output = edit(&mut candidate)?;

        if let Err(err) = candidate.refresh_preview() {
            if !err.is_budget_exceeded() {
                tracing::debug!("{} rejected for {}: {}", operation, id, err);
                return Err(BattleError::Plan(err.clone()));
            }
            tracing::debug!("{} queue for {} overruns the budget: {}", operation, id, err);
        }
        unit.replace_queue(candidate);

        self.revalidate_moving(id);
        self.sync_aggregates();
        Ok(output)
    }

    fn revalidate_deploying(&mut self, id: UnitId) {
        let UnitRoster::Deploying(units) = &mut self.roster else {
            return;
        };
        let Some(unit) = units.iter_mut().find(|unit| unit.id() == id) else {
            return;
        };
        let valid = footprint_legal(&self.validator, unit.info(), unit.pose(), TurnPhase::Deploying);
        if unit.set_valid(valid) {
            record_validity(&mut self.events, id, valid);
        }
    }

    /// Refresh the unit's preview and check every sample of it
    ///
    /// A moving unit is judged by its orders, not its pose: standing
    /// somewhere legal with orders that cross terrain makes it invalid
    /// until the orders change.
    fn revalidate_moving(&mut self, id: UnitId) {
        let UnitRoster::Moving(units) = &mut self.roster else {
            return;
        };
        let Some(unit) = units.iter_mut().find(|unit| unit.id() == id) else {
            return;
        };
        unit.queue_mut().ensure_preview();
        let valid = preview_legal(&self.validator, unit);
        if unit.set_valid(valid) {
            record_validity(&mut self.events, id, valid);
        }
    }

    fn revalidate_acting(&mut self) {
        let UnitRoster::Acting(units) = &mut self.roster else {
            return;
        };
        for unit in units.iter_mut() {
            let valid = footprint_legal(&self.validator, unit.info(), unit.pose(), TurnPhase::Acting);
            if unit.set_valid(valid) {
                record_validity(&mut self.events, unit.id(), valid);
            }
        }
    }

    fn sync_aggregates(&mut self) {
        let valid = self.roster.all_valid();
        if valid != self.reported_valid {
            self.reported_valid = valid;
            tracing::debug!("Battlefield validity: {}", valid);
            self.events.emit(BattlefieldEvent::ValidityChanged { valid });
        }

        let busy = self.roster.any_busy();
        if busy != self.reported_busy {
            self.reported_busy = busy;
            self.events.emit(BattlefieldEvent::BusyChanged { busy });
        }
    }
}

impl std::fmt::Debug for Battlefield {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battlefield")
            .field("phase", &self.phase())
            .field("turn", &self.turn)
            .field("elapsed", &self.elapsed)
            .field("units", &self.roster.len())
            .field("held", &self.held)
            .finish()
    }
}

/// Footprint legality; a geometry error marks the unit invalid
fn footprint_legal(validator: &ZoneValidator, info: &UnitInfo, pose: Pose, phase: TurnPhase) -> bool {
    match validator.classify(&info.footprint_size().at(pose), phase) {
        Ok(legality) => legality.is_valid(),
        Err(err) => {
            tracing::warn!("Footprint check failed for {}: {}", info.id, err);
            false
        }
    }
}

/// Every sample of the cached preview must be legal
fn preview_legal(validator: &ZoneValidator, unit: &MovingUnit) -> bool {
    let Some(trajectory) = unit.queue().cached_preview() else {
        return footprint_legal(validator, unit.info(), unit.pose(), TurnPhase::Moving);
    };
    match validator.first_violation_along(trajectory, unit.info().footprint_size(), TurnPhase::Moving) {
        Ok(None) => true,
        Ok(Some((time, violation))) => {
            tracing::debug!("{} orders become illegal at {:.2}s: {}", unit.id(), time, violation);
            false
        }
        Err(err) => {
            tracing::warn!("Path check failed for {}: {}", unit.id(), err);
            false
        }
    }
}

/// Planning error that would stop `unit` from committing
fn commit_blocker(unit: &mut MovingUnit) -> Option<PlanError> {
    match unit.queue_mut().ensure_preview() {
        Err(err) if !err.is_budget_exceeded() => Some(err.clone()),
        _ => None,
    }
}

/// Commit a unit's queue; its preview must already be cached
fn commit_unit(unit: MovingUnit) -> ActingUnit {
    let (info, valid, queue) = unit.into_parts();
    let initial = *queue.initial_state();
    let trajectory = match queue.commit() {
        Ok(trajectory) => trajectory,
        Err(PlanError::BudgetExceeded {
            required,
            budget,
            partial,
        }) => {
            tracing::warn!(
                "{} needs {:.2}s for a command but the budget is {:.2}s, committing partial path",
                info.id,
                required,
                budget
            );
            partial
        }
        Err(err) => {
            tracing::error!("{} lost its orders at commit: {}", info.id, err);
            Trajectory::stationary(initial)
        }
    };
    ActingUnit::new(info, trajectory, valid)
}

fn record_validity(events: &mut EventBus, unit: UnitId, valid: bool) {
    tracing::debug!("{} is now {}", unit, if valid { "valid" } else { "invalid" });
    events.emit(BattlefieldEvent::UnitValidityChanged { unit, valid });
}
