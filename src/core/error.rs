use thiserror::Error;

use crate::battle::phase::TurnPhase;
use crate::battle::zones::GeometryError;
use crate::core::config::ConfigError;
use crate::core::types::UnitId;
use crate::motion::planner::PlanError;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("{operation} is not allowed during the {phase:?} phase")]
    PhaseViolation {
        operation: &'static str,
        phase: TurnPhase,
    },

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unit not found: {0}")]
    UnknownUnit(UnitId),

    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    #[error("{held} is already held by a placement interaction")]
    InteractionInProgress { held: UnitId },

    #[error("{0} is not being placed")]
    NotInteracting(UnitId),

    #[error("Deployment has invalid units: {units:?}")]
    InvalidDeployment { units: Vec<UnitId> },

    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f64),

    #[error("Command index {index} out of range for {unit} ({len} queued)")]
    CommandIndex {
        unit: UnitId,
        index: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, BattleError>;
