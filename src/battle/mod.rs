//! Battle system - deployment, orders and turn playback
//!
//! A battle is a cycle of phases over one set of units:
//! - Deploying: units are placed inside the deploy zone
//! - Moving: each unit receives an ordered queue of movement commands
//! - Acting: committed trajectories play out for one turn period
//!
//! Zone geometry is static; unit legality is checked against it after
//! every change.

pub mod battlefield;
pub mod constants;
pub mod events;
pub mod phase;
pub mod scenario;
pub mod unit_type;
pub mod units;
pub mod zones;

// Re-exports for convenient access
pub use battlefield::{Battlefield, TickStatus};
pub use constants::*;
pub use events::{BattlefieldEvent, EventBus};
pub use phase::TurnPhase;
pub use scenario::{Scenario, ScenarioReport, TurnReport, UnitDeployment, ZoneSpec};
pub use unit_type::{UnitCatalog, UnitTypeSpec};
pub use units::{ActingUnit, DeployingUnit, MovingUnit, Unit, UnitInfo, UnitRoster, UnitView};
pub use zones::{
    Footprint, FootprintSize, GeometryError, Legality, Violation, Zone, ZoneKind, ZoneMap,
    ZoneValidator,
};
