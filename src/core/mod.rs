pub mod config;
pub mod error;
pub mod types;

pub use config::{BattlefieldConfig, ConfigError, DeploymentGate};
pub use error::{BattleError, Result};
pub use types::{Pose, Seconds, UnitId};
