//! Turn phases

use serde::{Deserialize, Serialize};

/// Phase of the battlefield turn cycle
///
/// Deploying happens once; the battle then alternates Moving and Acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Deploying, // Placing units in the deploy zone
    Moving, // Issuing orders
    Acting, // Orders play out for one turn period
}

impl TurnPhase {
    /// Phase that follows this one
    pub fn next(self) -> TurnPhase {
        match self {
            TurnPhase::Deploying => TurnPhase::Moving,
            TurnPhase::Moving => TurnPhase::Acting,
            TurnPhase::Acting => TurnPhase::Moving,
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnPhase::Deploying => "deploying",
            TurnPhase::Moving => "moving",
            TurnPhase::Acting => "acting",
        };
        f.write_str(name)
    }
}
