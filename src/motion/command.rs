//! Movement commands (pure data)
//!
//! Commands describe where a unit wants to end up relative to the state it
//! starts the command from. The planner decides how it gets there.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// One queued movement order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveCommand {
    /// Move by `offset` without changing heading
    Translate { offset: DVec2 },
    /// Turn in place to the absolute heading `target` (radians)
    Rotate { target: f64 },
    /// Move by `offset`, ending facing the direction of travel
    Wheel { offset: DVec2 },
    /// Move by `offset`, ending facing along `direction`
    Reposition { offset: DVec2, direction: DVec2 },
}

impl MoveCommand {
    pub fn translate(offset: DVec2) -> Self {
        MoveCommand::Translate { offset }
    }

    pub fn rotate(target: f64) -> Self {
        MoveCommand::Rotate { target }
    }

    pub fn wheel(offset: DVec2) -> Self {
        MoveCommand::Wheel { offset }
    }

    pub fn reposition(offset: DVec2, direction: DVec2) -> Self {
        MoveCommand::Reposition { offset, direction }
    }

    /// Short label for logs and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            MoveCommand::Translate { .. } => "translate",
            MoveCommand::Rotate { .. } => "rotate",
            MoveCommand::Wheel { .. } => "wheel",
            MoveCommand::Reposition { .. } => "reposition",
        }
    }
}

/// How Wheel and Reposition combine turning with moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingPolicy {
    /// Turn to face the travel direction, move, then turn to the final
    /// direction (Reposition only)
    #[default]
    Sequential,
    /// Turn and move at the same time, each axis on its own profile
    Simultaneous,
}
