//! Battlefield configuration with documented defaults
//!
//! Loaded from TOML. Every tunable the turn controller and the motion
//! planner read lives here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::constants::{
    DEFAULT_COMMAND_TIME_BUDGET, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_SAMPLE_DELTA,
    DEFAULT_TURN_PERIOD,
};
use crate::battle::unit_type::UnitCatalog;
use crate::motion::command::CouplingPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Whether leaving deployment requires every deployed unit to be legal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentGate {
    /// Advance regardless of unit validity (the UI decides)
    #[default]
    Permissive,
    /// Refuse to advance while any deploying unit is invalid
    RequireValid,
}

/// Configuration for one battlefield
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattlefieldConfig {
    /// Length of the Acting phase in seconds
    ///
    /// Trajectories longer than this are cut off at the wall; the
    /// unplayed remainder is discarded.
    pub turn_period: f64,

    /// Fixed sampling step for planned trajectories (seconds)
    ///
    /// Smaller = smoother previews, more samples per command.
    pub sample_delta: f64,

    /// Time budget handed to the planner for each queued command
    ///
    /// Commands that need longer than this report `BudgetExceeded`.
    /// Kept well above `turn_period` so long orders still preview.
    pub command_time_budget: f64,

    /// How Wheel and Reposition combine turning and moving
    pub coupling: CouplingPolicy,

    /// Deployment legality gating for `advance_to_move`
    pub deployment_gate: DeploymentGate,

    /// Minimum unit count before committing plans on the rayon pool
    ///
    /// Below this, thread overhead exceeds the planning cost.
    pub parallel_threshold: usize,

    /// Unit types available for deployment
    pub unit_types: UnitCatalog,
}

impl Default for BattlefieldConfig {
    fn default() -> Self {
        Self {
            turn_period: DEFAULT_TURN_PERIOD,
            sample_delta: DEFAULT_SAMPLE_DELTA,
            command_time_budget: DEFAULT_COMMAND_TIME_BUDGET,
            coupling: CouplingPolicy::default(),
            deployment_gate: DeploymentGate::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            unit_types: UnitCatalog::default(),
        }
    }
}

impl BattlefieldConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BattlefieldConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.turn_period.is_finite() && self.turn_period > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "turn_period must be positive, got {}",
                self.turn_period
            )));
        }

        if !(self.sample_delta.is_finite() && self.sample_delta > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sample_delta must be positive, got {}",
                self.sample_delta
            )));
        }

        // The planner rejects a step larger than its budget
        if !self.command_time_budget.is_finite() || self.command_time_budget < self.sample_delta {
            return Err(ConfigError::Invalid(format!(
                "command_time_budget ({}) must be >= sample_delta ({})",
                self.command_time_budget, self.sample_delta
            )));
        }

        if self.parallel_threshold == 0 {
            return Err(ConfigError::Invalid("parallel_threshold must be at least 1".into()));
        }

        self.unit_types.validate()
    }
}
