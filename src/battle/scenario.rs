//! Headless scenarios: zones, deployments and per-turn orders in TOML
//!
//! A scenario drives a [`Battlefield`] through deployment and a fixed
//! number of turns with no user in the loop, and reports what happened.

use std::fs;
use std::path::Path;

use geo_types::MultiPolygon;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::battle::battlefield::{Battlefield, TickStatus};
use crate::battle::events::BattlefieldEvent;
use crate::battle::units::UnitView;
use crate::battle::zones::{polygon_from_vertices, GeometryError, ZoneMap};
use crate::core::config::{BattlefieldConfig, ConfigError};
use crate::core::error::Result;
use crate::core::types::{Pose, Seconds, UnitId};
use crate::motion::command::MoveCommand;

fn default_tick() -> Seconds {
    0.1
}

/// Polygons as lists of `[x, y]` vertices
pub type PolygonSpec = Vec<[f64; 2]>;

fn to_shape(polygons: &[PolygonSpec]) -> MultiPolygon<f64> {
    MultiPolygon::new(polygons.iter().map(|p| polygon_from_vertices(p)).collect())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerrainSpec {
    pub name: String,
    pub polygons: Vec<PolygonSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSpec {
    pub deploy: Vec<PolygonSpec>,
    pub enemy_deploy: Vec<PolygonSpec>,
    pub battle: Vec<PolygonSpec>,
    pub out_of_bounds: Vec<PolygonSpec>,
    pub neutral: Vec<PolygonSpec>,
    pub terrain: Vec<TerrainSpec>,
}

impl ZoneSpec {
    pub fn to_zone_map(&self) -> std::result::Result<ZoneMap, GeometryError> {
        ZoneMap::new(
            to_shape(&self.deploy),
            to_shape(&self.enemy_deploy),
            to_shape(&self.battle),
            to_shape(&self.out_of_bounds),
            to_shape(&self.neutral),
            self.terrain
                .iter()
                .map(|t| (t.name.clone(), to_shape(&t.polygons)))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnOrders {
    pub orders: Vec<MoveCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDeployment {
    pub unit_type: String,
    pub position: [f64; 2],
    #[serde(default)]
    pub rotation: f64,
    /// Orders for each turn, first turn first
    #[serde(default)]
    pub turns: Vec<TurnOrders>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Turns to play; defaults to the longest order list
    #[serde(default)]
    pub turns: Option<u32>,
    /// Acting phase step
    #[serde(default = "default_tick")]
    pub tick: Seconds,
    #[serde(default)]
    pub config: BattlefieldConfig,
    pub zones: ZoneSpec,
    #[serde(default)]
    pub units: Vec<UnitDeployment>,
}

/// Planned path of one unit at commit time
#[derive(Debug, Clone, Serialize)]
pub struct PlannedPath {
    pub unit: UnitId,
    pub commands: Vec<&'static str>,
    pub duration: Seconds,
    pub samples: usize,
    pub end_of_turn: Pose,
    /// Time and reason the path first becomes illegal
    pub violation: Option<(Seconds, String)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub turn: u32,
    pub planned: Vec<PlannedPath>,
    pub units: Vec<UnitView>,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub deployment: Vec<UnitView>,
    pub turns: Vec<TurnReport>,
    pub events: Vec<BattlefieldEvent>,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, ConfigError> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.config.validate()?;
        if !(scenario.tick.is_finite() && scenario.tick > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick must be positive, got {}",
                scenario.tick
            )));
        }
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn turn_count(&self) -> u32 {
        self.turns.unwrap_or_else(|| {
            self.units
                .iter()
                .map(|unit| unit.turns.len() as u32)
                .max()
                .unwrap_or(0)
                .max(1)
        })
    }

    /// Deploy every unit, then play each turn to the end of its Acting phase
    pub fn run(&self) -> Result<ScenarioReport> {
        let mut battlefield = Battlefield::new(self.config.clone(), self.zones.to_zone_map()?)?;
        tracing::info!("Running scenario '{}'", self.name);

        let mut ids = Vec::with_capacity(self.units.len());
        for deployment in &self.units {
            let id = battlefield.request_deploy(&deployment.unit_type)?;
            let [x, y] = deployment.position;
            battlefield.drag_to(id, DVec2::new(x, y), deployment.rotation)?;
            battlefield.place(id)?;
            ids.push(id);
        }
        let deployment = battlefield.units();
        battlefield.advance_to_move()?;

        let mut turns = Vec::new();
        for turn in 0..self.turn_count() {
            if turn > 0 {
                battlefield.advance_to_next_move_turn()?;
            }

            let mut planned = Vec::with_capacity(ids.len());
            for (id, deployment) in ids.iter().zip(&self.units) {
                if let Some(orders) = deployment.turns.get(turn as usize) {
                    for command in &orders.orders {
                        battlefield.append_command(*id, *command)?;
                    }
                }
                let preview = battlefield.preview(*id)?;
                planned.push(PlannedPath {
                    unit: *id,
                    commands: deployment
                        .turns
                        .get(turn as usize)
                        .map(|o| o.orders.iter().map(MoveCommand::name).collect())
                        .unwrap_or_default(),
                    duration: preview.duration(),
                    samples: preview.len(),
                    end_of_turn: battlefield.end_of_turn_state(*id)?.pose(),
                    violation: battlefield
                        .path_violation(*id)?
                        .map(|(time, violation)| (time, violation.to_string())),
                });
            }

            battlefield.commit_turn()?;
            while battlefield.tick(self.tick)? == TickStatus::Running {}

            turns.push(TurnReport {
                turn: battlefield.turn(),
                planned,
                units: battlefield.units(),
                valid: battlefield.is_valid(),
            });
        }

        Ok(ScenarioReport {
            scenario: self.name.clone(),
            deployment,
            turns,
            events: battlefield.drain_events(),
        })
    }
}
