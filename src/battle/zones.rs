//! Static zone geometry and footprint legality
//!
//! Zones are supplied once when the battlefield is built and never change.
//! A unit is legal when its footprint rectangle avoids the zones its phase
//! forbids (and, while deploying, touches the deploy zone). Overlap is
//! geometric intersection; touching a boundary counts.

use geo::{Area, Centroid, Intersects};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use glam::DVec2;
use thiserror::Error;

use crate::battle::phase::TurnPhase;
use crate::core::types::{Pose, Seconds};
use crate::motion::trajectory::Trajectory;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Zone '{zone}' has {count} distinct vertices, need at least 3")]
    TooFewVertices { zone: String, count: usize },

    #[error("Zone '{zone}' has non-finite coordinates")]
    NonFinite { zone: String },

    #[error("Zone '{zone}' has zero area")]
    ZeroArea { zone: String },

    #[error("Degenerate footprint: {0}")]
    DegenerateFootprint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    Deploy,
    EnemyDeploy,
    Battle,
    OutOfBounds,
    Neutral,
    Terrain,
}

/// Closed polygon from `[x, y]` vertices
pub fn polygon_from_vertices(vertices: &[[f64; 2]]) -> Polygon<f64> {
    Polygon::new(LineString::from(vertices.to_vec()), vec![])
}

/// Named static region
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    name: String,
    kind: ZoneKind,
    shape: MultiPolygon<f64>,
}

impl Zone {
    /// Build a zone, rejecting malformed polygons
    ///
    /// An empty shape is allowed and overlaps nothing.
    pub fn new(
        name: impl Into<String>,
        kind: ZoneKind,
        shape: MultiPolygon<f64>,
    ) -> Result<Self, GeometryError> {
        let name = name.into();
        for polygon in &shape.0 {
            check_polygon(&name, polygon)?;
        }
        Ok(Self { name, kind, shape })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty()
    }

    /// Does `polygon` intersect this zone (boundary contact included)?
    pub fn overlaps(&self, polygon: &Polygon<f64>) -> bool {
        !self.is_empty() && self.shape.intersects(polygon)
    }
}

fn check_polygon(zone: &str, polygon: &Polygon<f64>) -> Result<(), GeometryError> {
    let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
    for ring in rings {
        if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(GeometryError::NonFinite { zone: zone.into() });
        }
    }

    let mut distinct: Vec<Coord<f64>> = Vec::new();
    for coord in polygon.exterior().coords() {
        if !distinct.contains(coord) {
            distinct.push(*coord);
        }
    }
    if distinct.len() < 3 {
        return Err(GeometryError::TooFewVertices {
            zone: zone.into(),
            count: distinct.len(),
        });
    }

    if polygon.unsigned_area() <= 0.0 {
        return Err(GeometryError::ZeroArea { zone: zone.into() });
    }
    Ok(())
}

/// All static zones of one battlefield
#[derive(Debug, Clone)]
pub struct ZoneMap {
    deploy: Zone,
    enemy_deploy: Zone,
    battle: Zone,
    out_of_bounds: Zone,
    neutral: Zone,
    terrain: Vec<Zone>,
    deploy_centroid: DVec2,
}

impl ZoneMap {
    /// Validate every zone; the deploy zone must have area
    pub fn new(
        deploy: MultiPolygon<f64>,
        enemy_deploy: MultiPolygon<f64>,
        battle: MultiPolygon<f64>,
        out_of_bounds: MultiPolygon<f64>,
        neutral: MultiPolygon<f64>,
        terrain: Vec<(String, MultiPolygon<f64>)>,
    ) -> Result<Self, GeometryError> {
        let deploy = Zone::new("deploy", ZoneKind::Deploy, deploy)?;
        let deploy_centroid = deploy
            .shape
            .centroid()
            .map(|point| DVec2::new(point.x(), point.y()))
            .ok_or_else(|| GeometryError::TooFewVertices {
                zone: "deploy".into(),
                count: 0,
            })?;

        let terrain = terrain
            .into_iter()
            .map(|(name, shape)| Zone::new(name, ZoneKind::Terrain, shape))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            deploy,
            enemy_deploy: Zone::new("enemy_deploy", ZoneKind::EnemyDeploy, enemy_deploy)?,
            battle: Zone::new("battle", ZoneKind::Battle, battle)?,
            out_of_bounds: Zone::new("out_of_bounds", ZoneKind::OutOfBounds, out_of_bounds)?,
            neutral: Zone::new("neutral", ZoneKind::Neutral, neutral)?,
            terrain,
            deploy_centroid,
        })
    }

    pub fn deploy(&self) -> &Zone {
        &self.deploy
    }

    pub fn enemy_deploy(&self) -> &Zone {
        &self.enemy_deploy
    }

    pub fn battle(&self) -> &Zone {
        &self.battle
    }

    pub fn out_of_bounds(&self) -> &Zone {
        &self.out_of_bounds
    }

    pub fn neutral(&self) -> &Zone {
        &self.neutral
    }

    pub fn terrain(&self) -> &[Zone] {
        &self.terrain
    }

    /// Where newly requested units appear
    pub fn deploy_centroid(&self) -> DVec2 {
        self.deploy_centroid
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        [
            &self.deploy,
            &self.enemy_deploy,
            &self.battle,
            &self.out_of_bounds,
            &self.neutral,
        ]
        .into_iter()
        .chain(self.terrain.iter())
    }
}

/// Width × depth of a unit's rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintSize {
    /// Across the facing
    pub width: f64,
    /// Along the facing
    pub depth: f64,
}

impl FootprintSize {
    pub fn new(width: f64, depth: f64) -> Self {
        Self { width, depth }
    }

    pub fn at(self, pose: Pose) -> Footprint {
        Footprint { pose, size: self }
    }
}

/// A unit's rectangle centred on its position and rotated by its heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub pose: Pose,
    pub size: FootprintSize,
}

impl Footprint {
    pub fn validate(&self) -> Result<(), GeometryError> {
        let FootprintSize { width, depth } = self.size;
        if !(width.is_finite() && depth.is_finite() && width > 0.0 && depth > 0.0) {
            return Err(GeometryError::DegenerateFootprint(format!(
                "size {} x {}",
                width, depth
            )));
        }
        if !self.pose.is_finite() {
            return Err(GeometryError::DegenerateFootprint(format!(
                "pose {:?}",
                self.pose
            )));
        }
        Ok(())
    }

    /// Corners counter-clockwise, starting front-right
    pub fn corners(&self) -> [DVec2; 4] {
        let forward = DVec2::from_angle(self.pose.rotation) * (self.size.depth / 2.0);
        let left = forward.perp().normalize_or_zero() * (self.size.width / 2.0);
        let c = self.pose.position;
        [
            c + forward - left,
            c + forward + left,
            c - forward + left,
            c - forward - left,
        ]
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        let vertices: Vec<[f64; 2]> = self.corners().iter().map(|c| [c.x, c.y]).collect();
        polygon_from_vertices(&vertices)
    }
}

/// Rule a footprint broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    OutsideDeployZone,
    OutOfBounds,
    NeutralZone,
    Terrain(String),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::OutsideDeployZone => write!(f, "outside the deploy zone"),
            Violation::OutOfBounds => write!(f, "out of bounds"),
            Violation::NeutralZone => write!(f, "inside the neutral zone"),
            Violation::Terrain(name) => write!(f, "overlaps terrain '{}'", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Legality {
    Valid,
    Invalid(Violation),
}

impl Legality {
    pub fn is_valid(&self) -> bool {
        matches!(self, Legality::Valid)
    }
}

/// Checks footprints against a zone map
#[derive(Debug, Clone)]
pub struct ZoneValidator {
    zones: ZoneMap,
}

impl ZoneValidator {
    pub fn new(zones: ZoneMap) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    /// Legality of `footprint` under the rules of `phase`
    ///
    /// Deploying: must touch the deploy zone and avoid out-of-bounds,
    /// neutral and terrain. Moving and Acting: must avoid out-of-bounds
    /// and terrain.
    pub fn classify(&self, footprint: &Footprint, phase: TurnPhase) -> Result<Legality, GeometryError> {
        footprint.validate()?;
        let polygon = footprint.to_polygon();
        let deploying = phase == TurnPhase::Deploying;

        if deploying && !self.zones.deploy.overlaps(&polygon) {
            return Ok(Legality::Invalid(Violation::OutsideDeployZone));
        }
        if self.zones.out_of_bounds.overlaps(&polygon) {
            return Ok(Legality::Invalid(Violation::OutOfBounds));
        }
        if deploying && self.zones.neutral.overlaps(&polygon) {
            return Ok(Legality::Invalid(Violation::NeutralZone));
        }
        if let Some(zone) = self.zones.terrain.iter().find(|zone| zone.overlaps(&polygon)) {
            return Ok(Legality::Invalid(Violation::Terrain(zone.name.clone())));
        }
        Ok(Legality::Valid)
    }

    /// Time and cause of the first illegal sample along `trajectory`
    pub fn first_violation_along(
        &self,
        trajectory: &Trajectory,
        size: FootprintSize,
        phase: TurnPhase,
    ) -> Result<Option<(Seconds, Violation)>, GeometryError> {
        for sample in trajectory.samples() {
            let footprint = size.at(sample.state.pose());
            if let Legality::Invalid(violation) = self.classify(&footprint, phase)? {
                return Ok(Some((sample.time, violation)));
            }
        }
        Ok(None)
    }
}
