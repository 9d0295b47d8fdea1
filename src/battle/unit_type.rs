//! Unit types and their default properties
//!
//! A unit type fixes the footprint a unit occupies and the kinematic
//! limits its orders are planned with.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::constants::*;
use crate::core::config::ConfigError;
use crate::motion::mobility::MobilityProfile;

/// Properties shared by every unit of one type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitTypeSpec {
    /// Frontage, along the facing's perpendicular
    pub width: f64,
    /// Extent along the facing
    pub depth: f64,
    pub mobility: MobilityProfile,
}

impl UnitTypeSpec {
    pub fn infantry() -> Self {
        Self {
            width: INFANTRY_WIDTH,
            depth: INFANTRY_DEPTH,
            mobility: MobilityProfile::new(
                INFANTRY_SPEED,
                INFANTRY_ACCELERATION,
                INFANTRY_TURN_RATE,
                INFANTRY_TURN_ACCELERATION,
            ),
        }
    }

    pub fn cavalry() -> Self {
        Self {
            width: CAVALRY_WIDTH,
            depth: CAVALRY_DEPTH,
            mobility: MobilityProfile::new(
                CAVALRY_SPEED,
                CAVALRY_ACCELERATION,
                CAVALRY_TURN_RATE,
                CAVALRY_TURN_ACCELERATION,
            ),
        }
    }
}

/// Unit type name → properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCatalog {
    types: AHashMap<String, UnitTypeSpec>,
}

impl Default for UnitCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog.insert("infantry", UnitTypeSpec::infantry());
        catalog.insert("cavalry", UnitTypeSpec::cavalry());
        catalog
    }
}

impl UnitCatalog {
    pub fn empty() -> Self {
        Self {
            types: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: UnitTypeSpec) {
        self.types.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&UnitTypeSpec> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Sorted type names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in self.names() {
            let Some(spec) = self.types.get(name) else {
                continue;
            };
            if !(spec.width.is_finite() && spec.width > 0.0 && spec.depth.is_finite() && spec.depth > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "unit type '{}' needs a positive footprint, got {} x {}",
                    name, spec.width, spec.depth
                )));
            }
            spec.mobility
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("unit type '{}': {}", name, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = UnitCatalog::default();
        assert_eq!(catalog.names(), vec!["cavalry", "infantry"]);
        assert!(catalog.validate().is_ok());

        let cavalry = catalog.get("cavalry").unwrap();
        let infantry = catalog.get("infantry").unwrap();
        // Cavalry should be faster than infantry
        assert!(cavalry.mobility.max_linear_velocity > infantry.mobility.max_linear_velocity);
    }

    #[test]
    fn test_rejects_negative_mobility() {
        let mut catalog = UnitCatalog::empty();
        let mut spec = UnitTypeSpec::infantry();
        spec.mobility.max_angular_velocity = -1.0;
        catalog.insert("broken", spec);
        assert!(matches!(catalog.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_flat_footprint() {
        let mut catalog = UnitCatalog::empty();
        let mut spec = UnitTypeSpec::cavalry();
        spec.depth = 0.0;
        catalog.insert("flat", spec);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog: UnitCatalog = toml::from_str(
            r#"
            [archers]
            width = 6.0
            depth = 1.5
            mobility = { max_linear_velocity = 1.2, max_linear_acceleration = 0.6, max_angular_velocity = 0.5, max_angular_acceleration = 0.25 }
            "#,
        )
        .expect("catalog should parse");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("archers").unwrap().width, 6.0);
        assert!(catalog.get("infantry").is_none());
    }
}
