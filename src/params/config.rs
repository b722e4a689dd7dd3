//! TOML configuration file support.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ocean::OceanParams;
use crate::ocean::{InfluenceMap, InfluenceMaps};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete on-disk ocean description
///
/// ```toml
/// base_height = 0.0
///
/// [ocean]
/// grid_size = 64
/// wind_factor = [32.0, 32.0]
///
/// [[influence]]
/// center = [0.0, 0.0, 0.0]
/// radius = 12.0
/// falloff = "squared"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanConfig {
    pub ocean: OceanParams,

    /// Height influence maps blend toward (world units)
    pub base_height: f32,

    pub influence: Vec<InfluenceMap>,
}

impl OceanConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a config document; parameters are sanitized after parsing
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.ocean = config.ocean.sanitized();
        Ok(config)
    }

    /// Build the influence registry described by this config
    pub fn influence_maps(&self) -> InfluenceMaps {
        let mut maps = InfluenceMaps::new(self.base_height);
        for map in &self.influence {
            maps.add(map.clone());
        }
        maps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::Falloff;
    use crate::params::ConjugateSampling;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = OceanConfig::from_toml_str(
            r#"
            base_height = 1.5

            [ocean]
            grid_size = 32
            wind_factor = [58.0, 58.0]
            conjugate_sampling = "same"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_height, 1.5);
        assert_eq!(config.ocean.grid_size, 32);
        assert_eq!(config.ocean.wind_factor, Vec2::new(58.0, 58.0));
        assert_eq!(config.ocean.conjugate_sampling, ConjugateSampling::Same);
        assert_eq!(
            config.ocean.gravitational_pull,
            OceanParams::default().gravitational_pull
        );
        assert!(config.influence.is_empty());
    }

    #[test]
    fn test_influence_maps_parsed() {
        let config = OceanConfig::from_toml_str(
            r#"
            [[influence]]
            center = [4.0, 0.0, -2.0]
            radius = 12.0
            falloff = "logarithmic"

            [[influence]]
            radius = 3.0
            active = false
            "#,
        )
        .unwrap();

        let maps = config.influence_maps();
        assert_eq!(maps.len(), 2);
        let first = maps.get(0).unwrap();
        assert_eq!(first.center, Vec3::new(4.0, 0.0, -2.0));
        assert_eq!(first.falloff, Falloff::Logarithmic);
        assert_eq!(first.intensity, 1.0);
        assert!(!maps.get(1).unwrap().active);
    }

    #[test]
    fn test_invalid_values_are_sanitized_not_rejected() {
        let config = OceanConfig::from_toml_str(
            r#"
            [ocean]
            grid_size = 100
            instance_count = -3
            "#,
        )
        .unwrap();
        assert_eq!(config.ocean.grid_size, 64);
        assert_eq!(config.ocean.instance_count, 1);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let result = OceanConfig::from_toml_str("[ocean\ngrid_size = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = OceanConfig::load_from_file("/nonexistent/tidemill.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
