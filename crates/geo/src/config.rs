//! # Geospatial Project Configuration
//!
//! Parses `geo.toml`, the declarative config for a geowalk scene. Every field
//! has a default, so a missing or partial file still yields the reference
//! scene (Las Palmas de Gran Canaria, Mesa y López).
//!
//! ## Table of Contents
//! 1. GeoConfig — Top-level project config
//! 2. GeoWindow — Geographic bounding window
//! 3. WorldConfig — Scene scale
//! 4. DataConfig — Dataset and ground texture
//! 5. EnvironmentConfig — Day/night cycle
//! 6. Parsing

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// 1. GeoConfig — Top-level project config
// ============================================================================

/// Top-level project configuration, parsed from `geo.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Resource, Default)]
pub struct GeoConfig {
    /// Project metadata
    #[serde(default)]
    pub project: GeoProjectConfig,
    /// Geographic window mapped onto the ground plane
    #[serde(default)]
    pub window: GeoWindow,
    /// Scene scale
    #[serde(default)]
    pub world: WorldConfig,
    /// Dataset and texture sources
    #[serde(default)]
    pub data: DataConfig,
    /// Day/night cycle
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Directory containing geo.toml, used to resolve relative paths
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Project-level metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoProjectConfig {
    /// Human-readable project name
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for GeoProjectConfig {
    fn default() -> Self {
        Self { name: default_project_name() }
    }
}

fn default_project_name() -> String {
    "Las Palmas de Gran Canaria - Mesa y López".to_string()
}

// ============================================================================
// 2. GeoWindow — Geographic bounding window
// ============================================================================

/// Longitude/latitude window (WGS84 degrees) stretched over the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoWindow {
    #[serde(default = "default_min_lon")]
    pub min_lon: f64,
    #[serde(default = "default_max_lon")]
    pub max_lon: f64,
    #[serde(default = "default_min_lat")]
    pub min_lat: f64,
    #[serde(default = "default_max_lat")]
    pub max_lat: f64,
}

impl Default for GeoWindow {
    fn default() -> Self {
        Self {
            min_lon: default_min_lon(),
            max_lon: default_max_lon(),
            min_lat: default_min_lat(),
            max_lat: default_max_lat(),
        }
    }
}

fn default_min_lon() -> f64 { -15.46945 }
fn default_max_lon() -> f64 { -15.39203 }
fn default_min_lat() -> f64 { 28.07653 }
fn default_max_lat() -> f64 { 28.18235 }

// ============================================================================
// 3. WorldConfig — Scene scale
// ============================================================================

/// Scene scale settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Base map scale (plane height = base_scale × world_scale)
    #[serde(default = "default_base_scale")]
    pub base_scale: f32,
    /// Multiplier applied to every scene-space size
    #[serde(default = "default_world_scale")]
    pub world_scale: f32,
    /// Plane aspect ratio used when the ground texture cannot be read
    #[serde(default = "default_aspect")]
    pub fallback_aspect: f32,
    /// Fixed RNG seed for building heights and synthetic data (entropy if unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            base_scale: default_base_scale(),
            world_scale: default_world_scale(),
            fallback_aspect: default_aspect(),
            seed: None,
        }
    }
}

fn default_base_scale() -> f32 { 150.0 }
fn default_world_scale() -> f32 { 5.0 }
fn default_aspect() -> f32 { 1.5 }

// ============================================================================
// 4. DataConfig — Dataset and ground texture
// ============================================================================

/// Dataset and ground texture locations (relative to geo.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// OSM XML dataset
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Ground map image draped over the plane
    #[serde(default = "default_ground_texture")]
    pub ground_texture: String,
    /// Number of synthetic buildings generated when the dataset is unavailable
    #[serde(default = "default_fallback_buildings")]
    pub fallback_buildings: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            ground_texture: default_ground_texture(),
            fallback_buildings: default_fallback_buildings(),
        }
    }
}

fn default_dataset() -> String { "mapLPGC_MyL2025.osm".to_string() }
fn default_ground_texture() -> String { "mapaLPGC.png".to_string() }
fn default_fallback_buildings() -> usize { 15 }

// ============================================================================
// 5. EnvironmentConfig — Day/night cycle
// ============================================================================

/// Day/night cycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Length of one full day in wall-clock seconds
    #[serde(default = "default_cycle_secs")]
    pub cycle_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self { cycle_secs: default_cycle_secs() }
    }
}

fn default_cycle_secs() -> u64 { 3 * 60 }

impl EnvironmentConfig {
    /// Cycle length as a Duration (never zero)
    pub fn cycle_duration(&self) -> Duration {
        Duration::from_secs(self.cycle_secs.max(1))
    }
}

// ============================================================================
// 6. Parsing
// ============================================================================

impl GeoConfig {
    /// Load a GeoConfig from a `geo.toml` file path
    pub fn load(path: &Path) -> Result<Self, GeoConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| GeoConfigError::Io { path: path.to_path_buf(), source })?;
        let mut config: GeoConfig = toml::from_str(&content)
            .map_err(|source| GeoConfigError::Parse { path: path.to_path_buf(), source })?;
        config.base_dir = path.parent().map(|p| p.to_path_buf());
        Ok(config)
    }

    /// Resolve a path from geo.toml relative to the config directory
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(relative),
            None => PathBuf::from(relative),
        }
    }

    /// Absolute location of the OSM dataset
    pub fn dataset_path(&self) -> PathBuf {
        self.resolve_path(&self.data.dataset)
    }

    /// Absolute location of the ground texture
    pub fn ground_texture_path(&self) -> PathBuf {
        self.resolve_path(&self.data.ground_texture)
    }

    /// Plane height in scene units (the plane's Z extent)
    pub fn plane_height(&self) -> f32 {
        self.world.base_scale * self.world.world_scale
    }
}

/// Errors from loading geo.toml
#[derive(Debug, thiserror::Error)]
pub enum GeoConfigError {
    /// File I/O error
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML parse error
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_reference_constants() {
        let config: GeoConfig = toml::from_str("").unwrap();
        assert_eq!(config.window, GeoWindow::default());
        assert_eq!(config.window.min_lon, -15.46945);
        assert_eq!(config.window.max_lat, 28.18235);
        assert_eq!(config.world.base_scale, 150.0);
        assert_eq!(config.world.world_scale, 5.0);
        assert_eq!(config.data.fallback_buildings, 15);
        assert_eq!(config.environment.cycle_duration(), Duration::from_secs(180));
        assert_eq!(config.plane_height(), 750.0);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: GeoConfig = toml::from_str(
            r#"
            [world]
            world_scale = 2.0
            seed = 7

            [data]
            dataset = "city.osm"
            "#,
        )
        .unwrap();
        assert_eq!(config.world.world_scale, 2.0);
        assert_eq!(config.world.base_scale, 150.0);
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.data.dataset, "city.osm");
        assert_eq!(config.data.ground_texture, "mapaLPGC.png");
    }

    #[test]
    fn test_resolve_path_uses_config_dir() {
        let mut config = GeoConfig::default();
        assert_eq!(config.dataset_path(), PathBuf::from("mapLPGC_MyL2025.osm"));
        config.base_dir = Some(PathBuf::from("assets/geo"));
        assert_eq!(config.dataset_path(), PathBuf::from("assets/geo/mapLPGC_MyL2025.osm"));
    }

    #[test]
    fn test_zero_cycle_is_clamped() {
        let env = EnvironmentConfig { cycle_secs: 0 };
        assert_eq!(env.cycle_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/geo/geo.toml");
        let config = GeoConfig::load(&path).unwrap();
        assert_eq!(config.window, GeoWindow::default());
        assert_eq!(config.plane_height(), 750.0);
        assert_eq!(config.world.seed, None);
        assert!(config.dataset_path().ends_with("assets/geo/mapLPGC_MyL2025.osm"));
    }
}
