//! # Geowalk Geo - OpenStreetMap to Walkable 3D Scene
//!
//! Loads an OSM XML extract and turns it into Bevy entities: extruded
//! buildings with collision volumes, street line strips and vertex markers,
//! all laid over a textured ground plane.
//!
//! ## Architecture
//! - `geo.toml` — Declarative project config (window, scale, data, cycle)
//! - `assets/geo/` — OSM dataset and ground map image
//!
//! ## Modules
//! - `config` — Parse `geo.toml` project configuration
//! - `coords` — Geographic window → ground plane projection
//! - `osm_import` — OSM XML → nodes and ways
//! - `classify` — Way → building / street / ignored
//! - `vector_render` — Footprints and polylines → Bevy meshes
//! - `collision` — Building collision volumes (R-tree)
//! - `ingest` — Dataset → scene contents, with synthetic fallback
//! - `layers` — ECS components for scene layers
//! - `plugin` — Bevy plugin registration and systems
//!
//! ## Table of Contents
//! 1. Module declarations
//! 2. Re-exports

pub mod config;
pub mod coords;
pub mod osm_import;
pub mod classify;
pub mod vector_render;
pub mod collision;
pub mod ingest;
pub mod layers;
pub mod plugin;

pub use collision::{CollisionField, CollisionVolume};
pub use config::GeoConfig;
pub use coords::{AxisMapping, CoordinateProjector, MapPlane};
pub use ingest::{IngestStats, SceneContents, SceneIngestionPipeline};
pub use layers::{GeoFeature, LayerVisibility, SceneLayer};
pub use plugin::{GeoLoadState, GeoPlugin};
