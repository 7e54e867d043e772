//! # Bevy Plugin for the Geospatial Scene
//!
//! Registers components, resources and systems that turn `geo.toml` plus an
//! OSM dataset into a scene: ground plane, buildings, streets, markers and
//! the collision field.
//!
//! Ingestion runs once on a background thread after the map plane is sized;
//! results come back over a channel and are spawned by a polling system.
//!
//! ## Table of Contents
//! 1. GeoPlugin — Main plugin
//! 2. Config + ground texture loading
//! 3. Systems: setup_map_plane, receive_scene_contents, update_layer_visibility

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use crossbeam_channel::{Receiver, TryRecvError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use crate::collision::CollisionField;
use crate::config::GeoConfig;
use crate::coords::MapPlane;
use crate::ingest::{IngestStats, SceneContents, SceneIngestionPipeline, SceneSource};
use crate::layers::{GeoFeature, LayerVisibility, MapGround, SceneLayer};
use crate::vector_render::{
    GeometryBuilder, STREET_LINE_COLOR, STREET_MARKER_COLOR, STREET_MARKER_EMISSIVE,
};

/// Ground color when the map texture cannot be read
const UNTEXTURED_GROUND: [u8; 3] = [0x3a, 0x5f, 0x3a];

// ============================================================================
// 1. GeoPlugin — Main plugin
// ============================================================================

/// Main Bevy plugin for the OSM scene.
///
/// Uses an existing `GeoConfig` resource when one is inserted, otherwise loads
/// `config_path` (falling back to built-in defaults).
pub struct GeoPlugin {
    pub config_path: PathBuf,
}

impl Default for GeoPlugin {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("assets/geo/geo.toml"),
        }
    }
}

impl Plugin for GeoPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<GeoConfig>() {
            app.insert_resource(load_geo_config(&self.config_path));
        }

        app
            // Register types for reflection
            .register_type::<SceneLayer>()
            .register_type::<GeoFeature>()
            // Init resources
            .init_resource::<CollisionField>()
            .init_resource::<IngestStats>()
            .init_resource::<LayerVisibility>()
            .init_resource::<GeoLoadState>()
            // Systems
            .add_systems(Startup, setup_map_plane)
            .add_systems(Update, (
                receive_scene_contents.run_if(resource_exists::<SceneIngestion>),
                update_layer_visibility,
            ));
    }
}

/// Tracks scene loading progress
#[derive(Resource, Default, Debug)]
pub struct GeoLoadState {
    /// Whether the scene contents have been spawned
    pub scene_loaded: bool,
    /// Where the spawned contents came from
    pub source: Option<SceneSource>,
}

/// Pending background ingestion
#[derive(Resource)]
pub struct SceneIngestion {
    receiver: Receiver<SceneContents>,
}

// ============================================================================
// 2. Config + ground texture loading
// ============================================================================

/// Load geo.toml, or the reference configuration when it cannot be read.
/// Relative paths still resolve against the config's directory.
pub fn load_geo_config(path: &Path) -> GeoConfig {
    match GeoConfig::load(path) {
        Ok(config) => {
            tracing::info!("Loaded geo config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("{}; using built-in defaults", e);
            GeoConfig {
                base_dir: path.parent().map(|p| p.to_path_buf()),
                ..Default::default()
            }
        }
    }
}

/// Seeded RNG when a seed is configured, entropy otherwise
pub fn scene_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Decode the ground texture into an sRGB Bevy image
pub fn load_ground_texture(path: &Path) -> Result<Image, image::ImageError> {
    let rgba = image::open(path)?.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        rgba.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    ))
}

/// Width / height of a texture, or `None` for an empty one
pub fn texture_aspect(width: u32, height: u32) -> Option<f32> {
    (width > 0 && height > 0).then(|| width as f32 / height as f32)
}

// ============================================================================
// 3. Systems
// ============================================================================

/// Startup: size and spawn the ground plane, then start ingestion
fn setup_map_plane(
    mut commands: Commands,
    config: Res<GeoConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    let texture_path = config.ground_texture_path();
    let texture = match load_ground_texture(&texture_path) {
        Ok(image) => {
            let size = image.size();
            texture_aspect(size.x, size.y).map(|aspect| (image, aspect))
        }
        Err(e) => {
            tracing::warn!(
                "Ground texture {} unavailable ({}); using an untextured plane",
                texture_path.display(),
                e
            );
            None
        }
    };

    let (aspect, material) = match texture {
        Some((image, aspect)) => (
            aspect,
            StandardMaterial {
                base_color_texture: Some(images.add(image)),
                perceptual_roughness: 1.0,
                ..default()
            },
        ),
        None => {
            let [r, g, b] = UNTEXTURED_GROUND;
            (
                config.world.fallback_aspect,
                StandardMaterial {
                    base_color: Color::srgb_u8(r, g, b),
                    perceptual_roughness: 1.0,
                    ..default()
                },
            )
        }
    };

    let plane = MapPlane::from_aspect(&config, aspect);
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(plane.width, plane.height))),
        MeshMaterial3d(materials.add(material)),
        Transform::IDENTITY,
        MapGround,
    ));
    commands.insert_resource(plane);
    tracing::info!("Map plane {:.1} × {:.1} (aspect {:.3})", plane.width, plane.height, aspect);

    let pipeline = SceneIngestionPipeline::from_config(&config, plane);
    let dataset_path = config.dataset_path();
    let seed = config.world.seed;
    let (sender, receiver) = crossbeam_channel::bounded(1);

    let spawned = std::thread::Builder::new()
        .name("geo-ingest".into())
        .spawn(move || {
            let mut rng = scene_rng(seed);
            let contents = pipeline.load(&dataset_path, &mut rng);
            sender.send(contents).ok();
        });

    match spawned {
        Ok(_) => commands.insert_resource(SceneIngestion { receiver }),
        Err(e) => tracing::error!("Failed to start scene ingestion: {}", e),
    }
}

/// System: spawn ingested contents and install the collision field
fn receive_scene_contents(
    mut commands: Commands,
    ingestion: Res<SceneIngestion>,
    config: Res<GeoConfig>,
    mut load_state: ResMut<GeoLoadState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let contents = match ingestion.receiver.try_recv() {
        Ok(contents) => contents,
        Err(TryRecvError::Empty) => return,
        Err(TryRecvError::Disconnected) => {
            tracing::error!("Scene ingestion ended without a result");
            commands.remove_resource::<SceneIngestion>();
            return;
        }
    };

    let builder = GeometryBuilder::new(config.world.world_scale);
    spawn_scene_contents(&mut commands, &mut meshes, &mut materials, &builder, &contents);

    let field = CollisionField::bulk_load(contents.collision_volumes());
    tracing::info!("Collision field built with {} volumes", field.len());

    commands.insert_resource(field);
    commands.insert_resource(contents.stats);
    commands.remove_resource::<SceneIngestion>();
    load_state.scene_loaded = true;
    load_state.source = Some(contents.source);
}

fn spawn_scene_contents(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    builder: &GeometryBuilder,
    contents: &SceneContents,
) {
    for building in &contents.buildings {
        commands.spawn((
            Mesh3d(meshes.add(building.mesh.to_mesh())),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: building.mesh.color,
                perceptual_roughness: 0.7,
                metallic: 0.2,
                ..default()
            })),
            Transform::IDENTITY,
            SceneLayer::Buildings,
            GeoFeature { way_id: building.way_id.clone() },
        ));
    }

    if contents.streets.is_empty() {
        return;
    }

    let [r, g, b] = STREET_LINE_COLOR;
    let line_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(r, g, b),
        unlit: true,
        depth_bias: 1.0,
        ..default()
    });

    let [r, g, b] = STREET_MARKER_COLOR;
    let [er, eg, eb] = STREET_MARKER_EMISSIVE;
    let marker_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(r, g, b),
        emissive: Color::srgb_u8(er, eg, eb).to_linear() * 0.3,
        ..default()
    });
    let marker_mesh = meshes.add(builder.marker_mesh());

    for street in &contents.streets {
        commands.spawn((
            Mesh3d(meshes.add(street.feature.to_line_mesh())),
            MeshMaterial3d(line_material.clone()),
            Transform::IDENTITY,
            SceneLayer::Streets,
            GeoFeature { way_id: Some(street.way_id.clone()) },
        ));

        for marker in &street.feature.markers {
            commands.spawn((
                Mesh3d(marker_mesh.clone()),
                MeshMaterial3d(marker_material.clone()),
                Transform::from_translation(*marker),
                SceneLayer::Points,
                GeoFeature { way_id: Some(street.way_id.clone()) },
            ));
        }
    }
}

/// System: sync LayerVisibility to Bevy Visibility, for new entities and on toggles
fn update_layer_visibility(
    layers: Res<LayerVisibility>,
    mut query: Query<(Ref<SceneLayer>, &mut Visibility)>,
) {
    let refresh = layers.is_changed();
    for (layer, mut visibility) in query.iter_mut() {
        if !(refresh || layer.is_added()) {
            continue;
        }
        *visibility = if layers.is_visible(*layer) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_texture_aspect() {
        assert_eq!(texture_aspect(1500, 1000), Some(1.5));
        assert_eq!(texture_aspect(0, 1000), None);
        assert_eq!(texture_aspect(1000, 0), None);
    }

    #[test]
    fn test_missing_texture_is_an_error() {
        assert!(load_ground_texture(Path::new("/no/such/map.png")).is_err());
    }

    #[test]
    fn test_missing_config_keeps_base_dir() {
        let config = load_geo_config(Path::new("/no/such/dir/geo.toml"));
        assert_eq!(config.world.world_scale, 5.0);
        assert_eq!(config.dataset_path(), PathBuf::from("/no/such/dir/mapLPGC_MyL2025.osm"));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a: u64 = scene_rng(Some(11)).gen();
        let b: u64 = scene_rng(Some(11)).gen();
        assert_eq!(a, b);
    }
}
