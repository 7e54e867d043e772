//! Geowalk Client - Walkable 3D map of an OpenStreetMap extract
//!
//! Loads `geo.toml`, drapes the ground map over a plane, extrudes the dataset's
//! buildings and draws its streets, then lets you orbit the map or walk it in
//! first person under a running day/night cycle.
//!
//! ## Usage
//! `geowalk-client [path/to/geo.toml]` (defaults to `assets/geo/geo.toml`)
//!
//! ## Plugins
//! - GeoPlugin: Config, ground plane, background ingestion, collision field
//! - CameraControllerPlugin: Orbit view + first-person walker (V toggles)
//! - CelestialPlugin: Sky, fog, ambient light, sun, moon, stars
//! - HudPlugin: Clock, scene stats, view indicator, layer toggles

mod environment;
mod plugins;

use bevy::log::LogPlugin;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;
use bevy_camera_controller::CameraControllerPlugin;
use geowalk_geo::plugin::load_geo_config;
use geowalk_geo::GeoPlugin;
use plugins::{CelestialPlugin, HudPlugin};
use std::path::PathBuf;

/// Default config location, relative to the working directory
const DEFAULT_CONFIG: &str = "assets/geo/geo.toml";

fn main() {
    // Parse command line args
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = load_geo_config(&config_path);
    let title = config.project.name.clone();

    App::new()
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title,
                    resolution: bevy::window::WindowResolution::new(1600, 900),
                    present_mode: bevy::window::PresentMode::Fifo, // VSync
                    ..default()
                }),
                ..default()
            })
            .set(LogPlugin {
                filter: "wgpu=error,naga=warn,geowalk_geo=info,geowalk_client=info".to_string(),
                ..default()
            })
        )
        // Config first so every plugin below sees it during build
        .insert_resource(config)
        .add_plugins(GeoPlugin { config_path })
        .add_plugins(CameraControllerPlugin)
        .add_plugins(CelestialPlugin)
        .add_plugins(HudPlugin)
        .add_systems(Startup, setup_camera_and_light)
        .run();
}

/// Orbit camera with sky-colored linear fog, plus the key light
fn setup_camera_and_light(mut commands: Commands) {
    commands.spawn((
        Name::new("Main Camera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 45f32.to_radians(),
            near: 0.1,
            far: 5000.0,
            ..default()
        }),
        DistanceFog {
            color: Color::BLACK,
            falloff: FogFalloff::Linear {
                start: 100.0,
                end: 500.0,
            },
            ..default()
        },
    ));

    commands.spawn((
        Name::new("Key Light"),
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(100.0, 200.0, 100.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    info!("Camera and key light ready");
}
