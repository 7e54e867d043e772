// ============================================================================
// Celestial Plugin - Day/Night Cycle
// ============================================================================
//
// Drives the scene environment from the wall clock:
// - Sky clear color and distance fog follow the keyframed sky color
// - Ambient light brightness rises toward noon
// - Sun and moon spheres orbit opposite each other
// - Starfield fades in at night
//
// All values come from `EnvironmentClock`; this plugin only applies them.
//
// Table of Contents:
// 1. Plugin Definition
// 2. Components
// 3. Startup (spawn_celestial_bodies)
// 4. Systems (update_environment_state, apply_sky_and_fog, apply_ambient_light,
//    move_celestial_bodies, update_starfield)
// 5. Helper Functions
// ============================================================================

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::time::Real;
use geowalk_geo::plugin::scene_rng;
use geowalk_geo::GeoConfig;
use rand::Rng;

use crate::environment::{EnvironmentClock, EnvironmentState};

/// Number of stars in the starfield
pub const STAR_COUNT: usize = 1000;
/// Scene lux per unit of ambient intensity
pub const AMBIENT_BRIGHTNESS_SCALE: f32 = 500.0;
/// Star opacity change below which the material is left alone
const STAR_OPACITY_STEP: f32 = 0.01;

// ============================================================================
// 1. Plugin Definition
// ============================================================================

/// Plugin for the day/night cycle and celestial bodies
pub struct CelestialPlugin;

impl Plugin for CelestialPlugin {
    fn build(&self, app: &mut App) {
        let clock = app
            .world()
            .get_resource::<GeoConfig>()
            .map(|config| EnvironmentClock::new(config.environment.cycle_duration()))
            .unwrap_or_default();
        info!("Day/night cycle: {:?} per day", clock.cycle());

        app.insert_resource(clock)
            .init_resource::<EnvironmentState>()
            .add_systems(Startup, spawn_celestial_bodies)
            .add_systems(Update, (
                update_environment_state,
                apply_sky_and_fog,
                apply_ambient_light,
                move_celestial_bodies,
                update_starfield,
            ).chain());
    }
}

// ============================================================================
// 2. Components
// ============================================================================

#[derive(Component)]
pub struct Sun;

#[derive(Component)]
pub struct Moon;

/// Point cloud of stars; remembers the opacity last written to its material
#[derive(Component)]
pub struct Starfield {
    pub opacity: f32,
}

// ============================================================================
// 3. Startup
// ============================================================================

fn spawn_celestial_bodies(
    mut commands: Commands,
    config: Option<Res<GeoConfig>>,
    state: Res<EnvironmentState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let config = config.as_deref().cloned().unwrap_or_default();
    let ws = config.world.world_scale;

    commands.spawn((
        Name::new("Sun"),
        Sun,
        Mesh3d(meshes.add(Sphere::new(15.0 * ws))),
        MeshMaterial3d(materials.add(glowing_material(
            Color::srgb_u8(0xff, 0xdd, 0x00),
            Color::srgb_u8(0xff, 0xaa, 0x00),
        ))),
        Transform::from_translation(state.sun_position),
    ));

    commands.spawn((
        Name::new("Moon"),
        Moon,
        Mesh3d(meshes.add(Sphere::new(12.0 * ws))),
        MeshMaterial3d(materials.add(glowing_material(
            Color::srgb_u8(0xe0, 0xe0, 0xe0),
            Color::srgb_u8(0x88, 0x88, 0x88),
        ))),
        Transform::from_translation(state.moon_position),
    ));

    let mut rng = scene_rng(config.world.seed);
    let opacity = state.star_opacity.unwrap_or(0.0);
    commands.spawn((
        Name::new("Starfield"),
        Starfield { opacity },
        Mesh3d(meshes.add(starfield_mesh(&star_positions(&mut rng, STAR_COUNT)))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 1.0, 1.0, opacity),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            fog_enabled: false,
            ..default()
        })),
        Transform::IDENTITY,
        star_visibility(&state),
    ));
}

// ============================================================================
// 4. Systems
// ============================================================================

/// Recompute the environment from real elapsed time
fn update_environment_state(
    time: Res<Time<Real>>,
    clock: Res<EnvironmentClock>,
    mut state: ResMut<EnvironmentState>,
) {
    *state = clock.state_at(time.elapsed());
}

fn apply_sky_and_fog(
    state: Res<EnvironmentState>,
    mut clear_color: ResMut<ClearColor>,
    mut fogs: Query<&mut DistanceFog>,
) {
    let sky = state.sky_color();
    clear_color.0 = sky;
    for mut fog in fogs.iter_mut() {
        fog.color = sky;
    }
}

fn apply_ambient_light(state: Res<EnvironmentState>, mut ambient: ResMut<GlobalAmbientLight>) {
    ambient.brightness = ambient_brightness(state.ambient_intensity);
}

fn move_celestial_bodies(
    state: Res<EnvironmentState>,
    mut suns: Query<&mut Transform, (With<Sun>, Without<Moon>)>,
    mut moons: Query<&mut Transform, (With<Moon>, Without<Sun>)>,
) {
    for mut transform in suns.iter_mut() {
        transform.translation = state.sun_position;
    }
    for mut transform in moons.iter_mut() {
        transform.translation = state.moon_position;
    }
}

fn update_starfield(
    state: Res<EnvironmentState>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut query: Query<(&mut Starfield, &mut Visibility, &MeshMaterial3d<StandardMaterial>)>,
) {
    for (mut starfield, mut visibility, handle) in query.iter_mut() {
        let wanted = star_visibility(&state);
        if *visibility != wanted {
            *visibility = wanted;
        }

        let Some(opacity) = state.star_opacity else {
            continue;
        };
        if (opacity - starfield.opacity).abs() < STAR_OPACITY_STEP {
            continue;
        }
        if let Some(material) = materials.get_mut(&handle.0) {
            material.base_color = Color::srgba(1.0, 1.0, 1.0, opacity);
            starfield.opacity = opacity;
        }
    }
}

// ============================================================================
// 5. Helper Functions
// ============================================================================

/// Unlit, fog-free material for the sun and moon
fn glowing_material(color: Color, emissive: Color) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        emissive: emissive.to_linear(),
        unlit: true,
        fog_enabled: false,
        ..default()
    }
}

pub fn ambient_brightness(intensity: f32) -> f32 {
    intensity * AMBIENT_BRIGHTNESS_SCALE
}

fn star_visibility(state: &EnvironmentState) -> Visibility {
    if state.stars_visible() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Random star positions: x, z in [-1000, 1000), y in [200, 1200)
pub fn star_positions(rng: &mut impl Rng, count: usize) -> Vec<[f32; 3]> {
    (0..count)
        .map(|_| {
            let x = (rng.gen::<f32>() - 0.5) * 2000.0;
            let y = rng.gen::<f32>() * 1000.0 + 200.0;
            let z = (rng.gen::<f32>() - 0.5) * 2000.0;
            [x, y, z]
        })
        .collect()
}

fn starfield_mesh(positions: &[[f32; 3]]) -> Mesh {
    let indices = (0..positions.len() as u32).collect();
    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions.to_vec())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0, 1.0, 0.0]; positions.len()])
        .with_inserted_indices(Indices::U32(indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_star_positions_in_shell() {
        let mut rng = StdRng::seed_from_u64(3);
        let stars = star_positions(&mut rng, STAR_COUNT);
        assert_eq!(stars.len(), 1000);
        for [x, y, z] in stars {
            assert!((-1000.0..1000.0).contains(&x));
            assert!((200.0..1200.0).contains(&y));
            assert!((-1000.0..1000.0).contains(&z));
        }
    }

    #[test]
    fn test_starfield_mesh_is_a_point_list() {
        let mut rng = StdRng::seed_from_u64(3);
        let mesh = starfield_mesh(&star_positions(&mut rng, 10));
        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::PointList);
        assert_eq!(mesh.count_vertices(), 10);
    }

    #[test]
    fn test_ambient_brightness_tracks_intensity() {
        let noon = EnvironmentState::at(0.5);
        let midnight = EnvironmentState::at(0.0);
        assert!(ambient_brightness(noon.ambient_intensity) > ambient_brightness(midnight.ambient_intensity));
        assert!((ambient_brightness(0.8) - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_star_visibility_follows_clock() {
        assert_eq!(star_visibility(&EnvironmentState::at(0.1)), Visibility::Inherited);
        assert_eq!(star_visibility(&EnvironmentState::at(0.5)), Visibility::Hidden);
    }
}
