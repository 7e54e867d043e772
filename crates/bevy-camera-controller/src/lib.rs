#![deny(unsafe_code)]

//! Two-mode camera controller: an orbit view over the map and a first-person
//! walker that collides with the scene's building volumes.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::ButtonInput;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, Window};
use geowalk_geo::{CollisionField, GeoConfig, MapPlane};

pub mod navigator;
pub mod orbit;

pub use navigator::{
    FirstPersonController, MapBounds, MoveOutcome, MovementIntent, NavigatorInput,
    NavigatorState, LOOK_RADIANS_PER_DOT,
};
pub use orbit::OrbitState;

/// Orbit + first-person camera controller plugin
#[derive(Default)]
pub struct CameraControllerPlugin;

impl Plugin for CameraControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ViewModeChanged>()
           .init_resource::<NavigatorInput>()
           .add_systems(PostStartup, attach_default_controller)
           .add_systems(Update, (
               toggle_view_mode,
               handle_cursor_grab,
               gather_navigator_input,
               run_first_person,
               run_orbit,
           ).chain());
    }
}

/// Camera control modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum CameraMode {
    /// Orbit around the map (drag, scroll, right-drag)
    #[default]
    Orbit,
    /// Walk at street level with WASD + mouse look
    FirstPerson,
}

/// Sent whenever the view mode switches
#[derive(Message, Debug, Clone, Copy)]
pub struct ViewModeChanged {
    pub mode: CameraMode,
}

/// Camera controller Component
#[derive(Component, Reflect)]
pub struct CameraController {
    /// Enables this controller when `true`.
    pub enabled: bool,
    /// Current camera mode
    pub mode: CameraMode,
    /// Walker pose
    pub navigator: NavigatorState,
    /// Walking parameters
    pub first_person: FirstPersonController,
    /// Orbit pose and parameters
    pub orbit: OrbitState,
    /// Result of the last first-person step
    #[reflect(ignore)]
    pub last_outcome: Option<MoveOutcome>,
    /// Vertical field of view in first person (degrees)
    pub first_person_fov: f32,
    /// Vertical field of view in orbit view (degrees)
    pub orbit_fov: f32,
    /// Key for switching between orbit and first person.
    pub key_toggle_view: KeyCode,
    /// Key for forward translation.
    pub key_forward: KeyCode,
    /// Key for backward translation.
    pub key_back: KeyCode,
    /// Key for left translation.
    pub key_left: KeyCode,
    /// Key for right translation.
    pub key_right: KeyCode,
    /// Mouse button that captures the pointer in first person.
    pub mouse_key_cursor_grab: MouseButton,
    /// Key that releases the pointer.
    pub key_release_cursor: KeyCode,
    /// Mouse button for orbit rotation
    pub orbit_rotate_button: MouseButton,
    /// Mouse button for orbit pan
    pub orbit_pan_button: MouseButton,
}

impl CameraController {
    pub fn for_world_scale(world_scale: f32) -> Self {
        use KeyCode::*;
        let first_person = FirstPersonController::from_world_scale(world_scale);
        Self {
            enabled: true,
            mode: CameraMode::Orbit,
            navigator: NavigatorState::new(first_person.spawn_position(world_scale)),
            first_person,
            orbit: OrbitState::for_world_scale(world_scale),
            last_outcome: None,
            first_person_fov: 75.0,
            orbit_fov: 45.0,
            key_toggle_view: KeyV,
            key_forward: KeyW,
            key_back: KeyS,
            key_left: KeyA,
            key_right: KeyD,
            mouse_key_cursor_grab: MouseButton::Left,
            key_release_cursor: Escape,
            orbit_rotate_button: MouseButton::Left,
            orbit_pan_button: MouseButton::Right,
        }
    }

    /// Transform for the current mode
    pub fn camera_transform(&self) -> Transform {
        match self.mode {
            CameraMode::Orbit => self.orbit.transform(),
            CameraMode::FirstPerson => self.navigator.transform(),
        }
    }

    /// Field of view for the current mode (degrees)
    pub fn fov_degrees(&self) -> f32 {
        match self.mode {
            CameraMode::Orbit => self.orbit_fov,
            CameraMode::FirstPerson => self.first_person_fov,
        }
    }

    /// Switch modes; leaving first person releases the pointer
    pub fn toggle_mode(&mut self) -> CameraMode {
        self.mode = match self.mode {
            CameraMode::Orbit => CameraMode::FirstPerson,
            CameraMode::FirstPerson => {
                self.navigator.pointer_captured = false;
                CameraMode::Orbit
            }
        };
        self.mode
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::for_world_scale(GeoConfig::default().world.world_scale)
    }
}

impl core::fmt::Display for CameraController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "\nCamera Controls:\n    {:?}\t- Toggle orbit / first person\n    Orbit: {:?}-drag rotate, {:?}-drag pan, scroll zoom\n    {:?}\t- Capture cursor (first person)\n    {:?}\t- Release cursor\n    {:?} {:?} {:?} {:?}\t- Walk",
            self.key_toggle_view,
            self.orbit_rotate_button,
            self.orbit_pan_button,
            self.mouse_key_cursor_grab,
            self.key_release_cursor,
            self.key_forward,
            self.key_left,
            self.key_back,
            self.key_right,
        )
    }
}

fn set_cursor_grab(cursor_options: &mut Query<&mut CursorOptions, With<Window>>, grab: bool) {
    if let Ok(mut opts) = cursor_options.single_mut() {
        if grab {
            opts.grab_mode = CursorGrabMode::Locked;
            opts.visible = false;
        } else {
            opts.grab_mode = CursorGrabMode::None;
            opts.visible = true;
        }
    }
}

fn set_fov(projection: &mut Projection, degrees: f32) {
    if let Projection::Perspective(perspective) = projection {
        perspective.fov = degrees.to_radians();
    }
}

/// If no `CameraController` exists, attach one sized to the world scale to the first camera found.
fn attach_default_controller(
    mut commands: Commands,
    config: Option<Res<GeoConfig>>,
    q_cam: Query<Entity, With<Camera>>,
    q_has: Query<Entity, With<CameraController>>,
) {
    if !q_has.is_empty() {
        return;
    }
    let Some(entity) = q_cam.iter().next() else {
        return;
    };
    let controller = match config {
        Some(config) => CameraController::for_world_scale(config.world.world_scale),
        None => CameraController::default(),
    };
    info!("{}", controller);
    commands.entity(entity).insert((controller.camera_transform(), controller));
}

fn toggle_view_mode(
    key_input: Res<ButtonInput<KeyCode>>,
    mut cursor_options: Query<&mut CursorOptions, With<Window>>,
    mut changed: MessageWriter<ViewModeChanged>,
    mut query: Query<(&mut Transform, &mut Projection, &mut CameraController), With<Camera>>,
) {
    let Ok((mut transform, mut projection, mut controller)) = query.single_mut() else {
        return;
    };
    if !controller.enabled || !key_input.just_pressed(controller.key_toggle_view) {
        return;
    }

    let mode = controller.toggle_mode();
    if mode == CameraMode::Orbit {
        set_cursor_grab(&mut cursor_options, false);
    }
    *transform = controller.camera_transform();
    set_fov(&mut projection, controller.fov_degrees());
    changed.write(ViewModeChanged { mode });
    debug!("View mode: {:?}", mode);
}

fn handle_cursor_grab(
    windows: Query<&Window>,
    mouse_button_input: Res<ButtonInput<MouseButton>>,
    key_input: Res<ButtonInput<KeyCode>>,
    mut cursor_options: Query<&mut CursorOptions, With<Window>>,
    mut query: Query<&mut CameraController, With<Camera>>,
) {
    let Ok(mut controller) = query.single_mut() else {
        return;
    };
    if !controller.enabled || controller.mode != CameraMode::FirstPerson {
        return;
    }

    let focused = windows.iter().any(|w| w.focused);
    let captured = controller.navigator.pointer_captured;

    if !captured && focused && mouse_button_input.just_pressed(controller.mouse_key_cursor_grab) {
        set_cursor_grab(&mut cursor_options, true);
        controller.navigator.pointer_captured = true;
    } else if captured && (key_input.just_pressed(controller.key_release_cursor) || !focused) {
        set_cursor_grab(&mut cursor_options, false);
        controller.navigator.pointer_captured = false;
    }
}

/// Build this frame's `NavigatorInput` snapshot
fn gather_navigator_input(
    key_input: Res<ButtonInput<KeyCode>>,
    mut mouse_motion_events: MessageReader<MouseMotion>,
    mut input: ResMut<NavigatorInput>,
    query: Query<&CameraController, With<Camera>>,
) {
    let mut look_delta = Vec2::ZERO;
    for event in mouse_motion_events.read() {
        look_delta += event.delta;
    }

    let Ok(controller) = query.single() else {
        *input = NavigatorInput::default();
        return;
    };

    *input = NavigatorInput {
        intent: MovementIntent {
            forward: key_input.pressed(controller.key_forward),
            backward: key_input.pressed(controller.key_back),
            left: key_input.pressed(controller.key_left),
            right: key_input.pressed(controller.key_right),
        },
        look_delta,
    };
}

fn run_first_person(
    input: Res<NavigatorInput>,
    field: Option<Res<CollisionField>>,
    plane: Option<Res<MapPlane>>,
    mut query: Query<(&mut Transform, &mut CameraController), With<Camera>>,
) {
    let Ok((mut transform, mut controller)) = query.single_mut() else {
        return;
    };
    if !controller.enabled || controller.mode != CameraMode::FirstPerson {
        return;
    }

    let empty = CollisionField::default();
    let field = field.as_deref().unwrap_or(&empty);
    let fp = controller.first_person;
    let bounds = plane.map(|plane| fp.bounds(&plane));

    fp.apply_look(&mut controller.navigator, input.look_delta);
    let outcome = fp.step(&mut controller.navigator, input.intent, field, bounds.as_ref());
    if outcome == MoveOutcome::Blocked && controller.last_outcome != Some(MoveOutcome::Blocked) {
        debug!("Walker blocked at {:?}", controller.navigator.position);
    }
    controller.last_outcome = Some(outcome);

    *transform = controller.navigator.transform();
}

fn run_orbit(
    mouse_button_input: Res<ButtonInput<MouseButton>>,
    mut mouse_motion_events: MessageReader<MouseMotion>,
    mut mouse_wheel_events: MessageReader<MouseWheel>,
    mut query: Query<(&mut Transform, &mut CameraController), With<Camera>>,
) {
    let mut motion = Vec2::ZERO;
    for event in mouse_motion_events.read() {
        motion += event.delta;
    }
    let mut scroll = 0.0;
    for event in mouse_wheel_events.read() {
        scroll += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / 16.0,
        };
    }

    let Ok((mut transform, mut controller)) = query.single_mut() else {
        return;
    };
    if !controller.enabled || controller.mode != CameraMode::Orbit {
        return;
    }
    if motion == Vec2::ZERO && scroll == 0.0 {
        return;
    }

    if mouse_button_input.pressed(controller.orbit_rotate_button) {
        controller.orbit.rotate(motion);
    } else if mouse_button_input.pressed(controller.orbit_pan_button) {
        controller.orbit.pan(motion);
    }
    if scroll != 0.0 {
        controller.orbit.zoom(scroll);
    }

    *transform = controller.orbit.transform();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip_releases_pointer() {
        let mut controller = CameraController::for_world_scale(5.0);
        assert_eq!(controller.mode, CameraMode::Orbit);
        assert_eq!(controller.fov_degrees(), 45.0);

        assert_eq!(controller.toggle_mode(), CameraMode::FirstPerson);
        assert_eq!(controller.fov_degrees(), 75.0);
        controller.navigator.pointer_captured = true;
        let t = controller.camera_transform();
        assert_eq!(t.translation, Vec3::new(-250.0, 2.0, -250.0));

        assert_eq!(controller.toggle_mode(), CameraMode::Orbit);
        assert!(!controller.navigator.pointer_captured);
    }

    #[test]
    fn test_walker_pose_survives_mode_switches() {
        let mut controller = CameraController::for_world_scale(5.0);
        controller.toggle_mode();
        let fp = controller.first_person;
        let intent = MovementIntent { forward: true, ..Default::default() };
        fp.step(&mut controller.navigator, intent, &CollisionField::default(), None);
        let walked = controller.navigator.position;

        controller.toggle_mode();
        controller.toggle_mode();
        assert_eq!(controller.camera_transform().translation, walked);
    }
}
