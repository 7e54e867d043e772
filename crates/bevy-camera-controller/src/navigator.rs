//! First-person walking: look, move, collide, slide, clamp.
//!
//! Everything here is plain data in, plain data out. The systems in `lib.rs`
//! feed it one `NavigatorInput` per frame and copy the resulting
//! `NavigatorState` onto the camera transform.

use bevy::prelude::*;
use core::f32::consts::FRAC_PI_2;
use geowalk_geo::{CollisionField, CollisionVolume, MapPlane};

/// Radians of look rotation per mouse dot.
pub const LOOK_RADIANS_PER_DOT: f32 = 0.002;

/// Movement keys held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementIntent {
    /// (right − left, forward − backward)
    pub fn axes(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.backward))
    }
}

/// Input snapshot for one frame
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigatorInput {
    pub intent: MovementIntent,
    /// Accumulated mouse motion in dots
    pub look_delta: Vec2,
}

/// Walker position and orientation
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct NavigatorState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Whether the pointer is captured (look is only applied while captured)
    pub pointer_captured: bool,
}

impl NavigatorState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            pointer_captured: false,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn look_direction(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation())
    }
}

/// Horizontal extent the walker is kept inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub width: f32,
    pub height: f32,
    /// Inset from every edge
    pub margin: f32,
}

impl MapBounds {
    pub fn from_plane(plane: &MapPlane, margin: f32) -> Self {
        Self {
            width: plane.width,
            height: plane.height,
            margin,
        }
    }

    /// Clamp X into `[-w/2 + m, w/2 - m]` and Z into `[-h/2 + m, h/2 - m]`.
    /// When the margin exceeds half the extent the lower bound wins.
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        let hx = self.width * 0.5 - self.margin;
        let hz = self.height * 0.5 - self.margin;
        Vec3::new(
            position.x.min(hx).max(-hx),
            position.y,
            position.z.min(hz).max(-hz),
        )
    }
}

/// What a movement step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No movement keys held
    Idle,
    /// Full displacement applied
    Moved,
    /// Only the X component applied
    SlidX,
    /// Only the Z component applied
    SlidZ,
    /// Every candidate collided; position unchanged
    Blocked,
}

/// Walking parameters, all derived from the world scale
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FirstPersonController {
    /// Displacement per frame
    pub move_speed: f32,
    /// Radians per mouse dot
    pub look_speed: f32,
    /// Half-width of the square collision probe
    pub probe_half_width: f32,
    /// Top of the collision probe (bottom is 0)
    pub probe_height: f32,
    /// Fixed camera height while walking
    pub eye_height: f32,
    /// Inset from the map edges
    pub margin: f32,
}

impl FirstPersonController {
    pub fn from_world_scale(world_scale: f32) -> Self {
        Self {
            move_speed: 0.08 * world_scale * 0.5,
            look_speed: LOOK_RADIANS_PER_DOT,
            probe_half_width: 0.2 * world_scale,
            probe_height: 10.0 * world_scale,
            eye_height: 0.4 * world_scale,
            margin: 20.0 * world_scale,
        }
    }

    /// Start position for a world scale: (-50, eye, -50) × scale
    pub fn spawn_position(&self, world_scale: f32) -> Vec3 {
        Vec3::new(-50.0 * world_scale, self.eye_height, -50.0 * world_scale)
    }

    pub fn bounds(&self, plane: &MapPlane) -> MapBounds {
        MapBounds::from_plane(plane, self.margin)
    }

    /// Yaw/pitch from mouse motion; ignored unless the pointer is captured
    pub fn apply_look(&self, state: &mut NavigatorState, delta: Vec2) {
        if !state.pointer_captured {
            return;
        }
        state.yaw -= delta.x * self.look_speed;
        state.pitch = (state.pitch - delta.y * self.look_speed).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// One frame of movement against the collision field, then the map clamp
    pub fn step(
        &self,
        state: &mut NavigatorState,
        intent: MovementIntent,
        field: &CollisionField,
        bounds: Option<&MapBounds>,
    ) -> MoveOutcome {
        let outcome = self.resolve_move(state, intent, field);
        if let Some(bounds) = bounds {
            state.position = bounds.clamp(state.position);
        }
        outcome
    }

    fn resolve_move(
        &self,
        state: &mut NavigatorState,
        intent: MovementIntent,
        field: &CollisionField,
    ) -> MoveOutcome {
        let look = state.look_direction();
        let forward = Vec3::new(look.x, 0.0, look.z).normalize_or_zero();
        let right = forward.cross(Vec3::Y);

        let axes = intent.axes();
        let velocity = forward * axes.y + right * axes.x;
        if velocity.length_squared() <= f32::EPSILON {
            return MoveOutcome::Idle;
        }
        let velocity = velocity.normalize() * self.move_speed;

        let mut proposed = state.position + velocity;
        proposed.y = self.eye_height;

        if field.is_empty() || !self.is_blocked(field, proposed) {
            state.position = proposed;
            return MoveOutcome::Moved;
        }

        let slide_x = Vec3::new(state.position.x + velocity.x, self.eye_height, state.position.z);
        if !self.is_blocked(field, slide_x) {
            state.position = slide_x;
            return MoveOutcome::SlidX;
        }

        let slide_z = Vec3::new(state.position.x, self.eye_height, state.position.z + velocity.z);
        if !self.is_blocked(field, slide_z) {
            state.position = slide_z;
            return MoveOutcome::SlidZ;
        }

        MoveOutcome::Blocked
    }

    fn is_blocked(&self, field: &CollisionField, position: Vec3) -> bool {
        field.intersects(&CollisionVolume::probe(
            position,
            self.probe_half_width,
            self.probe_height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_4;

    const WS: f32 = 5.0;

    fn controller() -> FirstPersonController {
        FirstPersonController::from_world_scale(WS)
    }

    fn walker(yaw: f32) -> NavigatorState {
        NavigatorState {
            yaw,
            ..NavigatorState::new(Vec3::new(0.0, 0.4 * WS, 0.0))
        }
    }

    fn forward() -> MovementIntent {
        MovementIntent { forward: true, ..Default::default() }
    }

    fn wall(min: Vec3, max: Vec3) -> CollisionVolume {
        CollisionVolume::new(min, max)
    }

    #[test]
    fn test_reference_parameters() {
        let c = controller();
        assert!((c.move_speed - 0.2).abs() < 1e-6);
        assert_eq!(c.probe_half_width, 1.0);
        assert_eq!(c.probe_height, 50.0);
        assert_eq!(c.eye_height, 2.0);
        assert_eq!(c.margin, 100.0);
        assert_eq!(c.spawn_position(WS), Vec3::new(-250.0, 2.0, -250.0));
    }

    #[test]
    fn test_empty_field_moves_unconditionally() {
        let c = controller();
        let mut state = walker(0.0);
        let outcome = c.step(&mut state, forward(), &CollisionField::default(), None);
        assert_eq!(outcome, MoveOutcome::Moved);
        assert!((state.position - Vec3::new(0.0, 2.0, -0.2)).length() < 1e-5);
    }

    #[test]
    fn test_idle_keeps_position() {
        let c = controller();
        let mut state = walker(0.3);
        let opposite = MovementIntent { forward: true, backward: true, ..Default::default() };
        let outcome = c.step(&mut state, opposite, &CollisionField::default(), None);
        assert_eq!(outcome, MoveOutcome::Idle);
        assert_eq!(state.position, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_strafe_right_is_positive_x_when_facing_negative_z() {
        let c = controller();
        let mut state = walker(0.0);
        let right = MovementIntent { right: true, ..Default::default() };
        c.step(&mut state, right, &CollisionField::default(), None);
        assert!(state.position.x > 0.0);
        assert!(state.position.z.abs() < 1e-6);
    }

    #[test]
    fn test_slides_along_x_when_z_is_blocked() {
        let c = controller();
        // wall across -Z, just beyond the probe's reach at rest
        let field = CollisionField::bulk_load(vec![wall(
            Vec3::new(-100.0, 0.0, -5.0),
            Vec3::new(100.0, 50.0, -1.1),
        )]);
        // diagonal: forward-left toward (-x, -z)
        let mut state = walker(FRAC_PI_4);
        let outcome = c.step(&mut state, forward(), &field, None);
        assert_eq!(outcome, MoveOutcome::SlidX);
        assert!(state.position.x < 0.0);
        assert_eq!(state.position.z, 0.0);
        assert!(!field.intersects(&CollisionVolume::probe(state.position, 1.0, 50.0)));
    }

    #[test]
    fn test_slides_along_z_when_x_is_blocked() {
        let c = controller();
        let field = CollisionField::bulk_load(vec![wall(
            Vec3::new(-5.0, 0.0, -100.0),
            Vec3::new(-1.1, 50.0, 100.0),
        )]);
        let mut state = walker(FRAC_PI_4);
        let outcome = c.step(&mut state, forward(), &field, None);
        assert_eq!(outcome, MoveOutcome::SlidZ);
        assert_eq!(state.position.x, 0.0);
        assert!(state.position.z < 0.0);
    }

    #[test]
    fn test_corner_blocks_movement() {
        let c = controller();
        let field = CollisionField::bulk_load(vec![
            wall(Vec3::new(-5.0, 0.0, -100.0), Vec3::new(-1.1, 50.0, 100.0)),
            wall(Vec3::new(-100.0, 0.0, -5.0), Vec3::new(100.0, 50.0, -1.1)),
        ]);
        let mut state = walker(FRAC_PI_4);
        let before = state.position;
        let outcome = c.step(&mut state, forward(), &field, None);
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(state.position, before);
    }

    #[test]
    fn test_walls_above_the_probe_do_not_block() {
        let c = controller();
        let field = CollisionField::bulk_load(vec![wall(
            Vec3::new(-10.0, 60.0, -10.0),
            Vec3::new(10.0, 70.0, 10.0),
        )]);
        let mut state = walker(0.0);
        assert_eq!(c.step(&mut state, forward(), &field, None), MoveOutcome::Moved);
    }

    #[test]
    fn test_clamped_to_map_bounds() {
        let c = controller();
        let plane = MapPlane { width: 1125.0, height: 750.0 };
        let bounds = c.bounds(&plane);
        // facing +X
        let mut state = NavigatorState {
            yaw: -FRAC_PI_2,
            ..NavigatorState::new(Vec3::new(462.4, 2.0, 0.0))
        };
        c.step(&mut state, forward(), &CollisionField::default(), Some(&bounds));
        assert!((state.position.x - 462.5).abs() < 1e-4);

        let far = bounds.clamp(Vec3::new(-9999.0, 2.0, 9999.0));
        assert_eq!(far, Vec3::new(-462.5, 2.0, 275.0));
    }

    #[test]
    fn test_look_requires_capture_and_clamps_pitch() {
        let c = controller();
        let mut state = walker(0.0);
        c.apply_look(&mut state, Vec2::new(100.0, 100.0));
        assert_eq!((state.yaw, state.pitch), (0.0, 0.0));

        state.pointer_captured = true;
        c.apply_look(&mut state, Vec2::new(100.0, 0.0));
        assert!((state.yaw + 0.2).abs() < 1e-6);

        c.apply_look(&mut state, Vec2::new(0.0, -10_000.0));
        assert_eq!(state.pitch, FRAC_PI_2);
        c.apply_look(&mut state, Vec2::new(0.0, 20_000.0));
        assert_eq!(state.pitch, -FRAC_PI_2);
    }
}
