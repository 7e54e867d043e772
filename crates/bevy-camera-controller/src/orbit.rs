//! Orbit view around a focus point: drag to rotate, scroll to zoom, right-drag to pan.

use bevy::prelude::*;
use core::f32::consts::FRAC_PI_2;

/// Orbit camera parameters and current pose
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OrbitState {
    /// Point the camera looks at
    pub focus: Vec3,
    /// Distance from the focus
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Radians per mouse dot
    pub rotate_speed: f32,
    /// Fraction of the radius per scroll line
    pub zoom_speed: f32,
    /// World units per mouse dot, per unit of radius
    pub pan_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl OrbitState {
    /// Orbit that starts at `eye` looking at `focus`
    pub fn looking_from(eye: Vec3, focus: Vec3, world_scale: f32) -> Self {
        let offset = eye - focus;
        let radius = offset.length().max(f32::EPSILON);
        let horizontal = Vec2::new(offset.x, offset.z).length();
        Self {
            focus,
            radius,
            yaw: offset.x.atan2(offset.z),
            pitch: -offset.y.atan2(horizontal),
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            pan_speed: 0.001,
            min_radius: world_scale,
            max_radius: 400.0 * world_scale,
        }
    }

    /// Reference starting view for a world scale: (0, 5, 15) × scale toward the origin
    pub fn for_world_scale(world_scale: f32) -> Self {
        Self::looking_from(Vec3::new(0.0, 5.0, 15.0) * world_scale, Vec3::ZERO, world_scale)
    }

    fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.rotate_speed;
        // keep just short of straight up/down so looking_at stays defined
        let limit = FRAC_PI_2 - 0.01;
        self.pitch = (self.pitch - delta.y * self.rotate_speed).clamp(-limit, limit);
    }

    /// Positive scroll zooms in
    pub fn zoom(&mut self, scroll: f32) {
        let factor = 1.0 - scroll * self.zoom_speed;
        self.radius = (self.radius * factor.max(0.1)).clamp(self.min_radius, self.max_radius);
    }

    /// Move the focus in the camera's screen plane
    pub fn pan(&mut self, delta: Vec2) {
        let rotation = self.rotation();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        let scale = self.pan_speed * self.radius;
        self.focus += (-right * delta.x + up * delta.y) * scale;
    }

    pub fn transform(&self) -> Transform {
        let eye = self.focus + self.rotation() * Vec3::Z * self.radius;
        Transform::from_translation(eye).looking_at(self.focus, Vec3::Y)
    }
}
