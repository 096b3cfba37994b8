//! Handheld device camera.
//!
//! On the desktop the "device" orbits a point in the room:
//! - Middle mouse drag: look around (azimuth and elevation)
//! - Scroll wheel: step closer or further away
//! - WASD: walk the orbit target across the floor
//!
//! Left and right mouse buttons are left to the sandbox gestures.

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;

#[derive(Component)]
pub struct DeviceCamera {
    /// Point the device is held towards
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle (radians)
    pub azimuth: f32,
    /// Vertical angle (radians)
    pub elevation: f32,
    pub sensitivity: f32,
    pub zoom_sensitivity: f32,
    /// Walking speed in meters per second
    pub walk_speed: f32,
}

impl Default for DeviceCamera {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, -0.5, -1.5),
            distance: 1.8,
            azimuth: 0.0,
            elevation: 0.6,
            sensitivity: 0.005,
            zoom_sensitivity: 0.1,
            walk_speed: 1.2,
        }
    }
}

impl DeviceCamera {
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    /// Move the target on the floor plane relative to the viewing direction.
    fn walk(&mut self, input: Vec2, distance: f32) {
        let forward = Vec3::new(-self.azimuth.sin(), 0.0, -self.azimuth.cos());
        let right = Vec3::new(-forward.z, 0.0, forward.x);
        self.target += (forward * input.y + right * input.x) * distance;
    }
}

pub fn device_camera_system(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut query: Query<(&mut DeviceCamera, &mut Transform)>,
) {
    let mut walk = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        walk.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        walk.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        walk.x += 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        walk.x -= 1.0;
    }

    for (mut device, mut transform) in query.iter_mut() {
        if mouse_button.pressed(MouseButton::Middle) {
            let delta = mouse_motion.delta;
            device.azimuth -= delta.x * device.sensitivity;
            device.elevation = (device.elevation + delta.y * device.sensitivity).clamp(-1.4, 1.4);
        }

        let scroll = mouse_scroll.delta.y;
        if scroll != 0.0 {
            device.distance = (device.distance - scroll * device.zoom_sensitivity).clamp(0.2, 10.0);
        }

        if walk != Vec2::ZERO {
            let step = device.walk_speed * time.delta_secs();
            device.walk(walk.normalize(), step);
        }

        *transform = device.transform();
    }
}
