//! Mouse gestures and keyboard shortcuts.
//!
//! | Input                    | Action                                  |
//! |--------------------------|-----------------------------------------|
//! | Left click               | Drop a cube onto the surface under it   |
//! | Left hold (0.5 s)        | Cycle the material of the picked node   |
//! | Right hold (1 s)         | Explosion at the surface under it       |
//! | P                        | Toggle surface detection                |
//! | H                        | Hide all surfaces                       |
//! | M                        | Next material for new cubes             |
//! | 1 / 2 / 3 / 4            | Origin, feature points, shapes, stats   |

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use sandbox_physics::PhysicsState;

use crate::camera::DeviceCamera;
use crate::coordinator::SceneCoordinator;
use crate::scene::pick_node;
use crate::tracking::{ScreenHitTester, Tracking};

/// Hold time after which a left press turns into a long press.
pub const LONG_PRESS_DURATION: f32 = 0.5;

/// Hold time of the right button that triggers an explosion.
pub const EXPLODE_HOLD_DURATION: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    LongPress,
    ExplosionHold,
}

#[derive(Debug, Default, Clone, Copy)]
struct Press {
    held: f32,
    fired: bool,
}

/// Turns raw button state into gestures. A long press fires once while the
/// button is still down and suppresses the tap on release.
#[derive(Resource, Debug, Default)]
pub struct GestureRecognizer {
    primary: Option<Press>,
    secondary: Option<Press>,
}

impl GestureRecognizer {
    pub fn update(&mut self, primary_down: bool, secondary_down: bool, dt: f32) -> Vec<Gesture> {
        let mut gestures = Vec::new();

        if primary_down {
            let press = self.primary.get_or_insert_with(Press::default);
            press.held += dt;
            if !press.fired && press.held >= LONG_PRESS_DURATION {
                press.fired = true;
                gestures.push(Gesture::LongPress);
            }
        } else if let Some(press) = self.primary.take() {
            if !press.fired {
                gestures.push(Gesture::Tap);
            }
        }

        if secondary_down {
            let press = self.secondary.get_or_insert_with(Press::default);
            press.held += dt;
            if !press.fired && press.held >= EXPLODE_HOLD_DURATION {
                press.fired = true;
                gestures.push(Gesture::ExplosionHold);
            }
        } else {
            self.secondary = None;
        }

        gestures
    }
}

pub fn handle_gestures(
    time: Res<Time>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<DeviceCamera>>,
    tracking: Res<Tracking>,
    mut recognizer: ResMut<GestureRecognizer>,
    mut coordinator: ResMut<SceneCoordinator>,
    mut physics: ResMut<PhysicsState>,
) {
    let gestures = recognizer.update(
        mouse_button.pressed(MouseButton::Left),
        mouse_button.pressed(MouseButton::Right),
        time.delta_secs(),
    );
    if gestures.is_empty() {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let hit_tester = ScreenHitTester {
        camera,
        camera_transform,
        session: tracking.session(),
    };

    for gesture in gestures {
        match gesture {
            Gesture::Tap => {
                coordinator.insert_object(cursor, &hit_tester, &mut physics);
            }
            Gesture::LongPress => {
                let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
                    continue;
                };
                if let Some(node) = pick_node(ray, &coordinator, &physics) {
                    if let Some(material) = coordinator.cycle_material(node) {
                        info!("Material of {:?} is now {}", node, material.name());
                    }
                }
            }
            Gesture::ExplosionHold => {
                coordinator.explode(cursor, &hit_tester, &mut physics);
            }
        }
    }
}

pub fn handle_shortcuts(
    keys: Res<ButtonInput<KeyCode>>,
    mut tracking: ResMut<Tracking>,
    mut coordinator: ResMut<SceneCoordinator>,
) {
    if keys.just_pressed(KeyCode::KeyP) {
        let enabled = !coordinator.tracking_enabled();
        coordinator.set_tracking_enabled(enabled, tracking.session_mut());
    }

    if keys.just_pressed(KeyCode::KeyH) {
        coordinator.hide_surfaces();
        info!("Surfaces hidden");
    }

    if keys.just_pressed(KeyCode::KeyM) {
        let material = coordinator.cycle_cube_material();
        info!("New cubes use {}", material.name());
    }

    let mut display = coordinator.display();
    let mut changed = true;
    if keys.just_pressed(KeyCode::Digit1) {
        display.show_world_origin = !display.show_world_origin;
    } else if keys.just_pressed(KeyCode::Digit2) {
        display.show_feature_points = !display.show_feature_points;
    } else if keys.just_pressed(KeyCode::Digit3) {
        display.show_physics_bodies = !display.show_physics_bodies;
    } else if keys.just_pressed(KeyCode::Digit4) {
        display.show_statistics = !display.show_statistics;
    } else {
        changed = false;
    }
    if changed {
        let options = coordinator.apply_display_config(display);
        debug!("Debug options now {:#06b}", options.bits());
    }
}
