//! Wires the coordinator, the tracking session and the scene systems into an app.

use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy::window::WindowFocused;
use sandbox_physics::{ContactStarted, PhysicsPlugin, PhysicsState, PhysicsSystems};

use crate::camera::device_camera_system;
use crate::config::SandboxConfig;
use crate::coordinator::SceneCoordinator;
use crate::input::{handle_gestures, handle_shortcuts, GestureRecognizer};
use crate::overlay::{
    draw_debug_gizmos, show_notifications, spawn_overlay_text, update_statistics_text,
};
use crate::scene::{
    apply_scene_lighting, setup_material_library, sync_cube_entities, sync_surface_entities,
};
use crate::tracking::{
    PlaneDetection, SessionConfig, SimulatedSession, Tracking, TrackingSession,
};

/// The AR sandbox: surfaces from a tracking session, cubes, explosions and
/// the debug overlay.
///
/// Adds [`PhysicsPlugin`] and `FrameTimeDiagnosticsPlugin` if they are not
/// present yet.
pub struct SandboxPlugin {
    pub config: SandboxConfig,
}

impl SandboxPlugin {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SandboxPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<PhysicsPlugin>() {
            app.add_plugins(PhysicsPlugin);
        }
        if !app.is_plugin_added::<FrameTimeDiagnosticsPlugin>() {
            app.add_plugins(FrameTimeDiagnosticsPlugin::default());
        }

        let coordinator = {
            let mut physics = app.world_mut().resource_mut::<PhysicsState>();
            SceneCoordinator::new(&self.config, &mut physics)
        };

        let mut session = SimulatedSession::new(&self.config.simulation);
        session.run(&session_config(&self.config));

        app.insert_resource(self.config.clone())
            .insert_resource(coordinator)
            .insert_resource(Tracking::new(session))
            .init_resource::<GestureRecognizer>()
            .add_systems(Startup, (setup_material_library, spawn_overlay_text))
            .add_systems(
                Update,
                (
                    device_camera_system,
                    follow_window_focus,
                    handle_shortcuts,
                    handle_gestures,
                    poll_tracking,
                )
                    .chain()
                    .before(PhysicsSystems::Step),
            )
            .add_systems(
                Update,
                remove_fallen_objects
                    .after(PhysicsSystems::Step)
                    .before(PhysicsSystems::Sync),
            )
            .add_systems(
                Update,
                (
                    sync_surface_entities,
                    sync_cube_entities,
                    apply_scene_lighting,
                    draw_debug_gizmos,
                    update_statistics_text,
                    show_notifications,
                )
                    .after(PhysicsSystems::Sync),
            );
    }
}

fn session_config(config: &SandboxConfig) -> SessionConfig {
    SessionConfig {
        light_estimation: true,
        plane_detection: if config.detect_planes {
            PlaneDetection::Horizontal
        } else {
            PlaneDetection::None
        },
    }
}

/// Feed this frame's tracking events and light estimate to the coordinator.
fn poll_tracking(
    time: Res<Time>,
    mut tracking: ResMut<Tracking>,
    mut coordinator: ResMut<SceneCoordinator>,
    mut physics: ResMut<PhysicsState>,
) {
    let session = tracking.session_mut();
    for event in session.poll_events(time.delta_secs()) {
        coordinator.on_session_event(&event, &mut physics);
    }
    if let Some(estimate) = session.light_estimate() {
        coordinator.apply_light_estimate(estimate);
    }
}

fn remove_fallen_objects(
    mut contacts: MessageReader<ContactStarted>,
    mut coordinator: ResMut<SceneCoordinator>,
    mut physics: ResMut<PhysicsState>,
) {
    for contact in contacts.read() {
        coordinator.on_contact(contact, &mut physics);
    }
}

/// Losing focus pauses tracking the way backgrounding a device would.
fn follow_window_focus(
    mut focus: MessageReader<WindowFocused>,
    mut tracking: ResMut<Tracking>,
) {
    for event in focus.read() {
        let session = tracking.session_mut();
        if event.focused {
            let config = session.configuration();
            session.run(&config);
        } else {
            session.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_follows_detect_planes() {
        let mut config = SandboxConfig::default();
        assert_eq!(session_config(&config).plane_detection, PlaneDetection::Horizontal);
        config.detect_planes = false;
        assert_eq!(session_config(&config).plane_detection, PlaneDetection::None);
        assert!(session_config(&config).light_estimation);
    }
}
