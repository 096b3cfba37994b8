//! Debug overlay driven by [`DebugOptions`], plus the notification banner.

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use sandbox_physics::PhysicsState;

use crate::config::DebugOptions;
use crate::coordinator::SceneCoordinator;
use crate::tracking::Tracking;

/// How long a notification stays on screen, in seconds.
pub const NOTIFICATION_DURATION: f32 = 3.0;

const AXIS_LENGTH: f32 = 0.1;
const FEATURE_POINT_RADIUS: f32 = 0.004;

#[derive(Component)]
pub struct StatisticsText;

#[derive(Component)]
pub struct NotificationText {
    remaining: f32,
}

pub fn spawn_overlay_text(mut commands: Commands) {
    commands.spawn((
        StatisticsText,
        Text::new(""),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
        Visibility::Hidden,
    ));
    commands.spawn((
        NotificationText { remaining: 0.0 },
        Text::new(""),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        Visibility::Hidden,
    ));
}

/// World origin axes, feature points and collider wireframes.
pub fn draw_debug_gizmos(
    mut gizmos: Gizmos,
    coordinator: Res<SceneCoordinator>,
    tracking: Res<Tracking>,
    physics: Res<PhysicsState>,
) {
    let options = coordinator.debug_options();

    if options.contains(DebugOptions::SHOW_WORLD_ORIGIN) {
        gizmos.line(Vec3::ZERO, Vec3::X * AXIS_LENGTH, Color::srgb(1.0, 0.0, 0.0));
        gizmos.line(Vec3::ZERO, Vec3::Y * AXIS_LENGTH, Color::srgb(0.0, 1.0, 0.0));
        gizmos.line(Vec3::ZERO, Vec3::Z * AXIS_LENGTH, Color::srgb(0.0, 0.0, 1.0));
    }

    if options.contains(DebugOptions::SHOW_FEATURE_POINTS) {
        for point in tracking.session().feature_points() {
            gizmos.sphere(point, FEATURE_POINT_RADIUS, Color::srgb(1.0, 0.9, 0.1));
        }
    }

    if options.contains(DebugOptions::SHOW_PHYSICS_SHAPES) {
        for line in physics.debug_lines() {
            gizmos.line(line.start, line.end, line.color);
        }
    }
}

pub fn update_statistics_text(
    coordinator: Res<SceneCoordinator>,
    diagnostics: Res<DiagnosticsStore>,
    physics: Res<PhysicsState>,
    mut query: Query<(&mut Text, &mut Visibility), With<StatisticsText>>,
) {
    let shown = coordinator
        .debug_options()
        .contains(DebugOptions::SHOW_STATISTICS);

    for (mut text, mut visibility) in query.iter_mut() {
        if !shown {
            *visibility = Visibility::Hidden;
            continue;
        }
        *visibility = Visibility::Inherited;

        let fps = diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FPS)
            .and_then(|d| d.smoothed());
        let frame_ms = diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
            .and_then(|d| d.smoothed());
        text.0 = statistics_line(
            fps,
            frame_ms,
            coordinator.surfaces().len(),
            coordinator.objects().len(),
            physics.rigid_body_set.len(),
        );
    }
}

pub fn statistics_line(
    fps: Option<f64>,
    frame_ms: Option<f64>,
    surfaces: usize,
    cubes: usize,
    bodies: usize,
) -> String {
    let timing = match (fps, frame_ms) {
        (Some(fps), Some(frame_ms)) => format!("FPS: {:.1} | Frame: {:.2}ms", fps, frame_ms),
        (Some(fps), None) => format!("FPS: {:.1}", fps),
        _ => "FPS: --".to_string(),
    };
    format!(
        "{} | Surfaces: {} | Cubes: {} | Bodies: {}",
        timing, surfaces, cubes, bodies
    )
}

/// Show the coordinator's pending notifications for a few seconds, one per
/// line.
pub fn show_notifications(
    time: Res<Time>,
    mut coordinator: ResMut<SceneCoordinator>,
    mut query: Query<(&mut NotificationText, &mut Text, &mut Visibility)>,
) {
    let pending = coordinator.take_notifications();
    for (mut banner, mut text, mut visibility) in query.iter_mut() {
        if !pending.is_empty() {
            text.0 = pending.join("\n");
            banner.remaining = NOTIFICATION_DURATION;
            *visibility = Visibility::Inherited;
        } else if banner.remaining > 0.0 {
            banner.remaining -= time.delta_secs();
            if banner.remaining <= 0.0 {
                *visibility = Visibility::Hidden;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_line_with_timing() {
        let line = statistics_line(Some(59.94), Some(16.68), 2, 5, 8);
        assert_eq!(
            line,
            "FPS: 59.9 | Frame: 16.68ms | Surfaces: 2 | Cubes: 5 | Bodies: 8"
        );
    }

    #[test]
    fn test_statistics_line_before_first_sample() {
        let line = statistics_line(None, None, 0, 0, 1);
        assert!(line.starts_with("FPS: --"));
    }
}
