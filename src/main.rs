use bevy::prelude::*;
use sandbox_core::{
    load_config, DeviceCamera, SandboxConfig, SandboxPlugin, SceneLight, DEFAULT_CONFIG_PATH,
};
use sandbox_physics::PhysicsPlugin;

/// Directional light strength under neutral lighting.
const SUN_ILLUMINANCE: f32 = 8_000.0;

fn main() {
    // Logging is not up yet; report the failure from the first startup system.
    let (config, load_error) = match load_config(DEFAULT_CONFIG_PATH) {
        Ok(config) => (config, None),
        Err(err) => (SandboxConfig::default(), Some(err.to_string())),
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "AR Sandbox".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(PhysicsPlugin)
        .add_plugins(SandboxPlugin::new(config))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)))
        .add_systems(Startup, setup)
        .add_systems(Startup, move || {
            if let Some(err) = &load_error {
                warn!(
                    "Using default settings, {} could not be loaded: {}",
                    DEFAULT_CONFIG_PATH, err
                );
            }
        })
        .run();
}

fn setup(mut commands: Commands) {
    let device = DeviceCamera::default();
    let transform = device.transform();
    commands.spawn((Camera3d::default(), device, transform));

    commands.spawn((
        DirectionalLight {
            illuminance: SUN_ILLUMINANCE,
            shadows_enabled: true,
            ..default()
        },
        SceneLight {
            base_illuminance: SUN_ILLUMINANCE,
        },
        Transform::from_xyz(2.0, 4.0, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
