//! Sandbox configuration.
//!
//! Settings are read from a JSON file (by default `sandbox.json` in the
//! working directory). A missing file yields the defaults, which match the
//! settings the sandbox starts with on a device: world origin and feature
//! points visible, physics shapes and statistics hidden, surface detection on.
//!
//! ```ignore
//! let config = load_config("sandbox.json")?;
//! save_config(&config, "sandbox.json")?;
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "sandbox.json";

/// Errors that can occur while loading or saving the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// Malformed JSON or wrong field types
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Result type for configuration I/O.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level sandbox settings.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub display: DisplayConfig,
    /// Run the tracking session with horizontal surface detection.
    pub detect_planes: bool,
    pub physics: PhysicsTuning,
    pub simulation: SimulationConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            detect_planes: true,
            physics: PhysicsTuning::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Debug visualisation switches edited by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_world_origin: bool,
    pub show_feature_points: bool,
    pub show_physics_bodies: bool,
    pub show_statistics: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_world_origin: true,
            show_feature_points: true,
            show_physics_bodies: false,
            show_statistics: false,
        }
    }
}

impl DisplayConfig {
    /// Translate the switches into renderer debug flags.
    pub fn debug_options(&self) -> DebugOptions {
        let mut options = DebugOptions::empty();
        options.set(DebugOptions::SHOW_WORLD_ORIGIN, self.show_world_origin);
        options.set(DebugOptions::SHOW_FEATURE_POINTS, self.show_feature_points);
        options.set(DebugOptions::SHOW_PHYSICS_SHAPES, self.show_physics_bodies);
        options.set(DebugOptions::SHOW_STATISTICS, self.show_statistics);
        options
    }
}

bitflags::bitflags! {
    /// Renderer debug flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DebugOptions: u32 {
        const SHOW_WORLD_ORIGIN = 1 << 0;
        const SHOW_FEATURE_POINTS = 1 << 1;
        const SHOW_PHYSICS_SHAPES = 1 << 2;
        const SHOW_STATISTICS = 1 << 3;
    }
}

/// Tunables for insertion, explosions and the catch plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Height above the hit point where new cubes are spawned.
    pub insertion_offset: f32,
    /// Depth below the hit point where explosions originate.
    pub explosion_offset: f32,
    /// Distance beyond which an explosion has no effect.
    pub explosion_max_distance: f32,
    /// Multiplier applied to the squared falloff.
    pub explosion_force_scale: f32,
    /// Local point on a cube where explosion impulses are applied.
    pub impulse_offset: [f32; 3],
    /// Edge length of inserted cubes.
    pub cube_size: f32,
    pub cube_mass: f32,
    /// Height of the catch plane that removes fallen cubes.
    pub catch_plane_height: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            insertion_offset: 0.5,
            explosion_offset: 0.1,
            explosion_max_distance: 2.0,
            explosion_force_scale: 5.0,
            impulse_offset: [0.05, 0.05, 0.05],
            cube_size: 0.1,
            cube_mass: 1.0,
            catch_plane_height: -10.0,
        }
    }
}

impl PhysicsTuning {
    pub fn impulse_offset(&self) -> Vec3 {
        Vec3::from_array(self.impulse_offset)
    }
}

/// Settings for the simulated tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for surface placement jitter and the feature point cloud.
    pub seed: u64,
    /// Minimum time between two updates of the same anchor (seconds).
    pub update_interval: f32,
    /// Feature points reported per tracked surface.
    pub feature_points_per_surface: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            update_interval: 0.2,
            feature_points_per_surface: 48,
        }
    }
}

/// Load the configuration from a JSON file.
///
/// Returns the defaults when the file does not exist.
pub fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<SandboxConfig> {
    let file = match File::open(path.as_ref()) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SandboxConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let config = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}

/// Save the configuration as pretty-printed JSON.
pub fn save_config<P: AsRef<Path>>(config: &SandboxConfig, path: P) -> ConfigResult<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), config)?;
    Ok(())
}
