//! Core of the AR sandbox.
//!
//! This crate provides:
//! - Anchors and the tracking session seam, with a simulated session
//! - Surfaces that follow tracked anchors
//! - Droppable cubes, explosions and the catch plane
//! - The scene coordinator that owns all of the above
//! - Rendering, input and the debug overlay
//! - Configuration loading

pub mod anchor;
pub mod camera;
pub mod config;
pub mod coordinator;
pub mod cube;
pub mod input;
pub mod material;
pub mod overlay;
pub mod sandbox_plugin;
pub mod scene;
pub mod surface;
pub mod tracking;

pub use anchor::{hit_test_surfaces, Anchor, AnchorId, HitResult, SurfaceAnchor};
pub use camera::{device_camera_system, DeviceCamera};
pub use config::{
    load_config, save_config, ConfigError, ConfigResult, DebugOptions, DisplayConfig,
    PhysicsTuning, SandboxConfig, SimulationConfig, DEFAULT_CONFIG_PATH,
};
pub use coordinator::{explosion_impulse, explosion_scale, SceneCoordinator, SceneNode};
pub use cube::{CatchPlane, DynamicObject, ObjectId};
pub use input::{Gesture, GestureRecognizer, EXPLODE_HOLD_DURATION, LONG_PRESS_DURATION};
pub use material::{FaceMaterial, MaterialKind};
pub use overlay::{statistics_line, NotificationText, StatisticsText};
pub use sandbox_plugin::SandboxPlugin;
pub use scene::{pick_node, MaterialLibrary, SceneLight};
pub use surface::{BoxGeometry, Surface, SURFACE_HEIGHT};
pub use tracking::{
    HitTester, LightEstimate, PlaneDetection, ScreenHitTester, ScriptedSurface, SessionConfig,
    SessionError, SessionEvent, SimulatedSession, Tracking, TrackingSession,
};
