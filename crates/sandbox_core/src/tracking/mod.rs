//! Seam to the AR tracking subsystem.
//!
//! The sandbox never estimates poses or detects surfaces itself. It consumes a
//! [`TrackingSession`] that reports anchor lifecycle events, a light estimate
//! and answers hit-test queries against the surfaces it already tracks.

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::anchor::{Anchor, HitResult};

pub mod simulated;

pub use simulated::{ScriptedSurface, SimulatedSession};

/// Which surfaces the session looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaneDetection {
    /// Surface detection is off; tracked surfaces stop changing.
    None,
    #[default]
    Horizontal,
}

/// Running configuration of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub light_estimation: bool,
    pub plane_detection: PlaneDetection,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            light_estimation: true,
            plane_detection: PlaneDetection::Horizontal,
        }
    }
}

/// Errors reported by the tracking session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The session stopped and cannot continue without a restart.
    Failed(String),
    /// Tracking was interrupted, e.g. the device camera became unavailable.
    Interrupted,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Failed(reason) => write!(f, "Tracking session failed: {}", reason),
            SessionError::Interrupted => write!(f, "Tracking session interrupted"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Everything a session can report during a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AnchorAdded(Anchor),
    AnchorUpdated(Anchor),
    /// The anchor is no longer tracked, typically because it was merged into
    /// a neighbouring surface.
    AnchorRemoved(Anchor),
    Failed(SessionError),
    Interrupted,
    InterruptionEnded,
}

/// Per-frame ambient light estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEstimate {
    /// Ambient intensity in lumens; 1000 is neutral lighting.
    pub ambient_intensity: f32,
}

impl LightEstimate {
    pub const NEUTRAL_INTENSITY: f32 = 1000.0;

    /// Intensity scaled so that neutral lighting is 1.0.
    pub fn normalized(&self) -> f32 {
        self.ambient_intensity / Self::NEUTRAL_INTENSITY
    }
}

/// AR tracking subsystem.
pub trait TrackingSession: Send + Sync + 'static {
    /// Start or reconfigure the session.
    fn run(&mut self, config: &SessionConfig);

    /// Pause tracking; pending anchors stop changing until `run` is called.
    fn pause(&mut self);

    fn configuration(&self) -> SessionConfig;

    /// Advance the session clock and collect the events of this frame.
    fn poll_events(&mut self, dt: f32) -> Vec<SessionEvent>;

    /// Light estimate of the latest frame, if light estimation is enabled.
    fn light_estimate(&self) -> Option<LightEstimate>;

    /// Hit test against existing surfaces, bounded by their extent.
    ///
    /// Hits are ordered nearest first.
    fn hit_test(&self, ray: Ray3d) -> Vec<HitResult>;

    /// Feature points of the latest frame, in world space.
    fn feature_points(&self) -> Vec<Vec3> {
        Vec::new()
    }
}

/// Resolves a screen point to surface hits.
pub trait HitTester {
    fn hit_test(&self, screen_point: Vec2) -> Vec<HitResult>;
}

/// Hit tester that casts a ray from a camera through a viewport point.
pub struct ScreenHitTester<'a> {
    pub camera: &'a Camera,
    pub camera_transform: &'a GlobalTransform,
    pub session: &'a dyn TrackingSession,
}

impl HitTester for ScreenHitTester<'_> {
    fn hit_test(&self, screen_point: Vec2) -> Vec<HitResult> {
        match self
            .camera
            .viewport_to_world(self.camera_transform, screen_point)
        {
            Ok(ray) => self.session.hit_test(ray),
            Err(_) => Vec::new(),
        }
    }
}

/// The tracking session driving the sandbox.
#[derive(Resource)]
pub struct Tracking(pub Box<dyn TrackingSession>);

impl Tracking {
    pub fn new(session: impl TrackingSession) -> Self {
        Self(Box::new(session))
    }

    pub fn session(&self) -> &dyn TrackingSession {
        self.0.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn TrackingSession {
        self.0.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_light_normalizes_to_one() {
        let estimate = LightEstimate {
            ambient_intensity: 1000.0,
        };
        assert_eq!(estimate.normalized(), 1.0);
        let dim = LightEstimate {
            ambient_intensity: 250.0,
        };
        assert_eq!(dim.normalized(), 0.25);
    }

    #[test]
    fn test_default_session_detects_horizontal_surfaces() {
        let config = SessionConfig::default();
        assert!(config.light_estimation);
        assert_eq!(config.plane_detection, PlaneDetection::Horizontal);
    }

    #[test]
    fn test_session_error_messages() {
        assert_eq!(
            SessionError::Failed("camera denied".into()).to_string(),
            "Tracking session failed: camera denied"
        );
        assert_eq!(
            SessionError::Interrupted.to_string(),
            "Tracking session interrupted"
        );
    }
}
