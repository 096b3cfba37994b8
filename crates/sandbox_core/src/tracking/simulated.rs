//! Scripted stand-in for a device tracking session.
//!
//! Surfaces appear at fixed times, grow towards a final extent, drift their
//! center as more of the surface is seen, and may be merged into a neighbour
//! (reported as a removal). Pausing the session is reported as an
//! interruption.

use bevy::math::Ray3d;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{LightEstimate, PlaneDetection, SessionConfig, SessionEvent, TrackingSession};
use crate::anchor::{hit_test_surfaces, Anchor, AnchorId, HitResult, SurfaceAnchor};
use crate::config::SimulationConfig;

/// Timeline of one simulated surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedSurface {
    pub id: AnchorId,
    /// World position of the anchor.
    pub origin: Vec3,
    /// Session time at which the surface is first detected.
    pub appear_at: f32,
    /// Time taken to grow from `start_extent` to `final_extent`.
    pub grow_duration: f32,
    pub start_extent: Vec2,
    pub final_extent: Vec2,
    /// Anchor-local center offset once fully grown.
    pub center_drift: Vec3,
    /// Session time at which the surface is merged into a neighbour.
    pub merged_at: Option<f32>,
}

impl ScriptedSurface {
    pub fn new(origin: Vec3, appear_at: f32, extent: Vec2) -> Self {
        Self {
            id: AnchorId::new_v4(),
            origin,
            appear_at,
            grow_duration: 0.0,
            start_extent: extent,
            final_extent: extent,
            center_drift: Vec3::ZERO,
            merged_at: None,
        }
    }

    pub fn growing_to(mut self, final_extent: Vec2, duration: f32) -> Self {
        self.final_extent = final_extent;
        self.grow_duration = duration;
        self
    }

    pub fn drifting(mut self, center_drift: Vec3) -> Self {
        self.center_drift = center_drift;
        self
    }

    pub fn merged_at(mut self, time: f32) -> Self {
        self.merged_at = Some(time);
        self
    }

    /// The anchor as it would be reported at `time`.
    pub fn anchor_at(&self, time: f32) -> SurfaceAnchor {
        let progress = if self.grow_duration > 0.0 {
            ((time - self.appear_at) / self.grow_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        SurfaceAnchor::new(
            self.id,
            Transform::from_translation(self.origin),
            self.center_drift * progress,
            self.start_extent.lerp(self.final_extent, progress),
        )
    }

    fn is_merged(&self, time: f32) -> bool {
        self.merged_at.is_some_and(|at| time >= at)
    }
}

#[derive(Debug, Clone, Copy)]
enum TrackState {
    Pending,
    Live {
        reported: SurfaceAnchor,
        since_update: f32,
    },
    Gone,
}

pub struct SimulatedSession {
    config: SessionConfig,
    started: bool,
    running: bool,
    elapsed: f32,
    update_interval: f32,
    surfaces: Vec<(ScriptedSurface, TrackState)>,
    point_anchor: Option<Anchor>,
    points_per_surface: usize,
    feature_points: Vec<Vec3>,
    rng: StdRng,
    queued: Vec<SessionEvent>,
}

impl SimulatedSession {
    /// Session with the default room layout: a desk that grows and absorbs a
    /// neighbouring fragment, and a floor detected a little later.
    pub fn new(settings: &SimulationConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let jitter = |rng: &mut StdRng| {
            Vec3::new(rng.gen_range(-0.1..0.1), 0.0, rng.gen_range(-0.1..0.1))
        };

        let desk_origin = Vec3::new(0.0, -0.5, -1.5) + jitter(&mut rng);
        let floor_origin = Vec3::new(0.0, -1.4, -1.0) + jitter(&mut rng);
        let surfaces = vec![
            ScriptedSurface::new(desk_origin, 0.5, Vec2::new(0.4, 0.3))
                .growing_to(Vec2::new(1.6, 1.0), 6.0)
                .drifting(Vec3::new(0.2, 0.0, 0.1)),
            ScriptedSurface::new(desk_origin + Vec3::new(0.9, 0.0, 0.0), 1.2, Vec2::new(0.3, 0.3))
                .growing_to(Vec2::new(0.5, 0.4), 2.0)
                .merged_at(5.0),
            ScriptedSurface::new(floor_origin, 2.5, Vec2::new(0.8, 0.8))
                .growing_to(Vec2::new(3.0, 2.5), 8.0),
        ];

        Self::with_rng(surfaces, settings, rng)
    }

    /// Session that plays back the given surfaces.
    pub fn with_surfaces(surfaces: Vec<ScriptedSurface>, settings: &SimulationConfig) -> Self {
        Self::with_rng(surfaces, settings, StdRng::seed_from_u64(settings.seed))
    }

    fn with_rng(surfaces: Vec<ScriptedSurface>, settings: &SimulationConfig, rng: StdRng) -> Self {
        Self {
            config: SessionConfig::default(),
            started: false,
            running: false,
            elapsed: 0.0,
            update_interval: settings.update_interval,
            surfaces: surfaces
                .into_iter()
                .map(|surface| (surface, TrackState::Pending))
                .collect(),
            point_anchor: Some(Anchor::Point {
                id: AnchorId::new_v4(),
                transform: Transform::from_xyz(0.0, 0.0, -1.0),
            }),
            points_per_surface: settings.feature_points_per_surface,
            feature_points: Vec::new(),
            rng,
            queued: Vec::new(),
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Surfaces currently tracked, as last reported.
    pub fn tracked_surfaces(&self) -> impl Iterator<Item = &SurfaceAnchor> {
        self.surfaces.iter().filter_map(|(_, state)| match state {
            TrackState::Live { reported, .. } => Some(reported),
            _ => None,
        })
    }

    fn advance_surfaces(&mut self, dt: f32, events: &mut Vec<SessionEvent>) {
        let now = self.elapsed;
        let interval = self.update_interval;
        for (script, state) in &mut self.surfaces {
            match state {
                TrackState::Pending => {
                    if script.is_merged(now) {
                        *state = TrackState::Gone;
                    } else if now >= script.appear_at {
                        let anchor = script.anchor_at(now);
                        events.push(SessionEvent::AnchorAdded(Anchor::Surface(anchor)));
                        *state = TrackState::Live {
                            reported: anchor,
                            since_update: 0.0,
                        };
                    }
                }
                TrackState::Live {
                    reported,
                    since_update,
                } => {
                    if script.is_merged(now) {
                        events.push(SessionEvent::AnchorRemoved(Anchor::Surface(*reported)));
                        *state = TrackState::Gone;
                        continue;
                    }
                    *since_update += dt;
                    let current = script.anchor_at(now);
                    if current != *reported && *since_update >= interval {
                        events.push(SessionEvent::AnchorUpdated(Anchor::Surface(current)));
                        *reported = current;
                        *since_update = 0.0;
                    }
                }
                TrackState::Gone => {}
            }
        }
    }

    fn refresh_feature_points(&mut self) {
        let live: Vec<SurfaceAnchor> = self.tracked_surfaces().copied().collect();
        self.feature_points.clear();
        for anchor in live {
            let half = anchor.extent * 0.5;
            for _ in 0..self.points_per_surface {
                let local = anchor.center
                    + Vec3::new(
                        self.rng.gen_range(-half.x..=half.x),
                        self.rng.gen_range(-0.01..=0.01),
                        self.rng.gen_range(-half.y..=half.y),
                    );
                self.feature_points
                    .push(anchor.transform.transform_point(local));
            }
        }
    }
}

impl TrackingSession for SimulatedSession {
    fn run(&mut self, config: &SessionConfig) {
        if self.started && !self.running {
            self.queued.push(SessionEvent::InterruptionEnded);
        }
        self.config = *config;
        self.started = true;
        self.running = true;
    }

    fn pause(&mut self) {
        if self.running {
            self.running = false;
            self.queued.push(SessionEvent::Interrupted);
        }
    }

    fn configuration(&self) -> SessionConfig {
        self.config
    }

    fn poll_events(&mut self, dt: f32) -> Vec<SessionEvent> {
        let mut events = std::mem::take(&mut self.queued);
        if !self.running {
            return events;
        }
        self.elapsed += dt;

        if let Some(point) = self.point_anchor.take() {
            events.push(SessionEvent::AnchorAdded(point));
        }

        if self.config.plane_detection == PlaneDetection::Horizontal {
            let before = events.len();
            self.advance_surfaces(dt, &mut events);
            if events.len() != before {
                self.refresh_feature_points();
            }
        }
        events
    }

    fn light_estimate(&self) -> Option<LightEstimate> {
        if !self.started || !self.config.light_estimation {
            return None;
        }
        Some(LightEstimate {
            ambient_intensity: LightEstimate::NEUTRAL_INTENSITY
                + 350.0 * (self.elapsed * 0.3).sin(),
        })
    }

    fn hit_test(&self, ray: Ray3d) -> Vec<HitResult> {
        hit_test_surfaces(ray, self.tracked_surfaces())
    }

    fn feature_points(&self) -> Vec<Vec3> {
        self.feature_points.clone()
    }
}
