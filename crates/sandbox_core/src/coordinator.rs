//! Scene coordinator.
//!
//! Owns the anchor → surface mapping, the ordered list of dropped cubes and
//! the catch plane. Tracking events, contacts and gestures all end up here;
//! surfaces and cubes never touch the mapping or the list themselves.

use std::collections::{HashMap, VecDeque};

use bevy::prelude::*;
use sandbox_physics::{fallen_out, ContactStarted, PhysicsState};

use crate::anchor::{Anchor, AnchorId};
use crate::config::{DebugOptions, DisplayConfig, PhysicsTuning, SandboxConfig};
use crate::cube::{CatchPlane, DynamicObject, ObjectId};
use crate::material::MaterialKind;
use crate::surface::Surface;
use crate::tracking::{HitTester, LightEstimate, PlaneDetection, SessionEvent, TrackingSession};

/// What a rendered scene entity stands for.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneNode {
    Surface(AnchorId),
    DynamicObject(ObjectId),
}

#[derive(Resource)]
pub struct SceneCoordinator {
    surfaces: HashMap<AnchorId, Surface>,
    objects: Vec<DynamicObject>,
    catch_plane: CatchPlane,
    display: DisplayConfig,
    debug_options: DebugOptions,
    tuning: PhysicsTuning,
    cube_material: MaterialKind,
    surface_material: MaterialKind,
    surfaces_hidden: bool,
    tracking_enabled: bool,
    light_intensity: f32,
    next_object_id: u64,
    notifications: VecDeque<String>,
}

impl SceneCoordinator {
    /// Create the coordinator and its catch plane.
    pub fn new(config: &SandboxConfig, physics: &mut PhysicsState) -> Self {
        let catch_plane = CatchPlane::create(config.physics.catch_plane_height, physics);
        Self {
            surfaces: HashMap::new(),
            objects: Vec::new(),
            catch_plane,
            display: config.display,
            debug_options: config.display.debug_options(),
            tuning: config.physics,
            cube_material: MaterialKind::default(),
            surface_material: MaterialKind::default(),
            surfaces_hidden: false,
            tracking_enabled: config.detect_planes,
            light_intensity: 1.0,
            next_object_id: 0,
            notifications: VecDeque::new(),
        }
    }

    /// Start tracking a newly detected surface. Non-surface anchors are ignored.
    pub fn on_anchor_added(&mut self, anchor: &Anchor, physics: &mut PhysicsState) -> bool {
        let Some(anchor) = anchor.as_surface() else {
            debug!("Ignoring non-surface anchor {}", anchor.id());
            return false;
        };

        let surface = Surface::create(anchor, self.surface_material, self.surfaces_hidden, physics);
        if let Some(stale) = self.surfaces.insert(anchor.id, surface) {
            stale.destroy(physics);
        }
        info!(
            "Surface {} detected ({:.2} x {:.2})",
            anchor.id, anchor.extent.x, anchor.extent.y
        );
        true
    }

    /// Follow an anchor update. Unknown anchors are a no-op.
    pub fn on_anchor_updated(&mut self, anchor: &Anchor, physics: &mut PhysicsState) -> bool {
        let Some(anchor) = anchor.as_surface() else {
            return false;
        };
        let Some(surface) = self.surfaces.get_mut(&anchor.id) else {
            debug!("Update for untracked surface {}", anchor.id);
            return false;
        };

        surface.update(anchor, physics);
        // Cubes resting on the old shape may be asleep.
        physics.wake_dynamic_bodies();
        true
    }

    /// Stop tracking a surface, e.g. after it was merged into a neighbour.
    pub fn on_anchor_removed(&mut self, id: AnchorId, physics: &mut PhysicsState) -> bool {
        let Some(surface) = self.surfaces.remove(&id) else {
            return false;
        };
        surface.destroy(physics);
        physics.wake_dynamic_bodies();
        info!("Surface {} removed", id);
        true
    }

    /// Drop a cube above the nearest surface under `screen_point`.
    pub fn insert_object(
        &mut self,
        screen_point: Vec2,
        hit_tester: &impl HitTester,
        physics: &mut PhysicsState,
    ) -> Option<ObjectId> {
        let Some(hit) = hit_tester.hit_test(screen_point).into_iter().next() else {
            debug!("No surface under {:?}, nothing inserted", screen_point);
            return None;
        };
        let position = hit.position() + Vec3::Y * self.tuning.insertion_offset;
        Some(self.insert_object_at(position, physics))
    }

    /// Spawn a cube at a world position with the current cube material.
    pub fn insert_object_at(&mut self, position: Vec3, physics: &mut PhysicsState) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        let object = DynamicObject::create(
            id,
            position,
            self.cube_material,
            self.tuning.cube_size,
            self.tuning.cube_mass,
            physics,
        );
        self.objects.push(object);
        debug!("Inserted cube {:?} at {:?}", id, position);
        id
    }

    /// Trigger an explosion just below the nearest surface under `screen_point`.
    ///
    /// Returns the number of cubes that received an impulse.
    pub fn explode(
        &mut self,
        screen_point: Vec2,
        hit_tester: &impl HitTester,
        physics: &mut PhysicsState,
    ) -> usize {
        let Some(hit) = hit_tester.hit_test(screen_point).into_iter().next() else {
            debug!("No surface under {:?}, no explosion", screen_point);
            return 0;
        };
        // Below the surface so cubes are thrown upwards off it.
        let origin = hit.position() - Vec3::Y * self.tuning.explosion_offset;
        self.explode_at(origin, physics)
    }

    /// Push every cube within range away from `origin`.
    pub fn explode_at(&mut self, origin: Vec3, physics: &mut PhysicsState) -> usize {
        let offset = self.tuning.impulse_offset();
        let mut pushed = 0;
        // Few cubes are ever alive at once, a linear scan is enough.
        for object in &self.objects {
            let Some(position) = object.world_position(physics) else {
                continue;
            };
            let Some(impulse) = explosion_impulse(origin, position, &self.tuning) else {
                continue;
            };
            // Off-center so the cube tumbles.
            if physics.apply_impulse_at_local_point(object.body(), impulse, offset) {
                pushed += 1;
            }
        }
        info!("Explosion at {:?} pushed {} cube(s)", origin, pushed);
        pushed
    }

    /// Remove a cube that touched the catch plane.
    ///
    /// The pair may arrive in either order. Returns the removed object.
    pub fn on_contact(
        &mut self,
        contact: &ContactStarted,
        physics: &mut PhysicsState,
    ) -> Option<ObjectId> {
        let body = fallen_out(
            (contact.category_a, contact.body_a),
            (contact.category_b, contact.body_b),
        )?;
        let index = self.objects.iter().position(|object| object.body() == body)?;
        let object = self.objects.remove(index);
        physics.remove_body(body);
        info!("Cube {:?} fell out of the world", object.id());
        Some(object.id())
    }

    /// Turn surface detection on or off in the running session.
    ///
    /// Existing surfaces are kept either way.
    pub fn set_tracking_enabled(&mut self, enabled: bool, session: &mut dyn TrackingSession) {
        if enabled == self.tracking_enabled {
            return;
        }
        self.tracking_enabled = enabled;

        let mut config = session.configuration();
        config.plane_detection = if enabled {
            PlaneDetection::Horizontal
        } else {
            PlaneDetection::None
        };
        session.run(&config);
        info!("Surface detection {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Replace the display switches and return the matching renderer flags.
    pub fn apply_display_config(&mut self, config: DisplayConfig) -> DebugOptions {
        self.display = config;
        self.debug_options = config.debug_options();
        self.debug_options
    }

    /// Make every surface invisible; tracking continues. Surfaces detected
    /// afterwards start hidden.
    pub fn hide_surfaces(&mut self) {
        self.surfaces_hidden = true;
        for surface in self.surfaces.values_mut() {
            surface.hide();
        }
    }

    /// Switch the material of the surface or cube behind `node`.
    ///
    /// The new material also becomes the default for that kind of node.
    pub fn cycle_material(&mut self, node: SceneNode) -> Option<MaterialKind> {
        match node {
            SceneNode::Surface(id) => {
                let material = self.surfaces.get_mut(&id)?.cycle_material();
                self.surface_material = material;
                Some(material)
            }
            SceneNode::DynamicObject(id) => {
                let object = self.objects.iter_mut().find(|object| object.id() == id)?;
                let material = object.cycle_material();
                self.cube_material = material;
                Some(material)
            }
        }
    }

    /// Select the next material for cubes inserted from now on.
    pub fn cycle_cube_material(&mut self) -> MaterialKind {
        self.cube_material = self.cube_material.next();
        self.cube_material
    }

    /// Store the normalized light intensity for the scene lighting.
    pub fn apply_light_estimate(&mut self, estimate: LightEstimate) -> f32 {
        self.light_intensity = estimate.normalized();
        self.light_intensity
    }

    /// Dispatch one tracking session event.
    pub fn on_session_event(&mut self, event: &SessionEvent, physics: &mut PhysicsState) {
        match event {
            SessionEvent::AnchorAdded(anchor) => {
                self.on_anchor_added(anchor, physics);
            }
            SessionEvent::AnchorUpdated(anchor) => {
                self.on_anchor_updated(anchor, physics);
            }
            SessionEvent::AnchorRemoved(anchor) => {
                self.on_anchor_removed(anchor.id(), physics);
            }
            SessionEvent::Failed(error) => {
                warn!("{}", error);
                self.notifications.push_back(error.to_string());
            }
            SessionEvent::Interrupted => {
                warn!("Tracking session interrupted");
                self.notifications.push_back("Tracking interrupted".to_string());
            }
            SessionEvent::InterruptionEnded => {
                info!("Tracking session resumed");
                self.notifications.push_back("Tracking resumed".to_string());
            }
        }
    }

    /// Drain the pending user notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<String> {
        self.notifications.drain(..).collect()
    }

    pub fn surfaces(&self) -> &HashMap<AnchorId, Surface> {
        &self.surfaces
    }

    pub fn surface(&self, id: AnchorId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn objects(&self) -> &[DynamicObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&DynamicObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn catch_plane(&self) -> &CatchPlane {
        &self.catch_plane
    }

    pub fn display(&self) -> DisplayConfig {
        self.display
    }

    pub fn debug_options(&self) -> DebugOptions {
        self.debug_options
    }

    pub fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    pub fn cube_material(&self) -> MaterialKind {
        self.cube_material
    }

    pub fn surface_material(&self) -> MaterialKind {
        self.surface_material
    }

    pub fn surfaces_hidden(&self) -> bool {
        self.surfaces_hidden
    }

    pub fn tracking_enabled(&self) -> bool {
        self.tracking_enabled
    }

    pub fn light_intensity(&self) -> f32 {
        self.light_intensity
    }
}

/// Strength of an explosion felt at `distance`: quadratic falloff that
/// reaches zero at the maximum distance.
pub fn explosion_scale(distance: f32, tuning: &PhysicsTuning) -> f32 {
    let falloff = (tuning.explosion_max_distance - distance).max(0.0);
    falloff * falloff * tuning.explosion_force_scale
}

/// Impulse an explosion at `origin` applies to a body at `position`.
///
/// `None` when the body is out of range or sits exactly on the origin, where
/// the push direction is undefined.
pub fn explosion_impulse(origin: Vec3, position: Vec3, tuning: &PhysicsTuning) -> Option<Vec3> {
    let displacement = position - origin;
    let distance = displacement.length();
    if distance <= f32::EPSILON {
        return None;
    }
    let scale = explosion_scale(distance, tuning);
    if scale <= 0.0 {
        return None;
    }
    Some(displacement / distance * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{HitResult, SurfaceAnchor};
    use crate::config::SimulationConfig;
    use crate::tracking::{SessionError, SimulatedSession};
    use sandbox_physics::CollisionCategory;

    struct FixedHits(Vec<HitResult>);

    impl HitTester for FixedHits {
        fn hit_test(&self, _screen_point: Vec2) -> Vec<HitResult> {
            self.0.clone()
        }
    }

    fn hit_at(position: Vec3, distance: f32) -> HitResult {
        HitResult {
            anchor: AnchorId::new_v4(),
            distance,
            world_transform: Transform::from_translation(position),
        }
    }

    fn setup() -> (SceneCoordinator, PhysicsState) {
        let mut physics = PhysicsState::new();
        let coordinator = SceneCoordinator::new(&SandboxConfig::default(), &mut physics);
        (coordinator, physics)
    }

    fn weightless() -> (SceneCoordinator, PhysicsState) {
        let (coordinator, mut physics) = setup();
        physics.set_gravity(Vec3::ZERO);
        (coordinator, physics)
    }

    fn surface_anchor(extent: Vec2) -> SurfaceAnchor {
        SurfaceAnchor::new(AnchorId::new_v4(), Transform::IDENTITY, Vec3::ZERO, extent)
    }

    fn bottom_contact(
        coordinator: &SceneCoordinator,
        object: ObjectId,
        cube_first: bool,
    ) -> ContactStarted {
        let cube = coordinator.object(object).unwrap().body();
        let bottom = coordinator.catch_plane().body();
        if cube_first {
            ContactStarted {
                body_a: cube,
                category_a: CollisionCategory::Cube,
                body_b: bottom,
                category_b: CollisionCategory::Bottom,
            }
        } else {
            ContactStarted {
                body_a: bottom,
                category_a: CollisionCategory::Bottom,
                body_b: cube,
                category_b: CollisionCategory::Cube,
            }
        }
    }

    #[test]
    fn test_anchor_added_creates_one_surface() {
        let (mut coordinator, mut physics) = setup();
        let anchor = surface_anchor(Vec2::new(1.5, 0.5));

        assert!(coordinator.on_anchor_added(&Anchor::Surface(anchor), &mut physics));

        assert_eq!(coordinator.surfaces().len(), 1);
        let surface = coordinator.surface(anchor.id).unwrap();
        assert_eq!(surface.geometry().width, 1.5);
        assert_eq!(surface.geometry().length, 0.5);
    }

    #[test]
    fn test_point_anchor_is_ignored() {
        let (mut coordinator, mut physics) = setup();
        let point = Anchor::Point {
            id: AnchorId::new_v4(),
            transform: Transform::IDENTITY,
        };
        assert!(!coordinator.on_anchor_added(&point, &mut physics));
        assert!(coordinator.surfaces().is_empty());
    }

    #[test]
    fn test_readding_an_anchor_replaces_the_stale_surface() {
        let (mut coordinator, mut physics) = setup();
        let anchor = surface_anchor(Vec2::ONE);
        coordinator.on_anchor_added(&Anchor::Surface(anchor), &mut physics);
        coordinator.on_anchor_added(&Anchor::Surface(anchor), &mut physics);

        assert_eq!(coordinator.surfaces().len(), 1);
        // Catch plane plus exactly one surface body.
        assert_eq!(physics.rigid_body_set.len(), 2);
    }

    #[test]
    fn test_anchor_updated_follows_new_extent() {
        let (mut coordinator, mut physics) = setup();
        let mut anchor = surface_anchor(Vec2::ONE);
        coordinator.on_anchor_added(&Anchor::Surface(anchor), &mut physics);

        anchor.extent = Vec2::new(3.0, 2.0);
        assert!(coordinator.on_anchor_updated(&Anchor::Surface(anchor), &mut physics));
        assert!(coordinator.on_anchor_updated(&Anchor::Surface(anchor), &mut physics));

        let surface = coordinator.surface(anchor.id).unwrap();
        assert_eq!(surface.geometry().width, 3.0);
        assert_eq!(surface.geometry().length, 2.0);
        assert_eq!(surface.texture_scale(), Vec2::new(3.0, 2.0));
    }

    #[test]
    fn test_update_for_unknown_anchor_is_a_no_op() {
        let (mut coordinator, mut physics) = setup();
        let anchor = surface_anchor(Vec2::ONE);
        assert!(!coordinator.on_anchor_updated(&Anchor::Surface(anchor), &mut physics));
        assert!(coordinator.surfaces().is_empty());
    }

    #[test]
    fn test_anchor_removed_twice() {
        let (mut coordinator, mut physics) = setup();
        let anchor = surface_anchor(Vec2::ONE);
        coordinator.on_anchor_added(&Anchor::Surface(anchor), &mut physics);
        let body = coordinator.surface(anchor.id).unwrap().body();

        assert!(coordinator.on_anchor_removed(anchor.id, &mut physics));
        assert!(!coordinator.on_anchor_removed(anchor.id, &mut physics));
        assert!(coordinator.surface(anchor.id).is_none());
        assert!(!physics.contains(body));
    }

    #[test]
    fn test_insert_without_hits_changes_nothing() {
        let (mut coordinator, mut physics) = setup();
        let inserted =
            coordinator.insert_object(Vec2::new(10.0, 10.0), &FixedHits(Vec::new()), &mut physics);
        assert!(inserted.is_none());
        assert!(coordinator.objects().is_empty());
        assert_eq!(physics.dynamic_body_count(), 0);
    }

    #[test]
    fn test_insert_drops_cube_above_nearest_hit() {
        let (mut coordinator, mut physics) = setup();
        let hits = FixedHits(vec![
            hit_at(Vec3::new(0.2, 0.0, -1.0), 1.0),
            hit_at(Vec3::new(0.2, -1.0, -1.5), 2.0),
        ]);

        let id = coordinator.insert_object(Vec2::ZERO, &hits, &mut physics).unwrap();

        assert_eq!(coordinator.objects().len(), 1);
        let object = coordinator.object(id).unwrap();
        assert_eq!(object.world_position(&physics), Some(Vec3::new(0.2, 0.5, -1.0)));
        assert_eq!(object.material(), coordinator.cube_material());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let (mut coordinator, mut physics) = setup();
        let first = coordinator.insert_object_at(Vec3::ZERO, &mut physics);
        let second = coordinator.insert_object_at(Vec3::X, &mut physics);
        let ids: Vec<ObjectId> = coordinator.objects().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![first, second]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_explosion_scale_at_unit_distance() {
        let tuning = PhysicsTuning::default();
        assert_eq!(explosion_scale(1.0, &tuning), 5.0);
        let impulse = explosion_impulse(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), &tuning).unwrap();
        assert!((impulse - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_explosion_out_of_range_has_no_effect() {
        let tuning = PhysicsTuning::default();
        assert_eq!(explosion_scale(2.0, &tuning), 0.0);
        assert_eq!(explosion_scale(3.5, &tuning), 0.0);
        assert!(explosion_impulse(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), &tuning).is_none());
    }

    #[test]
    fn test_explosion_at_object_position_is_skipped() {
        let tuning = PhysicsTuning::default();
        assert!(explosion_impulse(Vec3::ONE, Vec3::ONE, &tuning).is_none());
    }

    #[test]
    fn test_explode_pushes_cube_away_from_origin() {
        let (mut coordinator, mut physics) = weightless();
        let id = coordinator.insert_object_at(Vec3::new(0.0, 1.0, 0.0), &mut physics);
        // Hit 0.1 above the origin, the explosion sits 0.1 below the hit.
        let hits = FixedHits(vec![hit_at(Vec3::new(0.0, 0.1, 0.0), 1.0)]);

        assert_eq!(coordinator.explode(Vec2::ZERO, &hits, &mut physics), 1);

        let body = coordinator.object(id).unwrap().body();
        let velocity = physics.linear_velocity(body).unwrap();
        assert!((velocity - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-3);
        assert!(physics.angular_velocity(body).unwrap().length() > 0.0);
    }

    #[test]
    fn test_explode_ignores_far_cubes() {
        let (mut coordinator, mut physics) = weightless();
        let id = coordinator.insert_object_at(Vec3::new(5.0, 0.0, 0.0), &mut physics);

        assert_eq!(coordinator.explode_at(Vec3::ZERO, &mut physics), 0);
        let body = coordinator.object(id).unwrap().body();
        assert_eq!(physics.linear_velocity(body), Some(Vec3::ZERO));
    }

    #[test]
    fn test_explode_without_hits_does_nothing() {
        let (mut coordinator, mut physics) = weightless();
        coordinator.insert_object_at(Vec3::new(0.0, 0.5, 0.0), &mut physics);
        assert_eq!(coordinator.explode(Vec2::ZERO, &FixedHits(Vec::new()), &mut physics), 0);
    }

    #[test]
    fn test_contact_removes_cube_in_either_order() {
        for cube_first in [true, false] {
            let (mut coordinator, mut physics) = setup();
            let kept = coordinator.insert_object_at(Vec3::ZERO, &mut physics);
            let fallen = coordinator.insert_object_at(Vec3::X, &mut physics);
            let contact = bottom_contact(&coordinator, fallen, cube_first);

            assert_eq!(coordinator.on_contact(&contact, &mut physics), Some(fallen));
            assert_eq!(coordinator.objects().len(), 1);
            assert_eq!(coordinator.objects()[0].id(), kept);
            assert!(!physics.contains(contact.body_a) || !physics.contains(contact.body_b));
            assert!(physics.contains(coordinator.catch_plane().body()));
        }
    }

    #[test]
    fn test_contact_between_other_categories_is_ignored() {
        let (mut coordinator, mut physics) = setup();
        let a = coordinator.insert_object_at(Vec3::ZERO, &mut physics);
        let b = coordinator.insert_object_at(Vec3::X, &mut physics);
        let contact = ContactStarted {
            body_a: coordinator.object(a).unwrap().body(),
            category_a: CollisionCategory::Cube,
            body_b: coordinator.object(b).unwrap().body(),
            category_b: CollisionCategory::Cube,
        };

        assert_eq!(coordinator.on_contact(&contact, &mut physics), None);
        assert_eq!(coordinator.objects().len(), 2);
    }

    #[test]
    fn test_tracking_toggle_reconfigures_session() {
        let (mut coordinator, _physics) = setup();
        let mut session = SimulatedSession::with_surfaces(Vec::new(), &SimulationConfig::default());
        session.run(&Default::default());

        coordinator.set_tracking_enabled(false, &mut session);
        assert!(!coordinator.tracking_enabled());
        assert_eq!(session.configuration().plane_detection, PlaneDetection::None);
        assert!(session.configuration().light_estimation);

        coordinator.set_tracking_enabled(true, &mut session);
        assert_eq!(session.configuration().plane_detection, PlaneDetection::Horizontal);
    }

    #[test]
    fn test_disabling_tracking_keeps_surfaces() {
        let (mut coordinator, mut physics) = setup();
        let mut session = SimulatedSession::with_surfaces(Vec::new(), &SimulationConfig::default());
        let anchor = surface_anchor(Vec2::ONE);
        coordinator.on_anchor_added(&Anchor::Surface(anchor), &mut physics);

        coordinator.set_tracking_enabled(false, &mut session);
        assert!(coordinator.surface(anchor.id).is_some());
    }

    #[test]
    fn test_display_config_translation() {
        let (mut coordinator, _physics) = setup();
        let options = coordinator.apply_display_config(DisplayConfig {
            show_world_origin: false,
            show_feature_points: false,
            show_physics_bodies: true,
            show_statistics: true,
        });
        assert_eq!(
            options,
            DebugOptions::SHOW_PHYSICS_SHAPES | DebugOptions::SHOW_STATISTICS
        );
        assert_eq!(coordinator.debug_options(), options);
    }

    #[test]
    fn test_hidden_mode_applies_to_new_surfaces() {
        let (mut coordinator, mut physics) = setup();
        let first = surface_anchor(Vec2::ONE);
        coordinator.on_anchor_added(&Anchor::Surface(first), &mut physics);
        coordinator.hide_surfaces();
        let second = surface_anchor(Vec2::ONE);
        coordinator.on_anchor_added(&Anchor::Surface(second), &mut physics);

        assert!(coordinator.surfaces().values().all(|surface| surface.is_hidden()));
    }

    #[test]
    fn test_cycle_material_resolves_node_kind() {
        let (mut coordinator, mut physics) = setup();
        let anchor = surface_anchor(Vec2::ONE);
        coordinator.on_anchor_added(&Anchor::Surface(anchor), &mut physics);
        let cube = coordinator.insert_object_at(Vec3::ZERO, &mut physics);

        let surface_material = coordinator.cycle_material(SceneNode::Surface(anchor.id));
        assert_eq!(surface_material, Some(MaterialKind::Granite));
        assert_eq!(coordinator.surface_material(), MaterialKind::Granite);
        assert_eq!(coordinator.object(cube).unwrap().material(), MaterialKind::TronGrid);

        let cube_material = coordinator.cycle_material(SceneNode::DynamicObject(cube));
        assert_eq!(cube_material, Some(MaterialKind::Granite));
        assert_eq!(coordinator.cube_material(), MaterialKind::Granite);

        assert_eq!(
            coordinator.cycle_material(SceneNode::DynamicObject(ObjectId(99))),
            None
        );
    }

    #[test]
    fn test_session_events_are_dispatched() {
        let (mut coordinator, mut physics) = setup();
        let anchor = Anchor::Surface(surface_anchor(Vec2::ONE));

        coordinator.on_session_event(&SessionEvent::AnchorAdded(anchor), &mut physics);
        assert_eq!(coordinator.surfaces().len(), 1);
        coordinator.on_session_event(&SessionEvent::AnchorRemoved(anchor), &mut physics);
        assert!(coordinator.surfaces().is_empty());

        coordinator.on_session_event(
            &SessionEvent::Failed(SessionError::Failed("camera denied".into())),
            &mut physics,
        );
        assert_eq!(
            coordinator.take_notifications(),
            vec!["Tracking session failed: camera denied".to_string()]
        );
        assert!(coordinator.take_notifications().is_empty());
    }

    #[test]
    fn test_interruption_leaves_state_untouched() {
        let (mut coordinator, mut physics) = setup();
        let anchor = Anchor::Surface(surface_anchor(Vec2::ONE));
        coordinator.on_session_event(&SessionEvent::AnchorAdded(anchor), &mut physics);
        coordinator.insert_object_at(Vec3::ZERO, &mut physics);

        coordinator.on_session_event(&SessionEvent::Interrupted, &mut physics);

        assert_eq!(coordinator.surfaces().len(), 1);
        assert_eq!(coordinator.objects().len(), 1);
        assert_eq!(coordinator.take_notifications().len(), 1);
    }

    #[test]
    fn test_notifications_in_one_frame_are_all_kept() {
        let (mut coordinator, mut physics) = setup();

        coordinator.on_session_event(
            &SessionEvent::Failed(SessionError::Failed("camera denied".into())),
            &mut physics,
        );
        coordinator.on_session_event(&SessionEvent::Interrupted, &mut physics);
        coordinator.on_session_event(&SessionEvent::InterruptionEnded, &mut physics);

        assert_eq!(
            coordinator.take_notifications(),
            vec![
                "Tracking session failed: camera denied".to_string(),
                "Tracking interrupted".to_string(),
                "Tracking resumed".to_string(),
            ]
        );
        assert!(coordinator.take_notifications().is_empty());
    }

    #[test]
    fn test_light_estimate_is_normalized() {
        let (mut coordinator, _physics) = setup();
        let intensity = coordinator.apply_light_estimate(LightEstimate {
            ambient_intensity: 1500.0,
        });
        assert_eq!(intensity, 1.5);
        assert_eq!(coordinator.light_intensity(), 1.5);
    }
}
