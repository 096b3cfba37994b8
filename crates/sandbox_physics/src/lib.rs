//! Rapier physics world for the AR sandbox.
//!
//! Rapier is driven directly rather than through a Bevy wrapper: the sandbox
//! only needs box bodies, impulses and "contact started" notifications, and
//! the scene coordinator wants plain handles it can store next to its own
//! bookkeeping.

use bevy::prelude::*;
use rapier3d::prelude as rapier;
use rapier::nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::na as nalgebra;
use rapier3d::pipeline::{
    DebugRenderBackend, DebugRenderMode, DebugRenderObject, DebugRenderPipeline, DebugRenderStyle,
};

pub mod collision;
pub mod events;

pub use collision::{fallen_out, CollisionCategory};
pub use events::{ContactChannel, ContactStarted};
pub use rapier::RigidBodyHandle;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PhysicsState::new())
            .add_message::<ContactStarted>()
            .configure_sets(Update, (PhysicsSystems::Step, PhysicsSystems::Sync).chain())
            .add_systems(Update, step_physics.in_set(PhysicsSystems::Step))
            .add_systems(Update, sync_transforms.in_set(PhysicsSystems::Sync));
    }
}

/// Ordering labels for the physics systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicsSystems {
    /// Advance the simulation and publish [`ContactStarted`] messages.
    Step,
    /// Copy body poses onto linked entities.
    Sync,
}

#[derive(Resource)]
pub struct PhysicsState {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
    contacts: ContactChannel,
}

impl PhysicsState {
    pub fn new() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.81, 0.0),
            integration_parameters: rapier::IntegrationParameters::default(),
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            contacts: ContactChannel::new(),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = Vector3::new(gravity.x, gravity.y, gravity.z);
    }

    /// Insert a box-shaped body and return its handle.
    pub fn insert_box(&mut self, body: BoxBody) -> RigidBodyHandle {
        let builder = match body.kind {
            BodyKind::Kinematic => rapier::RigidBodyBuilder::kinematic_position_based(),
            // Cubes are small and fast once an explosion hits them.
            BodyKind::Dynamic => rapier::RigidBodyBuilder::dynamic().ccd_enabled(true),
        };
        let rigid_body = builder
            .position(to_isometry(body.translation, body.rotation))
            .build();
        let handle = self.rigid_body_set.insert(rigid_body);

        let mut collider = rapier::ColliderBuilder::cuboid(
            body.half_extents.x,
            body.half_extents.y,
            body.half_extents.z,
        )
        .collision_groups(body.category.interaction_groups());
        if body.report_contacts {
            collider = collider.active_events(rapier::ActiveEvents::COLLISION_EVENTS);
        }
        if let Some(mass) = body.mass {
            collider = collider.mass(mass);
        }
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Swap the box shape of an existing body and move it.
    ///
    /// Collision groups and event flags of the previous collider are kept.
    /// Returns `false` if the body no longer exists.
    pub fn reshape_box(
        &mut self,
        handle: RigidBodyHandle,
        half_extents: Vec3,
        translation: Vec3,
        rotation: Quat,
    ) -> bool {
        let Some(body) = self.rigid_body_set.get(handle) else {
            return false;
        };
        let previous: Vec<rapier::ColliderHandle> = body.colliders().to_vec();

        let mut groups = rapier::InteractionGroups::all();
        let mut active_events = rapier::ActiveEvents::empty();
        for collider in previous {
            if let Some(removed) = self.collider_set.remove(
                collider,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                true,
            ) {
                groups = removed.collision_groups();
                active_events = removed.active_events();
            }
        }

        let collider =
            rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                .collision_groups(groups)
                .active_events(active_events);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_position(to_isometry(translation, rotation), true);
        }
        true
    }

    /// Remove a body together with its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    /// Wake every dynamic body, e.g. after a supporting surface changed.
    pub fn wake_dynamic_bodies(&mut self) {
        for (_, body) in self.rigid_body_set.iter_mut() {
            if body.is_dynamic() {
                body.wake_up(true);
            }
        }
    }

    /// Apply an instantaneous impulse at a point given in the body's local frame.
    pub fn apply_impulse_at_local_point(
        &mut self,
        handle: RigidBodyHandle,
        impulse: Vec3,
        local_point: Vec3,
    ) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        let world_point = body
            .position()
            .transform_point(&rapier::point![local_point.x, local_point.y, local_point.z]);
        body.apply_impulse_at_point(
            rapier::vector![impulse.x, impulse.y, impulse.z],
            world_point,
            true,
        );
        true
    }

    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// World position of a body's center.
    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec3(body.translation()))
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.rigid_body_set.get(handle).map(|body| {
            let rot = body.rotation();
            Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w)
        })
    }

    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec3(body.linvel()))
    }

    pub fn angular_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec3(body.angvel()))
    }

    /// Category of the first collider attached to a body.
    pub fn body_category(&self, handle: RigidBodyHandle) -> Option<CollisionCategory> {
        let body = self.rigid_body_set.get(handle)?;
        let collider = body.colliders().first()?;
        self.collider_category(*collider)
    }

    pub fn collider_category(&self, handle: rapier::ColliderHandle) -> Option<CollisionCategory> {
        let collider = self.collider_set.get(handle)?;
        CollisionCategory::from_bits(collider.collision_groups().memberships.bits())
    }

    /// Half extents of a body's box collider, if it has one.
    pub fn box_half_extents(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        let body = self.rigid_body_set.get(handle)?;
        let collider = self.collider_set.get(*body.colliders().first()?)?;
        let cuboid = collider.shape().as_cuboid()?;
        Some(to_vec3(&cuboid.half_extents))
    }

    pub fn dynamic_body_count(&self) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .count()
    }

    /// Advance the simulation by one fixed step.
    ///
    /// Returns the categorized contacts that started during this step.
    pub fn step(&mut self) -> Vec<ContactStarted> {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &self.contacts.collector,
        );

        let mut started = Vec::new();
        while let Ok(event) = self.contacts.collision_events.try_recv() {
            if let rapier::CollisionEvent::Started(a, b, _) = event {
                started.extend(self.resolve_contact(a, b));
            }
        }
        started
    }

    fn resolve_contact(
        &self,
        a: rapier::ColliderHandle,
        b: rapier::ColliderHandle,
    ) -> Option<ContactStarted> {
        let body_a = self.collider_set.get(a)?.parent()?;
        let body_b = self.collider_set.get(b)?.parent()?;
        Some(ContactStarted {
            body_a,
            category_a: self.collider_category(a)?,
            body_b,
            category_b: self.collider_category(b)?,
        })
    }

    /// Wireframe segments of every collider shape.
    pub fn debug_lines(&self) -> Vec<DebugLine> {
        let mut pipeline =
            DebugRenderPipeline::new(DebugRenderStyle::default(), DebugRenderMode::COLLIDER_SHAPES);
        let mut lines = LineCollector(Vec::new());
        pipeline.render(
            &mut lines,
            &self.rigid_body_set,
            &self.collider_set,
            &self.impulse_joint_set,
            &self.multibody_joint_set,
            &self.narrow_phase,
        );
        lines.0
    }
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// How a body responds to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moved only by the application, never by forces.
    Kinematic,
    /// Affected by gravity, contacts and impulses.
    Dynamic,
}

/// Description of a box body to insert.
#[derive(Debug, Clone, Copy)]
pub struct BoxBody {
    pub kind: BodyKind,
    pub translation: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
    pub category: CollisionCategory,
    /// Emit contact events for this collider.
    pub report_contacts: bool,
    pub mass: Option<f32>,
}

impl BoxBody {
    pub fn kinematic(translation: Vec3, half_extents: Vec3, category: CollisionCategory) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            translation,
            rotation: Quat::IDENTITY,
            half_extents,
            category,
            report_contacts: false,
            mass: None,
        }
    }

    pub fn dynamic(translation: Vec3, half_extents: Vec3, category: CollisionCategory) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            ..Self::kinematic(translation, half_extents, category)
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn reporting_contacts(mut self) -> Self {
        self.report_contacts = true;
        self
    }
}

/// One wireframe segment produced by [`PhysicsState::debug_lines`].
#[derive(Debug, Clone, Copy)]
pub struct DebugLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
}

struct LineCollector(Vec<DebugLine>);

impl DebugRenderBackend for LineCollector {
    fn draw_line(
        &mut self,
        _object: DebugRenderObject,
        a: rapier::Point<rapier::Real>,
        b: rapier::Point<rapier::Real>,
        color: [f32; 4],
    ) {
        // Rapier debug colors are HSLA.
        self.0.push(DebugLine {
            start: Vec3::new(a.x, a.y, a.z),
            end: Vec3::new(b.x, b.y, b.z),
            color: Color::hsla(color[0], color[1], color[2], color[3]),
        });
    }
}

/// Links a Bevy entity to a Rapier rigid body
#[derive(Component)]
pub struct RigidBodyLink(pub RigidBodyHandle);

fn step_physics(mut physics: ResMut<PhysicsState>, mut contacts: MessageWriter<ContactStarted>) {
    for contact in physics.step() {
        contacts.write(contact);
    }
}

fn sync_transforms(physics: Res<PhysicsState>, mut query: Query<(&RigidBodyLink, &mut Transform)>) {
    for (link, mut transform) in query.iter_mut() {
        if let Some(body) = physics.rigid_body_set.get(link.0) {
            let pos = body.translation();
            let rot = body.rotation();
            transform.translation = Vec3::new(pos.x, pos.y, pos.z);
            transform.rotation = Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w);
        }
    }
}

fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(translation: Vec3, rotation: Quat) -> Isometry3<f32> {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry3::from_parts(
        Translation3::new(translation.x, translation.y, translation.z),
        rotation,
    )
}
