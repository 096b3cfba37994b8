//! Droppable cubes and the catch plane that removes them.

use bevy::prelude::*;
use sandbox_physics::{BoxBody, CollisionCategory, PhysicsState, RigidBodyHandle};

use crate::material::MaterialKind;

/// Identifier of a dynamic object, unique for the lifetime of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// A gravity-affected cube inserted by the user.
#[derive(Debug, Clone, Copy)]
pub struct DynamicObject {
    id: ObjectId,
    body: RigidBodyHandle,
    material: MaterialKind,
    size: f32,
}

impl DynamicObject {
    /// Spawn a cube centered at `position`.
    ///
    /// Its collider is tagged as a cube; contact reporting is carried by the
    /// catch plane, which only interacts with cubes.
    pub fn create(
        id: ObjectId,
        position: Vec3,
        material: MaterialKind,
        size: f32,
        mass: f32,
        physics: &mut PhysicsState,
    ) -> Self {
        let body = physics.insert_box(
            BoxBody::dynamic(position, Vec3::splat(size / 2.0), CollisionCategory::Cube)
                .with_mass(mass),
        );
        Self {
            id,
            body,
            material,
            size,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn material(&self) -> MaterialKind {
        self.material
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Current world position, or `None` once the body is gone.
    pub fn world_position(&self, physics: &PhysicsState) -> Option<Vec3> {
        physics.translation(self.body)
    }

    pub fn cycle_material(&mut self) -> MaterialKind {
        self.material = self.material.next();
        self.material
    }
}

/// Large invisible body far below every real surface.
///
/// Anything that touches it has fallen out of the playable world.
#[derive(Debug, Clone, Copy)]
pub struct CatchPlane {
    body: RigidBodyHandle,
}

impl CatchPlane {
    pub const SIZE: Vec3 = Vec3::new(1000.0, 0.5, 1000.0);

    pub fn create(height: f32, physics: &mut PhysicsState) -> Self {
        let body = physics.insert_box(
            BoxBody::kinematic(
                Vec3::new(0.0, height, 0.0),
                Self::SIZE / 2.0,
                CollisionCategory::Bottom,
            )
            .reporting_contacts(),
        );
        Self { body }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spawns_cube_body_at_position() {
        let mut physics = PhysicsState::new();
        let cube = DynamicObject::create(
            ObjectId(1),
            Vec3::new(0.0, 0.5, -1.0),
            MaterialKind::RustedIron,
            0.1,
            1.0,
            &mut physics,
        );

        assert_eq!(cube.world_position(&physics), Some(Vec3::new(0.0, 0.5, -1.0)));
        assert_eq!(physics.body_category(cube.body()), Some(CollisionCategory::Cube));
        assert_eq!(physics.box_half_extents(cube.body()), Some(Vec3::splat(0.05)));
        assert_eq!(physics.dynamic_body_count(), 1);
    }

    #[test]
    fn test_cube_falls_under_gravity() {
        let mut physics = PhysicsState::new();
        let cube = DynamicObject::create(
            ObjectId(1),
            Vec3::ZERO,
            MaterialKind::TronGrid,
            0.1,
            1.0,
            &mut physics,
        );
        for _ in 0..10 {
            physics.step();
        }
        assert!(cube.world_position(&physics).unwrap().y < 0.0);
    }

    #[test]
    fn test_catch_plane_is_a_bottom_body() {
        let mut physics = PhysicsState::new();
        let plane = CatchPlane::create(-10.0, &mut physics);
        assert_eq!(physics.body_category(plane.body()), Some(CollisionCategory::Bottom));
        assert_eq!(physics.translation(plane.body()), Some(Vec3::new(0.0, -10.0, 0.0)));
        assert_eq!(physics.dynamic_body_count(), 0);
    }
}
