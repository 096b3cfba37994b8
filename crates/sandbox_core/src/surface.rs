//! Renderable and physical representation of a tracked surface.
//!
//! A surface is a thin box whose footprint matches its anchor's extent. Only
//! the top face is textured; the side and bottom faces stay transparent so the
//! box reads as a flat plane while still giving falling cubes some thickness
//! to land on.

use bevy::prelude::*;
use sandbox_physics::{BoxBody, CollisionCategory, PhysicsState, RigidBodyHandle};

use crate::anchor::{AnchorId, SurfaceAnchor};
use crate::material::{FaceMaterial, MaterialKind};

/// Thickness of every surface box.
pub const SURFACE_HEIGHT: f32 = 0.01;

/// Index of the top face in [`Surface::faces`].
///
/// Faces are ordered front, right, back, left, top, bottom.
pub const TOP_FACE: usize = 4;

/// Dimensions of a box primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub width: f32,
    pub height: f32,
    pub length: f32,
}

impl BoxGeometry {
    /// Surface box covering an anchor extent.
    pub fn for_extent(extent: Vec2) -> Self {
        Self {
            width: extent.x,
            height: SURFACE_HEIGHT,
            length: extent.y,
        }
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.length)
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }
}

#[derive(Debug)]
pub struct Surface {
    anchor_id: AnchorId,
    anchor_transform: Transform,
    geometry: BoxGeometry,
    faces: [FaceMaterial; 6],
    material: MaterialKind,
    texture_scale: Vec2,
    local_position: Vec3,
    body: RigidBodyHandle,
    hidden: bool,
}

impl Surface {
    /// Build a surface for a newly detected anchor and give it a kinematic body.
    pub fn create(
        anchor: &SurfaceAnchor,
        material: MaterialKind,
        hidden: bool,
        physics: &mut PhysicsState,
    ) -> Self {
        let geometry = BoxGeometry::for_extent(anchor.extent);
        let local_position = Vec3::new(anchor.center.x, 0.0, anchor.center.z);
        let (translation, rotation) = collider_pose(anchor.transform, local_position);
        let body = physics.insert_box(
            BoxBody::kinematic(translation, geometry.half_extents(), CollisionCategory::Surface)
                .with_rotation(rotation),
        );

        let mut surface = Self {
            anchor_id: anchor.id,
            anchor_transform: anchor.transform,
            geometry,
            faces: [FaceMaterial::Transparent; 6],
            material,
            texture_scale: Vec2::ONE,
            local_position,
            body,
            hidden,
        };
        if !hidden {
            surface.faces[TOP_FACE] = FaceMaterial::Textured(material);
        }
        surface.set_texture_scale();
        surface
    }

    /// Follow an anchor update: resize, move and rebuild the physics shape.
    pub fn update(&mut self, anchor: &SurfaceAnchor, physics: &mut PhysicsState) {
        self.geometry = BoxGeometry::for_extent(anchor.extent);
        self.anchor_transform = anchor.transform;
        // The anchor transform already carries the translation; only the
        // center offset within the anchor frame moves the surface locally.
        self.local_position = Vec3::new(anchor.center.x, 0.0, anchor.center.z);

        let (translation, rotation) = collider_pose(self.anchor_transform, self.local_position);
        physics.reshape_box(self.body, self.geometry.half_extents(), translation, rotation);
        self.set_texture_scale();
    }

    /// Make every face transparent without dropping the tracked surface.
    pub fn hide(&mut self) {
        self.faces = [FaceMaterial::Transparent; 6];
        self.hidden = true;
    }

    pub fn set_material(&mut self, material: MaterialKind) {
        self.material = material;
        if !self.hidden {
            self.faces[TOP_FACE] = FaceMaterial::Textured(material);
        }
    }

    /// Switch to the next material and return it.
    pub fn cycle_material(&mut self) -> MaterialKind {
        let next = self.material.next();
        self.set_material(next);
        next
    }

    // One texture repeat per world unit; below one unit the texture is
    // cropped rather than squashed.
    fn set_texture_scale(&mut self) {
        self.texture_scale = Vec2::new(self.geometry.width, self.geometry.length);
    }

    pub fn anchor_id(&self) -> AnchorId {
        self.anchor_id
    }

    pub fn geometry(&self) -> BoxGeometry {
        self.geometry
    }

    pub fn faces(&self) -> &[FaceMaterial; 6] {
        &self.faces
    }

    pub fn top_face(&self) -> FaceMaterial {
        self.faces[TOP_FACE]
    }

    pub fn material(&self) -> MaterialKind {
        self.material
    }

    pub fn texture_scale(&self) -> Vec2 {
        self.texture_scale
    }

    /// Position relative to the anchor frame.
    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    /// World pose of the surface's top face center.
    pub fn world_transform(&self) -> Transform {
        self.anchor_transform * Transform::from_translation(self.local_position)
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Release the physics body. Called by the coordinator when the anchor goes away.
    pub(crate) fn destroy(self, physics: &mut PhysicsState) {
        physics.remove_body(self.body);
    }
}

/// World pose of the collider: the box hangs half its height below the
/// surface so its top face is level with the detected plane.
fn collider_pose(anchor_transform: Transform, local_position: Vec3) -> (Vec3, Quat) {
    let world = anchor_transform * Transform::from_translation(local_position);
    (
        world.transform_point(Vec3::new(0.0, -SURFACE_HEIGHT / 2.0, 0.0)),
        world.rotation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(extent: Vec2) -> SurfaceAnchor {
        SurfaceAnchor::new(
            AnchorId::new_v4(),
            Transform::from_xyz(1.0, -0.5, -2.0),
            Vec3::ZERO,
            extent,
        )
    }

    fn assert_vec3_near(actual: Vec3, expected: Vec3) {
        assert!(
            (actual - expected).length() < 1e-5,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_create_matches_anchor_extent() {
        let mut physics = PhysicsState::new();
        let anchor = anchor(Vec2::new(1.2, 0.8));
        let surface = Surface::create(&anchor, MaterialKind::TronGrid, false, &mut physics);

        assert_eq!(surface.anchor_id(), anchor.id);
        assert_eq!(surface.geometry().width, 1.2);
        assert_eq!(surface.geometry().length, 0.8);
        assert_eq!(surface.geometry().height, SURFACE_HEIGHT);
        assert_eq!(surface.texture_scale(), Vec2::new(1.2, 0.8));
        assert_eq!(
            physics.body_category(surface.body()),
            Some(CollisionCategory::Surface)
        );
        assert_vec3_near(
            physics.box_half_extents(surface.body()).unwrap(),
            Vec3::new(0.6, SURFACE_HEIGHT / 2.0, 0.4),
        );
        assert_vec3_near(
            physics.translation(surface.body()).unwrap(),
            Vec3::new(1.0, -0.5 - SURFACE_HEIGHT / 2.0, -2.0),
        );
    }

    #[test]
    fn test_only_top_face_is_textured() {
        let mut physics = PhysicsState::new();
        let surface =
            Surface::create(&anchor(Vec2::ONE), MaterialKind::Granite, false, &mut physics);

        for (index, face) in surface.faces().iter().enumerate() {
            if index == TOP_FACE {
                assert_eq!(*face, FaceMaterial::Textured(MaterialKind::Granite));
            } else {
                assert_eq!(*face, FaceMaterial::Transparent);
            }
        }
    }

    #[test]
    fn test_hidden_surface_has_no_visible_face() {
        let mut physics = PhysicsState::new();
        let surface =
            Surface::create(&anchor(Vec2::ONE), MaterialKind::TronGrid, true, &mut physics);
        assert!(surface.faces().iter().all(|face| !face.is_visible()));
        assert!(surface.is_hidden());
    }

    #[test]
    fn test_update_resizes_moves_and_rebuilds_body() {
        let mut physics = PhysicsState::new();
        let mut anchor = anchor(Vec2::new(0.5, 0.5));
        let mut surface = Surface::create(&anchor, MaterialKind::TronGrid, false, &mut physics);

        anchor.extent = Vec2::new(2.0, 1.5);
        anchor.center = Vec3::new(0.3, 0.0, -0.2);
        surface.update(&anchor, &mut physics);

        assert_eq!(surface.geometry(), BoxGeometry::for_extent(Vec2::new(2.0, 1.5)));
        assert_eq!(surface.texture_scale(), Vec2::new(2.0, 1.5));
        assert_eq!(surface.local_position(), Vec3::new(0.3, 0.0, -0.2));
        assert_vec3_near(
            surface.world_transform().translation,
            Vec3::new(1.3, -0.5, -2.2),
        );
        assert_vec3_near(
            physics.box_half_extents(surface.body()).unwrap(),
            Vec3::new(1.0, SURFACE_HEIGHT / 2.0, 0.75),
        );
        assert_vec3_near(
            physics.translation(surface.body()).unwrap(),
            Vec3::new(1.3, -0.5 - SURFACE_HEIGHT / 2.0, -2.2),
        );
    }

    #[test]
    fn test_identical_update_is_idempotent() {
        let mut physics = PhysicsState::new();
        let anchor = anchor(Vec2::new(0.7, 1.9));
        let mut surface = Surface::create(&anchor, MaterialKind::TronGrid, false, &mut physics);
        let geometry = surface.geometry();
        let scale = surface.texture_scale();

        surface.update(&anchor, &mut physics);
        surface.update(&anchor, &mut physics);

        assert_eq!(surface.geometry(), geometry);
        assert_eq!(surface.texture_scale(), scale);
        assert_eq!(physics.rigid_body_set.len(), 1);
        assert_eq!(physics.collider_set.len(), 1);
    }

    #[test]
    fn test_hide_clears_every_face() {
        let mut physics = PhysicsState::new();
        let mut surface =
            Surface::create(&anchor(Vec2::ONE), MaterialKind::TronGrid, false, &mut physics);
        surface.hide();
        assert!(surface.faces().iter().all(|face| !face.is_visible()));
    }

    #[test]
    fn test_material_change_respects_hidden_state() {
        let mut physics = PhysicsState::new();
        let mut surface =
            Surface::create(&anchor(Vec2::ONE), MaterialKind::TronGrid, false, &mut physics);

        assert_eq!(surface.cycle_material(), MaterialKind::Granite);
        assert_eq!(surface.top_face(), FaceMaterial::Textured(MaterialKind::Granite));

        surface.hide();
        surface.set_material(MaterialKind::OakFloor);
        assert_eq!(surface.material(), MaterialKind::OakFloor);
        assert_eq!(surface.top_face(), FaceMaterial::Transparent);
    }

    #[test]
    fn test_destroy_releases_the_body() {
        let mut physics = PhysicsState::new();
        let surface =
            Surface::create(&anchor(Vec2::ONE), MaterialKind::TronGrid, false, &mut physics);
        let body = surface.body();
        surface.destroy(&mut physics);
        assert!(!physics.contains(body));
    }
}
