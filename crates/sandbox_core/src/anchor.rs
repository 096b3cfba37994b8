//! Anchors reported by the tracking session.

use bevy::math::Ray3d;
use bevy::prelude::*;
use uuid::Uuid;

/// Stable identifier of a tracked anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub Uuid);

impl AnchorId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked horizontal surface.
///
/// `transform` is the anchor's world pose. `center` and `extent` are expressed
/// in the anchor's local frame: the surface spans `extent.x` along local X and
/// `extent.y` along local Z around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceAnchor {
    pub id: AnchorId,
    pub transform: Transform,
    pub center: Vec3,
    pub extent: Vec2,
}

impl SurfaceAnchor {
    pub fn new(id: AnchorId, transform: Transform, center: Vec3, extent: Vec2) -> Self {
        Self {
            id,
            transform,
            center,
            extent,
        }
    }

    /// World-space position of the surface center.
    pub fn world_center(&self) -> Vec3 {
        self.transform.transform_point(self.center)
    }

    /// World-space up vector of the surface.
    pub fn normal(&self) -> Vec3 {
        self.transform.rotation * Vec3::Y
    }

    /// Intersect a ray with the surface, bounded by its extent.
    pub fn intersect(&self, ray: Ray3d) -> Option<HitResult> {
        let direction = *ray.direction;
        let normal = self.normal();
        let denom = normal.dot(direction);
        if denom.abs() <= f32::EPSILON {
            return None;
        }

        let distance = normal.dot(self.world_center() - ray.origin) / denom;
        if distance < 0.0 {
            return None;
        }

        let point = ray.origin + direction * distance;
        let local = self.transform.rotation.inverse() * (point - self.transform.translation);
        let offset = local - self.center;
        if offset.x.abs() > self.extent.x * 0.5 || offset.z.abs() > self.extent.y * 0.5 {
            return None;
        }

        Some(HitResult {
            anchor: self.id,
            distance,
            world_transform: Transform::from_translation(point)
                .with_rotation(self.transform.rotation),
        })
    }
}

/// Any anchor the tracking session can report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// A detected horizontal surface.
    Surface(SurfaceAnchor),
    /// A bare point anchor with no surface attached.
    Point { id: AnchorId, transform: Transform },
}

impl Anchor {
    pub fn id(&self) -> AnchorId {
        match self {
            Anchor::Surface(surface) => surface.id,
            Anchor::Point { id, .. } => *id,
        }
    }

    pub fn as_surface(&self) -> Option<&SurfaceAnchor> {
        match self {
            Anchor::Surface(surface) => Some(surface),
            Anchor::Point { .. } => None,
        }
    }
}

/// Result of a hit test against existing surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Surface that was hit.
    pub anchor: AnchorId,
    /// Distance along the ray.
    pub distance: f32,
    /// World pose of the hit point, oriented like the surface.
    pub world_transform: Transform,
}

impl HitResult {
    pub fn position(&self) -> Vec3 {
        self.world_transform.translation
    }
}

/// Hit test a ray against surfaces, nearest hit first.
pub fn hit_test_surfaces<'a>(
    ray: Ray3d,
    anchors: impl IntoIterator<Item = &'a SurfaceAnchor>,
) -> Vec<HitResult> {
    let mut hits: Vec<HitResult> = anchors
        .into_iter()
        .filter_map(|anchor| anchor.intersect(ray))
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}
