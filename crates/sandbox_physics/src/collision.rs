//! Collision categories.
//!
//! Every collider in the sandbox carries exactly one category, stored as its
//! Rapier membership group. The filter side of the group decides which other
//! categories it generates contacts with.

use rapier3d::prelude::{Group, InteractionGroups};

/// Tag identifying what a physics body represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionCategory {
    /// The invisible catch plane placed far below all detected surfaces.
    Bottom,
    /// A cube dropped by the user.
    Cube,
    /// A detected real-world surface.
    Surface,
}

impl CollisionCategory {
    pub const ALL: [CollisionCategory; 3] = [
        CollisionCategory::Bottom,
        CollisionCategory::Cube,
        CollisionCategory::Surface,
    ];

    /// Bit used for this category in collision group masks.
    pub const fn bits(self) -> u32 {
        match self {
            CollisionCategory::Bottom => 1 << 0,
            CollisionCategory::Cube => 1 << 1,
            CollisionCategory::Surface => 1 << 2,
        }
    }

    /// Recover a category from a membership mask.
    ///
    /// Returns `None` for masks that are not exactly one known category.
    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.bits() == bits)
    }

    /// Mask of categories this one generates contacts with.
    pub const fn collides_with(self) -> u32 {
        match self {
            // The catch plane only ever needs to see cubes.
            CollisionCategory::Bottom => CollisionCategory::Cube.bits(),
            CollisionCategory::Cube => {
                CollisionCategory::Bottom.bits()
                    | CollisionCategory::Cube.bits()
                    | CollisionCategory::Surface.bits()
            }
            CollisionCategory::Surface => CollisionCategory::Cube.bits(),
        }
    }

    /// Rapier interaction groups for a collider of this category.
    pub fn interaction_groups(self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.bits()),
            Group::from_bits_truncate(self.collides_with()),
        )
    }
}

/// Returns the payload of the cube side when the pair is a cube touching the
/// catch plane, in either order.
pub fn fallen_out<T>(a: (CollisionCategory, T), b: (CollisionCategory, T)) -> Option<T> {
    match (a.0, b.0) {
        (CollisionCategory::Bottom, CollisionCategory::Cube) => Some(b.1),
        (CollisionCategory::Cube, CollisionCategory::Bottom) => Some(a.1),
        _ => None,
    }
}
