//! Rendered scene: entities mirroring the coordinator's surfaces and cubes.
//!
//! The coordinator is the source of truth; these systems spawn, update and
//! despawn entities to match it every frame.

use std::collections::{HashMap, HashSet};

use bevy::math::Affine2;
use bevy::prelude::*;
use sandbox_physics::{PhysicsState, RigidBodyLink};

use crate::coordinator::{SceneCoordinator, SceneNode};
use crate::cube::ObjectId;
use crate::material::MaterialKind;
use crate::surface::Surface;

/// Shared meshes, textures and cube materials.
#[derive(Resource)]
pub struct MaterialLibrary {
    textures: HashMap<MaterialKind, Handle<Image>>,
    cube_materials: HashMap<MaterialKind, Handle<StandardMaterial>>,
    plane_mesh: Handle<Mesh>,
    cube_mesh: Handle<Mesh>,
}

impl MaterialLibrary {
    pub fn new(
        images: &mut Assets<Image>,
        materials: &mut Assets<StandardMaterial>,
        meshes: &mut Assets<Mesh>,
        cube_size: f32,
    ) -> Self {
        let mut textures = HashMap::new();
        let mut cube_materials = HashMap::new();
        for kind in MaterialKind::ALL {
            let texture = images.add(kind.texture());
            cube_materials.insert(
                kind,
                materials.add(StandardMaterial {
                    base_color_texture: Some(texture.clone()),
                    perceptual_roughness: kind.roughness(),
                    metallic: kind.metallic(),
                    ..default()
                }),
            );
            textures.insert(kind, texture);
        }

        Self {
            textures,
            cube_materials,
            // Unit plane, scaled per surface by its transform.
            plane_mesh: meshes.add(Plane3d::default().mesh().size(1.0, 1.0)),
            cube_mesh: meshes.add(Cuboid::from_length(cube_size)),
        }
    }

    pub fn cube_material(&self, kind: MaterialKind) -> Handle<StandardMaterial> {
        self.cube_materials.get(&kind).cloned().unwrap_or_default()
    }

    /// Point a surface material at a texture, tiled `texture_scale` times.
    pub fn configure_surface(
        &self,
        material: &mut StandardMaterial,
        kind: MaterialKind,
        texture_scale: Vec2,
    ) {
        material.base_color_texture = self.textures.get(&kind).cloned();
        material.perceptual_roughness = kind.roughness();
        material.metallic = kind.metallic();
        material.uv_transform = Affine2::from_scale(texture_scale);
    }
}

/// Per-surface render state, compared against the coordinator each frame.
#[derive(Component)]
pub struct SurfaceVisual {
    material: Handle<StandardMaterial>,
    kind: MaterialKind,
    texture_scale: Vec2,
}

#[derive(Component)]
pub struct CubeVisual {
    kind: MaterialKind,
}

/// Directional light whose strength follows the light estimate.
#[derive(Component)]
pub struct SceneLight {
    pub base_illuminance: f32,
}

pub fn setup_material_library(
    mut commands: Commands,
    coordinator: Res<SceneCoordinator>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    commands.insert_resource(MaterialLibrary::new(
        &mut images,
        &mut materials,
        &mut meshes,
        coordinator.tuning().cube_size,
    ));
}

pub fn sync_surface_entities(
    mut commands: Commands,
    coordinator: Res<SceneCoordinator>,
    library: Res<MaterialLibrary>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut query: Query<(
        Entity,
        &SceneNode,
        &mut SurfaceVisual,
        &mut Transform,
        &mut Visibility,
    )>,
) {
    let mut present = HashSet::new();
    for (entity, node, mut visual, mut transform, mut visibility) in query.iter_mut() {
        let SceneNode::Surface(id) = *node else {
            continue;
        };
        let Some(surface) = coordinator.surface(id) else {
            commands.entity(entity).despawn();
            continue;
        };
        present.insert(id);

        *transform = surface_transform(surface);
        *visibility = surface_visibility(surface);
        if visual.kind != surface.material() || visual.texture_scale != surface.texture_scale() {
            if let Some(material) = materials.get_mut(&visual.material) {
                library.configure_surface(material, surface.material(), surface.texture_scale());
            }
            visual.kind = surface.material();
            visual.texture_scale = surface.texture_scale();
        }
    }

    for (id, surface) in coordinator.surfaces() {
        if present.contains(id) {
            continue;
        }
        let mut material = StandardMaterial::default();
        library.configure_surface(&mut material, surface.material(), surface.texture_scale());
        let material = materials.add(material);
        commands.spawn((
            Name::new(format!("Surface {}", id)),
            SceneNode::Surface(*id),
            SurfaceVisual {
                material: material.clone(),
                kind: surface.material(),
                texture_scale: surface.texture_scale(),
            },
            Mesh3d(library.plane_mesh.clone()),
            MeshMaterial3d(material),
            surface_transform(surface),
            surface_visibility(surface),
        ));
    }
}

pub fn sync_cube_entities(
    mut commands: Commands,
    coordinator: Res<SceneCoordinator>,
    library: Res<MaterialLibrary>,
    physics: Res<PhysicsState>,
    mut query: Query<(
        Entity,
        &SceneNode,
        &mut CubeVisual,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
) {
    let mut present: HashSet<ObjectId> = HashSet::new();
    for (entity, node, mut visual, mut material) in query.iter_mut() {
        let SceneNode::DynamicObject(id) = *node else {
            continue;
        };
        let Some(object) = coordinator.object(id) else {
            commands.entity(entity).despawn();
            continue;
        };
        present.insert(id);

        if visual.kind != object.material() {
            visual.kind = object.material();
            material.0 = library.cube_material(object.material());
        }
    }

    for object in coordinator.objects() {
        if present.contains(&object.id()) {
            continue;
        }
        let Some(translation) = physics.translation(object.body()) else {
            continue;
        };
        let rotation = physics.rotation(object.body()).unwrap_or_default();
        commands.spawn((
            Name::new(format!("Cube {}", object.id().0)),
            SceneNode::DynamicObject(object.id()),
            CubeVisual {
                kind: object.material(),
            },
            RigidBodyLink(object.body()),
            Mesh3d(library.cube_mesh.clone()),
            MeshMaterial3d(library.cube_material(object.material())),
            Transform::from_translation(translation).with_rotation(rotation),
        ));
    }
}

pub fn apply_scene_lighting(
    coordinator: Res<SceneCoordinator>,
    mut lights: Query<(&SceneLight, &mut DirectionalLight)>,
) {
    for (light, mut directional) in lights.iter_mut() {
        directional.illuminance = light.base_illuminance * coordinator.light_intensity();
    }
}

fn surface_transform(surface: &Surface) -> Transform {
    let geometry = surface.geometry();
    surface
        .world_transform()
        .with_scale(Vec3::new(geometry.width, 1.0, geometry.length))
}

fn surface_visibility(surface: &Surface) -> Visibility {
    if surface.top_face().is_visible() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Find the surface or cube under a ray, nearest first.
///
/// Hidden surfaces cannot be picked.
pub fn pick_node(
    ray: Ray3d,
    coordinator: &SceneCoordinator,
    physics: &PhysicsState,
) -> Option<SceneNode> {
    let direction = *ray.direction;
    let mut nearest: Option<(f32, SceneNode)> = None;
    let mut consider = |distance: f32, node: SceneNode| {
        if nearest.is_none_or(|(best, _)| distance < best) {
            nearest = Some((distance, node));
        }
    };

    for object in coordinator.objects() {
        let (Some(translation), Some(rotation)) = (
            physics.translation(object.body()),
            physics.rotation(object.body()),
        ) else {
            continue;
        };
        let inverse = rotation.inverse();
        let distance = ray_box_distance(
            inverse * (ray.origin - translation),
            inverse * direction,
            Vec3::splat(object.size() / 2.0),
        );
        if let Some(distance) = distance {
            consider(distance, SceneNode::DynamicObject(object.id()));
        }
    }

    for (id, surface) in coordinator.surfaces() {
        if surface.is_hidden() {
            continue;
        }
        let pose = surface.world_transform();
        let half = surface.geometry().half_extents();
        let inverse = pose.rotation.inverse();
        let distance = ray_box_distance(
            inverse * (ray.origin - pose.translation),
            inverse * direction,
            Vec3::new(half.x, 0.0, half.z),
        );
        if let Some(distance) = distance {
            consider(distance, SceneNode::Surface(*id));
        }
    }

    nearest.map(|(_, node)| node)
}

/// Slab test of a ray against an axis-aligned box centered at the origin.
fn ray_box_distance(origin: Vec3, direction: Vec3, half_extents: Vec3) -> Option<f32> {
    let mut near = f32::NEG_INFINITY;
    let mut far = f32::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half_extents[axis];
        if d.abs() <= f32::EPSILON {
            if o.abs() > h {
                return None;
            }
            continue;
        }
        let t1 = (-h - o) / d;
        let t2 = (h - o) / d;
        near = near.max(t1.min(t2));
        far = far.min(t1.max(t2));
    }

    let entry = near.max(0.0);
    (far >= entry).then_some(entry)
}
