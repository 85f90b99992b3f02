//! Scene graph: textured planes in draw order.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Affine2, Vec2, Vec3};

use super::Texture;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

/// An axis-aligned rectangle centred on the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether a local-space point lies on the plane.
    pub fn contains(&self, local: Vec2) -> bool {
        local.x.abs() <= self.width / 2.0 && local.y.abs() <= self.height / 2.0
    }

    /// Texture coordinates for a local-space point, `(0, 0)` at the top-left.
    pub fn uv(&self, local: Vec2) -> Vec2 {
        Vec2::new(local.x / self.width + 0.5, 0.5 - local.y / self.height)
    }

    fn corners(&self) -> [Vec2; 4] {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        [
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ]
    }
}

/// Unlit material: `color` (times `map`, when present) at `opacity`.
#[derive(Debug, Clone)]
pub struct MeshBasicMaterial {
    pub color: [u8; 3],
    pub map: Option<Texture>,
    pub opacity: f32,
    /// When false, `opacity` is ignored and the mesh is drawn fully opaque.
    pub transparent: bool,
}

impl Default for MeshBasicMaterial {
    fn default() -> Self {
        Self {
            color: [255, 255, 255],
            map: None,
            opacity: 1.0,
            transparent: false,
        }
    }
}

impl MeshBasicMaterial {
    pub fn with_map(map: Texture) -> Self {
        Self {
            map: Some(map),
            transparent: true,
            ..Self::default()
        }
    }

    /// Opacity actually applied when drawing.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// A plane placed in the scene.
#[derive(Debug, Clone)]
pub struct Mesh {
    id: MeshId,
    pub geometry: PlaneGeometry,
    pub material: MeshBasicMaterial,
    pub position: Vec3,
    /// Rotation about +Z in radians, counter-clockwise.
    pub rotation: f32,
    pub scale: Vec2,
    pub visible: bool,
}

impl Mesh {
    pub fn new(geometry: PlaneGeometry, material: MeshBasicMaterial) -> Self {
        Self {
            id: MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed)),
            geometry,
            material,
            position: Vec3::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            visible: true,
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Local-to-world transform in the XY plane.
    pub fn world_transform(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position.truncate())
    }

    /// World-space corners of the plane.
    pub fn world_corners(&self) -> [Vec2; 4] {
        let transform = self.world_transform();
        self.geometry.corners().map(|c| transform.transform_point2(c))
    }
}

/// Ordered collection of meshes.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshId {
        let id = mesh.id();
        self.meshes.push(mesh);
        id
    }

    /// Detach a mesh, handing it back to the caller.
    pub fn remove(&mut self, id: MeshId) -> Option<Mesh> {
        let index = self.meshes.iter().position(|m| m.id() == id)?;
        Some(self.meshes.remove(index))
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.id() == id)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.id() == id)
    }

    /// Meshes in insertion order.
    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

pub fn create_scene() -> Scene {
    Scene::new()
}

/// Remove `mesh` from `scene` and release its geometry, material and texture.
///
/// Does nothing unless both are given. Returns whether a mesh was released.
pub fn dispose_objects(scene: Option<&mut Scene>, mesh: Option<MeshId>) -> bool {
    let (Some(scene), Some(id)) = (scene, mesh) else {
        return false;
    };

    match scene.remove(id) {
        Some(mesh) => {
            log::debug!(
                "disposed mesh {:?} (texture {:?})",
                mesh.id(),
                mesh.material.map.as_ref().map(Texture::id)
            );
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedImage;

    fn plane() -> Mesh {
        Mesh::new(PlaneGeometry::new(2.0, 1.0), MeshBasicMaterial::default())
    }

    #[test]
    fn test_add_and_remove() {
        let mut scene = create_scene();
        let a = scene.add(plane());
        let b = scene.add(plane());
        assert_eq!(scene.len(), 2);

        let removed = scene.remove(a).unwrap();
        assert_eq!(removed.id(), a);
        assert!(scene.mesh(a).is_none());
        assert!(scene.mesh(b).is_some());
        assert!(scene.remove(a).is_none());
    }

    #[test]
    fn test_mesh_mut() {
        let mut scene = create_scene();
        let id = scene.add(plane());
        scene.mesh_mut(id).unwrap().position.x = 3.0;
        assert_eq!(scene.mesh(id).unwrap().position.x, 3.0);
    }

    #[test]
    fn test_world_corners_with_rotation() {
        let mut mesh = plane();
        mesh.rotation = std::f32::consts::FRAC_PI_2;
        mesh.position = Vec3::new(1.0, 0.0, 0.0);

        let corners = mesh.world_corners();
        // (-1, -0.5) rotated 90 degrees CCW is (0.5, -1), then shifted by +1 in x.
        assert!((corners[0] - Vec2::new(1.5, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_plane_uv() {
        let geometry = PlaneGeometry::new(2.0, 4.0);
        assert_eq!(geometry.uv(Vec2::new(-1.0, 2.0)), Vec2::new(0.0, 0.0));
        assert_eq!(geometry.uv(Vec2::new(1.0, -2.0)), Vec2::new(1.0, 1.0));
        assert!(geometry.contains(Vec2::new(0.9, -1.9)));
        assert!(!geometry.contains(Vec2::new(1.1, 0.0)));
    }

    #[test]
    fn test_effective_opacity() {
        let mut material = MeshBasicMaterial::default();
        material.opacity = 0.25;
        assert_eq!(material.effective_opacity(), 1.0);
        material.transparent = true;
        assert_eq!(material.effective_opacity(), 0.25);
    }

    #[test]
    fn test_dispose_objects() {
        let mut scene = create_scene();
        let texture = Texture::new(DecodedImage::transparent(1, 1));
        let id = scene.add(Mesh::new(
            PlaneGeometry::new(1.0, 1.0),
            MeshBasicMaterial::with_map(texture),
        ));

        assert!(!dispose_objects(None, Some(id)));
        assert!(!dispose_objects(Some(&mut scene), None));
        assert_eq!(scene.len(), 1);

        assert!(dispose_objects(Some(&mut scene), Some(id)));
        assert!(scene.is_empty());
        assert!(!dispose_objects(Some(&mut scene), Some(id)));
    }
}
