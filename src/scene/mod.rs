//! Scene data model.
//!
//! [`SceneGraph`] is the artist-authored object graph handed to the
//! compiler by an external parser: meshes made of triangle primitives,
//! instances placing those meshes in the world, texture assets and a
//! camera spec. The compiler consumes it read-only.
//!
//! [`compiled`] holds the flat, GPU-consumable output side.

pub mod compiled;

pub use compiled::{BvhNode, Camera, CompiledScene, MeshInstanceData, TextureMetadata};

use crate::math::{Aabb, Mat4, Vec2, Vec3};

/// Pixel format of a texture payload.
///
/// Stored as a raw u32 in [`TextureMetadata`] so device kernels can
/// branch on it without a lookup table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TextureFormat {
    Luminance8 = 0,
    Luminance32F = 1,
    Rgba8 = 2,
    Rgba32F = 3,
}

/// A texture asset: format tag, dimensions and the raw byte payload.
#[derive(Clone, Debug)]
pub struct Texture {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A single triangle with per-vertex attributes and a material reference.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub vertices: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uvs: [Vec2; 3],
    pub material_index: u32,
}

impl Primitive {
    /// Object-space bounding box of the triangle.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Centroid used for BVH partitioning.
    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }
}

/// An ordered collection of primitives sharing one object space.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self { primitives }
    }

    /// Object-space bounding box over all primitives.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for prim in &self.primitives {
            bounds.expand_by_box(&prim.bounds());
        }
        bounds
    }
}

/// Placement of a mesh in the world: which mesh, and where.
#[derive(Clone, Debug)]
pub struct MeshInstance {
    /// Index into [`SceneGraph::meshes`].
    pub mesh_index: u32,
    /// Object-to-world transform as authored.
    pub transform: Mat4,
}

impl MeshInstance {
    /// World-space bounding box: the mesh bounds corner-transformed.
    pub fn world_bounds(&self, mesh: &Mesh) -> Aabb {
        mesh.bounds().transformed(&self.transform)
    }
}

/// Camera parameters as authored.
#[derive(Clone, Debug)]
pub struct CameraSpec {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub eye: Vec3,
    pub look: Vec3,
    pub up: Vec3,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            fov: 45.0,
            eye: Vec3::ZERO,
            look: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

/// The parsed scene handed to [`crate::compiler::compile`].
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub textures: Vec<Texture>,
    pub meshes: Vec<Mesh>,
    pub mesh_instances: Vec<MeshInstance>,
    pub camera: CameraSpec,
}

impl SceneGraph {
    /// Total primitive count across all meshes.
    pub fn total_primitives(&self) -> usize {
        self.meshes.iter().map(|m| m.primitives.len()).sum()
    }
}
