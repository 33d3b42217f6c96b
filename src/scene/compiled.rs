//! Flat, GPU-consumable scene representation.
//!
//! Everything in this module is layout-bound: device kernels index these
//! buffers directly with no further validation, so field order, element
//! width and alignment are a binding contract. Vertex and normal entries
//! are padded to four components for 16-byte alignment, texture payloads
//! start on 4-byte boundaries, and BVH child links are u32 offsets into
//! one shared node array.

use bytemuck::{Pod, Zeroable};

use crate::math::{Aabb, Mat4, Vec2, Vec3, Vec4};
use crate::scene::TextureFormat;

/// Marks a [`BvhNode`] as a leaf when set on its `left` word.
///
/// Internal child indices live in the remaining 31 bits, which caps the
/// node array at 2^31 entries.
const LEAF_FLAG: u32 = 1 << 31;

/// One node of the shared BVH array, 32 bytes.
///
/// Internal nodes store two child indices into the same array. Leaf
/// nodes flag `left` with the high bit and carry a payload instead: the
/// global primitive offset plus count for mesh-level leaves, or the
/// instance index (count 1) for top-level leaves. The traversal engine
/// knows which tree it is walking, so both payloads share one encoding.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BvhNode {
    pub min: Vec3,
    left: u32,
    pub max: Vec3,
    right: u32,
}

impl BvhNode {
    /// Create a node covering `bounds` with no children or payload yet.
    pub fn new(bounds: Aabb) -> Self {
        Self {
            min: bounds.min,
            left: 0,
            max: bounds.max,
            right: 0,
        }
    }

    /// Link the two children of an internal node.
    pub fn set_child_nodes(&mut self, left: u32, right: u32) {
        debug_assert!(left < LEAF_FLAG && right < LEAF_FLAG);
        self.left = left;
        self.right = right;
    }

    /// Mark as a mesh-level leaf spanning `count` primitives starting at
    /// the global primitive `offset`.
    pub fn set_primitives(&mut self, offset: u32, count: u32) {
        self.left = LEAF_FLAG | offset;
        self.right = count;
    }

    /// Mark as a top-level leaf referencing one mesh instance.
    pub fn set_instance(&mut self, index: u32) {
        self.left = LEAF_FLAG | index;
        self.right = 1;
    }

    pub fn is_leaf(&self) -> bool {
        self.left & LEAF_FLAG != 0
    }

    /// Child indices of an internal node. Meaningless for leaves.
    pub fn child_nodes(&self) -> (u32, u32) {
        (self.left, self.right)
    }

    /// Leaf payload: `(offset, count)` for mesh-level leaves, or
    /// `(instance index, 1)` for top-level leaves.
    pub fn leaf_payload(&self) -> (u32, u32) {
        (self.left & !LEAF_FLAG, self.right)
    }

    /// Rebase the child indices of an internal node by `offset`.
    ///
    /// Leaf payloads are global already and must not shift. Called
    /// exactly once per node when a locally-built array is merged into
    /// the shared node list.
    pub fn offset_child_nodes(&mut self, offset: u32) {
        if !self.is_leaf() {
            self.left += offset;
            self.right += offset;
        }
    }
}

/// Addressing record for one texture inside [`CompiledScene::texture_data`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct TextureMetadata {
    /// Raw [`TextureFormat`] discriminant.
    pub format: u32,
    pub width: u32,
    pub height: u32,
    /// Byte offset of the payload, always a multiple of 4.
    pub data_offset: u32,
}

impl TextureMetadata {
    pub fn new(format: TextureFormat, width: u32, height: u32, data_offset: u32) -> Self {
        Self {
            format: format as u32,
            width,
            height,
            data_offset,
        }
    }
}

/// Per-instance record consumed by the traversal engine, 80 bytes.
///
/// The stored matrix is the INVERSE of the authored transform: traversal
/// maps world-space rays into object space before walking the mesh
/// subtree rooted at `bvh_root`.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshInstanceData {
    pub transform: Mat4,
    pub mesh_index: u32,
    /// Root of this instance's mesh subtree inside the final merged
    /// node array.
    pub bvh_root: u32,
    _pad: [u32; 2],
}

impl MeshInstanceData {
    pub fn new(mesh_index: u32, bvh_root: u32, transform: Mat4) -> Self {
        Self {
            transform,
            mesh_index,
            bvh_root,
            _pad: [0; 2],
        }
    }
}

/// Compiled camera, a verbatim copy of the authored spec.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

/// The full compiled scene: flat buffers plus the merged BVH array.
///
/// Created once per compile, fully populated before being returned, and
/// owned wholesale by the caller afterwards.
#[derive(Clone, Debug, Default)]
pub struct CompiledScene {
    /// All texture payloads back to back, each at a 4-byte-aligned offset.
    pub texture_data: Vec<u8>,
    /// One entry per input texture, order preserving.
    pub texture_metadata: Vec<TextureMetadata>,

    /// 3 entries per primitive, w component zero.
    pub vertex_list: Vec<Vec4>,
    /// 3 entries per primitive, w component zero.
    pub normal_list: Vec<Vec4>,
    /// 3 entries per primitive.
    pub uv_list: Vec<Vec2>,
    /// 1 entry per primitive.
    pub material_index: Vec<u32>,

    /// Top-level instance tree followed by every mesh subtree in mesh
    /// order; all child links are indices into this one array. Every
    /// subtree is laid out root first, so traversal enters the scene at
    /// node 0 and enters a mesh at its instance's
    /// [`MeshInstanceData::bvh_root`].
    pub bvh_node_list: Vec<BvhNode>,
    pub mesh_instance_list: Vec<MeshInstanceData>,

    pub camera: Camera,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 45.0,
        }
    }
}
