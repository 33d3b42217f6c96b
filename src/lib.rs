//! # scenec
//!
//! Scene compiler for a compute-based path tracer. Takes the
//! artist-authored object graph produced by an external scene parser
//! and flattens it into the GPU-consumable form the traversal engine
//! uploads to the device: alignment-correct attribute buffers, one
//! addressable texture blob, and a two-level bounding volume hierarchy
//! merged into a single globally-indexed node array.
//!
//! ## Modules
//!
//! - [`math`] - glam re-exports and the [`math::Aabb`] bounding box
//! - [`error`] - error enum and crate `Result`
//! - [`scene`] - input object graph and compiled output buffers
//! - [`compiler`] - compile driver, BVH builder, geometry partitioner
//! - [`material`] - blend-operator taxonomy, layered-material stub
//!
//! ## Example
//!
//! ```
//! use scenec::prelude::*;
//!
//! let parsed = SceneGraph::default();
//! let compiled = scenec::compiler::compile(&parsed)?;
//! assert!(compiled.bvh_node_list.is_empty());
//! # Ok::<(), scenec::Error>(())
//! ```

pub mod compiler;
pub mod error;
pub mod material;
pub mod math;
pub mod scene;

// Re-export commonly used types
pub use compiler::compile;
pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::compiler::{compile, MIN_PRIMITIVES_PER_LEAF};
    pub use crate::error::{Error, Result};
    pub use crate::math::{Aabb, Mat4, Vec2, Vec3, Vec4};
    pub use crate::scene::{
        BvhNode, Camera, CameraSpec, CompiledScene, Mesh, MeshInstance, MeshInstanceData,
        Primitive, SceneGraph, Texture, TextureFormat, TextureMetadata,
    };
}
