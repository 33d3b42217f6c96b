//! Scene compiler.
//!
//! [`compile`] turns a parsed [`SceneGraph`] into the flat
//! [`CompiledScene`] the traversal engine uploads to the device. The
//! pipeline is a one-shot synchronous batch: bake textures, partition
//! geometry, set up the camera. Any stage error aborts the whole
//! compile with no partial output.

pub mod bvh;
mod geometry;

pub use bvh::{build_bvh, Bounded};
pub use geometry::MIN_PRIMITIVES_PER_LEAF;

use tracing::debug;

use crate::error::Result;
use crate::scene::{Camera, CompiledScene, SceneGraph, TextureMetadata};

/// Compile a parsed scene into the GPU-friendly flat representation.
///
/// The layered-material stage
/// ([`crate::material::compile_layered_materials`]) is deliberately not
/// part of this pipeline yet; it fails loudly when invoked, so the
/// driver omits the call instead of swallowing the error.
pub fn compile(parsed: &SceneGraph) -> Result<CompiledScene> {
    let mut scene = CompiledScene::default();

    bake_textures(parsed, &mut scene)?;
    geometry::partition_geometry(parsed, &mut scene)?;
    setup_camera(parsed, &mut scene)?;

    debug!(
        textures = scene.texture_metadata.len(),
        primitives = scene.material_index.len(),
        bvh_nodes = scene.bvh_node_list.len(),
        "scene compiled"
    );
    Ok(scene)
}

/// Pack every texture payload into one contiguous block, each at a
/// 4-byte-aligned offset, and record per-texture metadata pointing into
/// the block. Input order is preserved.
fn bake_textures(parsed: &SceneGraph, out: &mut CompiledScene) -> Result<()> {
    let total_len: usize = parsed.textures.iter().map(|tex| align4(tex.data.len())).sum();

    out.texture_data = vec![0u8; total_len];
    out.texture_metadata = Vec::with_capacity(parsed.textures.len());

    let mut offset = 0usize;
    for tex in &parsed.textures {
        out.texture_metadata
            .push(TextureMetadata::new(tex.format, tex.width, tex.height, offset as u32));

        out.texture_data[offset..offset + tex.data.len()].copy_from_slice(&tex.data);
        offset += align4(tex.data.len());
    }

    debug!(count = parsed.textures.len(), bytes = total_len, "textures baked");
    Ok(())
}

/// Copy the authored camera spec into the compiled scene verbatim.
fn setup_camera(parsed: &SceneGraph, out: &mut CompiledScene) -> Result<()> {
    out.camera = Camera {
        position: parsed.camera.eye,
        look_at: parsed.camera.look,
        up: parsed.camera.up,
        fov: parsed.camera.fov,
    };
    Ok(())
}

/// Round `value` up to the next multiple of 4.
fn align4(value: usize) -> usize {
    (value + 3) & !3
}
