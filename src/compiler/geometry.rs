//! Two-level BVH assembly and geometry flattening.
//!
//! Stage A builds the top-level tree over mesh instances (one instance
//! per leaf). Stage B flattens every mesh's primitives into the shared
//! vertex/normal/uv/material buffers while building that mesh's own
//! BVH. Stage C rebases each mesh subtree into the shared node array,
//! and stage D emits the per-instance records pointing at the rebased
//! subtree roots.

use tracing::{debug, trace};

use super::bvh::{build_bvh, Bounded};
use crate::error::{Error, Result};
use crate::math::{Aabb, Vec2, Vec3, Vec4};
use crate::scene::{CompiledScene, MeshInstanceData, Primitive, SceneGraph};

/// Primitive count below which a mesh-level subtree collapses into a
/// single leaf.
pub const MIN_PRIMITIVES_PER_LEAF: usize = 10;

/// A mesh instance prepared for the top-level build. Carries its own
/// index into the scene's instance list so the leaf callback never has
/// to resolve identity after the builder reorders items.
struct InstanceVolume {
    index: u32,
    bounds: Aabb,
}

impl Bounded for InstanceVolume {
    fn bounds(&self) -> Aabb {
        self.bounds
    }
    fn centroid(&self) -> Vec3 {
        self.bounds.center()
    }
}

/// A primitive prepared for a mesh-level build, with bounds and centroid
/// cached so sorting does not recompute them.
struct PrimitiveVolume<'a> {
    prim: &'a Primitive,
    bounds: Aabb,
    centroid: Vec3,
}

impl Bounded for PrimitiveVolume<'_> {
    fn bounds(&self) -> Aabb {
        self.bounds
    }
    fn centroid(&self) -> Vec3 {
        self.centroid
    }
}

/// Monotonic write positions into the shared flat buffers. Threaded by
/// value through every write so each call site shows exactly where the
/// cursors advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct FlattenCursor {
    vertex: usize,
    prim: usize,
}

/// Mutable views over the pre-sized output buffers.
struct FlatBuffers<'a> {
    vertices: &'a mut [Vec4],
    normals: &'a mut [Vec4],
    uvs: &'a mut [Vec2],
    materials: &'a mut [u32],
}

impl FlatBuffers<'_> {
    /// Write one primitive's attributes at `cursor`, returning the
    /// advanced cursor. Vertices and normals are promoted to Vec4
    /// (w = 0) for 16-byte alignment on the device.
    fn write_primitive(&mut self, prim: &Primitive, cursor: FlattenCursor) -> FlattenCursor {
        for i in 0..3 {
            self.vertices[cursor.vertex + i] = prim.vertices[i].extend(0.0);
            self.normals[cursor.vertex + i] = prim.normals[i].extend(0.0);
            self.uvs[cursor.vertex + i] = prim.uvs[i];
        }
        self.materials[cursor.prim] = prim.material_index;

        FlattenCursor {
            vertex: cursor.vertex + 3,
            prim: cursor.prim + 1,
        }
    }
}

/// Partition the scene's geometry into the two-level BVH and flatten all
/// per-vertex attributes into the compiled buffers.
pub(super) fn partition_geometry(parsed: &SceneGraph, out: &mut CompiledScene) -> Result<()> {
    // Unresolvable instance-to-mesh links are fatal before any building
    // starts: a dangling index, or a mesh with no primitives (and hence
    // no subtree to root the instance at).
    for (index, instance) in parsed.mesh_instances.iter().enumerate() {
        let mesh = parsed
            .meshes
            .get(instance.mesh_index as usize)
            .ok_or(Error::DanglingMeshIndex {
                instance: index,
                mesh_index: instance.mesh_index,
                mesh_count: parsed.meshes.len(),
            })?;
        if mesh.primitives.is_empty() {
            return Err(Error::EmptyMesh {
                instance: index,
                mesh_index: instance.mesh_index,
            });
        }
    }

    // Stage A: top-level tree, one instance per leaf. The leaf stores
    // the instance index so traversal can jump to the object-space
    // subtree.
    let instance_volumes: Vec<InstanceVolume> = parsed
        .mesh_instances
        .iter()
        .enumerate()
        .map(|(index, instance)| InstanceVolume {
            index: index as u32,
            bounds: instance.world_bounds(&parsed.meshes[instance.mesh_index as usize]),
        })
        .collect();

    let (instance_nodes, ()) = build_bvh(instance_volumes, 1, (), |node, items, ()| {
        node.set_instance(items[0].index);
    });
    out.bvh_node_list = instance_nodes;
    debug!(
        nodes = out.bvh_node_list.len(),
        instances = parsed.mesh_instances.len(),
        "built top-level instance tree"
    );

    // Stage B: pre-size the flat buffers, then build each mesh's tree
    // while flattening its primitives at the global cursors.
    let total_primitives = parsed.total_primitives();
    out.vertex_list = vec![Vec4::ZERO; total_primitives * 3];
    out.normal_list = vec![Vec4::ZERO; total_primitives * 3];
    out.uv_list = vec![Vec2::ZERO; total_primitives * 3];
    out.material_index = vec![0; total_primitives];

    let mut cursor = FlattenCursor::default();
    let mut mesh_bvh_roots = vec![0u32; parsed.meshes.len()];

    for (mesh_index, mesh) in parsed.meshes.iter().enumerate() {
        let volumes: Vec<PrimitiveVolume> = mesh
            .primitives
            .iter()
            .map(|prim| PrimitiveVolume {
                prim,
                bounds: prim.bounds(),
                centroid: prim.centroid(),
            })
            .collect();

        let mut buffers = FlatBuffers {
            vertices: &mut out.vertex_list,
            normals: &mut out.normal_list,
            uvs: &mut out.uv_list,
            materials: &mut out.material_index,
        };

        let (mut nodes, next_cursor) = build_bvh(
            volumes,
            MIN_PRIMITIVES_PER_LEAF,
            cursor,
            |node, items, mut cursor| {
                node.set_primitives(cursor.prim as u32, items.len() as u32);
                for item in items {
                    cursor = buffers.write_primitive(item.prim, cursor);
                }
                cursor
            },
        );
        cursor = next_cursor;

        // Stage C: rebase this subtree's child indices by the shared
        // array length, exactly once, then append. The builder places
        // the subtree root first, so the root index is the offset
        // itself.
        let offset = out.bvh_node_list.len() as u32;
        for node in &mut nodes {
            node.offset_child_nodes(offset);
        }
        mesh_bvh_roots[mesh_index] = offset;
        trace!(
            mesh = mesh_index,
            nodes = nodes.len(),
            root = mesh_bvh_roots[mesh_index],
            "merged mesh subtree"
        );
        out.bvh_node_list.extend(nodes);
    }

    // Stage D: per-instance records. Traversal maps world-space rays
    // into object space, so the stored matrix is the inverse.
    out.mesh_instance_list = parsed
        .mesh_instances
        .iter()
        .map(|instance| {
            MeshInstanceData::new(
                instance.mesh_index,
                mesh_bvh_roots[instance.mesh_index as usize],
                instance.transform.inverse(),
            )
        })
        .collect();

    debug!(
        bvh_nodes = out.bvh_node_list.len(),
        primitives = total_primitives,
        "geometry partitioned"
    );
    Ok(())
}
