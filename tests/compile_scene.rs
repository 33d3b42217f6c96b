//! End-to-end compile tests over hand-built scene graphs.

use std::sync::Once;

use scenec::prelude::*;

static TRACING: Once = Once::new();

/// Route stage logs to the test harness, filtered by RUST_LOG.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Axis-aligned unit triangle at `offset`.
fn triangle(offset: Vec3, material: u32) -> Primitive {
    Primitive {
        vertices: [
            offset,
            offset + Vec3::new(1.0, 0.0, 0.0),
            offset + Vec3::new(0.0, 1.0, 0.0),
        ],
        normals: [Vec3::Z; 3],
        uvs: [Vec2::ZERO, Vec2::X, Vec2::Y],
        material_index: material,
    }
}

fn strip_mesh(count: usize, material: u32) -> Mesh {
    Mesh::new(
        (0..count)
            .map(|i| triangle(Vec3::new(i as f32 * 1.5, (i % 3) as f32, 0.0), material))
            .collect(),
    )
}

/// A scene with enough primitives to force real splits: three meshes,
/// four instances (one mesh instanced twice), three textures.
fn test_scene() -> SceneGraph {
    SceneGraph {
        textures: vec![
            Texture {
                format: TextureFormat::Rgba8,
                width: 2,
                height: 2,
                data: vec![0xAB; 16],
            },
            Texture {
                format: TextureFormat::Luminance8,
                width: 3,
                height: 1,
                data: vec![1, 2, 3],
            },
            Texture {
                format: TextureFormat::Luminance32F,
                width: 1,
                height: 1,
                data: vec![0; 4],
            },
        ],
        meshes: vec![strip_mesh(25, 0), strip_mesh(3, 1), strip_mesh(12, 2)],
        mesh_instances: vec![
            MeshInstance {
                mesh_index: 0,
                transform: Mat4::IDENTITY,
            },
            MeshInstance {
                mesh_index: 1,
                transform: Mat4::from_translation(Vec3::new(20.0, 0.0, 0.0)),
            },
            MeshInstance {
                mesh_index: 2,
                transform: Mat4::from_rotation_y(0.7) * Mat4::from_translation(Vec3::new(0.0, 0.0, -8.0)),
            },
            MeshInstance {
                mesh_index: 0,
                transform: Mat4::from_scale(Vec3::splat(2.0)) * Mat4::from_translation(Vec3::new(-5.0, 3.0, 1.0)),
            },
        ],
        camera: CameraSpec {
            fov: 55.0,
            eye: Vec3::new(0.0, 2.0, 10.0),
            look: Vec3::ZERO,
            up: Vec3::Y,
        },
    }
}

/// Number of nodes the top-level instance tree occupies at the front of
/// the shared array (threshold 1 over k instances gives 2k - 1 nodes).
fn top_level_len(scene: &SceneGraph) -> usize {
    2 * scene.mesh_instances.len() - 1
}

#[test]
fn test_buffer_lengths_match_primitive_count() {
    init_tracing();
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    let total = scene.total_primitives();
    assert_eq!(total, 40);
    assert_eq!(compiled.vertex_list.len(), total * 3);
    assert_eq!(compiled.normal_list.len(), total * 3);
    assert_eq!(compiled.uv_list.len(), total * 3);
    assert_eq!(compiled.material_index.len(), total);
}

#[test]
fn test_texture_blob_alignment_and_recovery() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    assert_eq!(compiled.texture_metadata.len(), 3);
    for (meta, tex) in compiled.texture_metadata.iter().zip(&scene.textures) {
        assert_eq!(meta.data_offset % 4, 0);
        let start = meta.data_offset as usize;
        assert!(start + tex.data.len() <= compiled.texture_data.len());
        assert_eq!(&compiled.texture_data[start..start + tex.data.len()], &tex.data[..]);
    }
    // 16 + align4(3) + 4
    assert_eq!(compiled.texture_data.len(), 24);
}

#[test]
fn test_all_child_indices_within_final_array() {
    let compiled = compile(&test_scene()).unwrap();
    for node in &compiled.bvh_node_list {
        if !node.is_leaf() {
            let (l, r) = node.child_nodes();
            assert!((l as usize) < compiled.bvh_node_list.len());
            assert!((r as usize) < compiled.bvh_node_list.len());
        }
    }
}

#[test]
fn test_mesh_leaf_ranges_partition_all_primitives() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    let mut ranges: Vec<(u32, u32)> = compiled.bvh_node_list[top_level_len(&scene)..]
        .iter()
        .filter(|n| n.is_leaf())
        .map(|n| n.leaf_payload())
        .collect();
    ranges.sort();

    let mut next = 0u32;
    for (offset, count) in ranges {
        assert_eq!(offset, next, "leaf ranges must tile with no gap or overlap");
        next = offset + count;
    }
    assert_eq!(next as usize, scene.total_primitives());
}

#[test]
fn test_leaf_threshold_respected() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    let counts: Vec<u32> = compiled.bvh_node_list[top_level_len(&scene)..]
        .iter()
        .filter(|n| n.is_leaf())
        .map(|n| n.leaf_payload().1)
        .collect();

    // Mesh 1 holds 3 primitives, fewer than the minimum, so it is the
    // single undersized leaf; every other leaf meets the minimum.
    let undersized: Vec<&u32> = counts
        .iter()
        .filter(|&&c| (c as usize) < MIN_PRIMITIVES_PER_LEAF)
        .collect();
    assert_eq!(undersized, vec![&3]);
    for count in &counts {
        assert!((*count as usize) < MIN_PRIMITIVES_PER_LEAF * 2);
    }
}

#[test]
fn test_instance_roots_reference_their_mesh_subtree() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    // Instances of the same mesh share one subtree root
    assert_eq!(
        compiled.mesh_instance_list[0].bvh_root,
        compiled.mesh_instance_list[3].bvh_root
    );
    // Roots of different meshes differ and lie past the top-level tree
    let roots: Vec<u32> = compiled.mesh_instance_list.iter().map(|i| i.bvh_root).collect();
    for root in &roots {
        assert!((*root as usize) >= top_level_len(&scene));
        assert!((*root as usize) < compiled.bvh_node_list.len());
    }
    assert_ne!(roots[0], roots[1]);
    assert_ne!(roots[1], roots[2]);
}

#[test]
fn test_stored_transforms_invert_authored_ones() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    for (instance, record) in scene.mesh_instances.iter().zip(&compiled.mesh_instance_list) {
        assert_eq!(record.mesh_index, instance.mesh_index);
        let roundtrip = record.transform * instance.transform;
        assert!(
            roundtrip.abs_diff_eq(Mat4::IDENTITY, 1e-5),
            "inverse times authored should be identity, got {roundtrip:?}"
        );
    }
}

#[test]
fn test_camera_copied_verbatim() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();
    assert_eq!(compiled.camera.fov, scene.camera.fov);
    assert_eq!(compiled.camera.position, scene.camera.eye);
    assert_eq!(compiled.camera.look_at, scene.camera.look);
    assert_eq!(compiled.camera.up, scene.camera.up);
}

#[test]
fn test_compile_is_deterministic_down_to_bytes() {
    let scene = test_scene();
    let a = compile(&scene).unwrap();
    let b = compile(&scene).unwrap();

    assert_eq!(a.texture_data, b.texture_data);
    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&a.vertex_list),
        bytemuck::cast_slice::<_, u8>(&b.vertex_list)
    );
    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&a.normal_list),
        bytemuck::cast_slice::<_, u8>(&b.normal_list)
    );
    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&a.uv_list),
        bytemuck::cast_slice::<_, u8>(&b.uv_list)
    );
    assert_eq!(a.material_index, b.material_index);
    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&a.bvh_node_list),
        bytemuck::cast_slice::<_, u8>(&b.bvh_node_list)
    );
    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&a.mesh_instance_list),
        bytemuck::cast_slice::<_, u8>(&b.mesh_instance_list)
    );
}

#[test]
fn test_material_indices_flattened_per_primitive() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    // Each mesh used one material; counts must match mesh sizes
    let count_of = |mat: u32| compiled.material_index.iter().filter(|&&m| m == mat).count();
    assert_eq!(count_of(0), 25);
    assert_eq!(count_of(1), 3);
    assert_eq!(count_of(2), 12);
}

#[test]
fn test_traversal_entry_points_are_declared() {
    let scene = test_scene();
    let compiled = compile(&scene).unwrap();

    // The scene is entered at node 0: the top-level root spans every
    // instance's world bounds.
    let root = &compiled.bvh_node_list[0];
    assert!(!root.is_leaf());
    for (instance, mesh) in scene
        .mesh_instances
        .iter()
        .map(|i| (i, &scene.meshes[i.mesh_index as usize]))
    {
        let bounds = instance.world_bounds(mesh);
        assert!(root.min.x <= bounds.min.x + 1e-4);
        assert!(root.max.x >= bounds.max.x - 1e-4);
    }

    // Each mesh subtree is entered at its instance's bvh_root: the
    // first node past the previous subtree, spanning the mesh bounds.
    for record in &compiled.mesh_instance_list {
        let root = &compiled.bvh_node_list[record.bvh_root as usize];
        let mesh_bounds = scene.meshes[record.mesh_index as usize].bounds();
        assert!((root.min - mesh_bounds.min).length() < 1e-4);
        assert!((root.max - mesh_bounds.max).length() < 1e-4);
    }
}

#[test]
fn test_instanced_empty_mesh_aborts_compile() {
    // An instance of a primitive-less mesh has no subtree to point at;
    // it must fail the compile instead of emitting a dangling root.
    let scene = SceneGraph {
        meshes: vec![Mesh::default()],
        mesh_instances: vec![MeshInstance {
            mesh_index: 0,
            transform: Mat4::IDENTITY,
        }],
        ..Default::default()
    };
    let err = compile(&scene).unwrap_err();
    assert!(matches!(err, Error::EmptyMesh { instance: 0, mesh_index: 0 }));
}

#[test]
fn test_dangling_instance_aborts_compile() {
    let mut scene = test_scene();
    scene.mesh_instances[2].mesh_index = 99;
    let err = compile(&scene).unwrap_err();
    assert!(matches!(
        err,
        Error::DanglingMeshIndex { instance: 2, mesh_index: 99, mesh_count: 3 }
    ));
}
