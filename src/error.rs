//! Error types for the scene compiler.

use thiserror::Error;

/// Main error type for compile operations.
///
/// The compile is a one-shot transform over already-validated input, so
/// every variant is fatal: the pipeline aborts and no partial scene is
/// returned.
#[derive(Error, Debug)]
pub enum Error {
    /// A mesh instance references a mesh index the scene does not define
    #[error(
        "geometry partitioning: instance {instance} references mesh {mesh_index} \
         (scene defines {mesh_count} meshes)"
    )]
    DanglingMeshIndex {
        instance: usize,
        mesh_index: u32,
        mesh_count: usize,
    },

    /// A mesh instance references a mesh that contains no primitives,
    /// so there is no subtree root to point its record at
    #[error(
        "geometry partitioning: instance {instance} references mesh {mesh_index}, \
         which has no primitives"
    )]
    EmptyMesh { instance: usize, mesh_index: u32 },

    /// A declared stage that has no implementation yet was invoked
    #[error("{0} is not implemented")]
    Unsupported(&'static str),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
