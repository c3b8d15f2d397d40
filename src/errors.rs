//! Construction errors
//!
//! The fracture pipeline itself never fails: degenerate input falls through to
//! a no-op. Only the boundaries that build a [`MeshGraph`](crate::mesh::MeshGraph)
//! from raw data, or hand geometry to the physics collaborator, report errors.

use thiserror::Error;

/// Result type for fallible construction steps.
pub type FractureResult<T> = Result<T, FractureError>;

/// All the possible construction issues we might encounter
#[derive(Debug, Error)]
pub enum FractureError {
    /// A face references a vertex that does not exist
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    /// A face loop has fewer than three vertices
    #[error("face {face} has {len} vertices, at least 3 are required")]
    DegenerateFace { face: usize, len: usize },

    /// A face loop visits the same vertex twice
    #[error("face {face} uses vertex {index} more than once")]
    DuplicateFaceVertex { face: usize, index: usize },

    /// Indicates an inconsistency while building a triangle mesh
    #[error(transparent)]
    TriMesh(#[from] crate::float_types::parry3d::shape::TriMeshBuilderError),

    /// Error bubbled up while reading or writing mesh files
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// In general, anything else
    #[error("input is malformed: {0}")]
    MalformedInput(String),
}
