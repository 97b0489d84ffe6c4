//! Error types for the mesh boundary of the crate.
//!
//! The CSG algorithms themselves never fail: degenerate planes and sliver
//! fragments are absorbed or dropped locally. Errors only arise where index
//! buffers and transforms enter or leave the engine.

use crate::float_types::Real;
use thiserror::Error;

/// Errors produced when converting meshes or applying transforms.
#[derive(Error, Debug)]
pub enum CsgError {
    /// An index buffer whose length is not a multiple of the face stride.
    #[error("index buffer length {len} is not a multiple of {stride}")]
    RaggedIndexBuffer { len: usize, stride: usize },

    /// A face index pointing past the end of the vertex array.
    #[error("face index {index} is out of range (mesh has {len} vertices)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A solid with no triangles where one is required.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A transform matrix with no inverse (normals cannot be transformed).
    #[error("transform matrix is singular (determinant {det})")]
    SingularTransform { det: Real },

    /// Collision-shape construction rejected the tessellated mesh.
    #[error("trimesh construction failed: {0}")]
    TriMeshFailed(String),
}

/// Result type for mesh-boundary operations.
pub type Result<T> = std::result::Result<T, CsgError>;
