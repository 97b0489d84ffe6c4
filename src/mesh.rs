//! The flat mesh representation exchanged with host applications, and its
//! conversion to and from polygon lists.
//!
//! This is the engine's only external boundary: vertex/index buffers come
//! in, get grouped into polygon loops, and results are fan-triangulated
//! back out. Anything fancier (welding, attribute generation, UV repair)
//! belongs to the caller.

use crate::errors::{CsgError, Result};
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use std::fmt::Debug;

/// How the index buffer groups into faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Quads,
}

impl Topology {
    /// Indices consumed per face.
    pub const fn stride(&self) -> usize {
        match self {
            Topology::Triangles => 3,
            Topology::Quads => 4,
        }
    }
}

/// A flat, indexed mesh: the shape host applications hand us and get back.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Mesh {
    pub const fn new(vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) -> Self {
        Mesh {
            vertices,
            indices,
            topology,
        }
    }

    /// Group the index buffer into polygon loops.
    ///
    /// Fails if the index buffer length is not a multiple of the face
    /// stride, or if any index points past the vertex array. Faces whose
    /// first three vertices are collinear still come through, carrying a
    /// degenerate plane the engine treats as unsplittable.
    pub fn to_polygons<S: Clone + Send + Sync + Debug>(
        &self,
        metadata: Option<S>,
    ) -> Result<Vec<Polygon<S>>> {
        let stride = self.topology.stride();
        if self.indices.len() % stride != 0 {
            return Err(CsgError::RaggedIndexBuffer {
                len: self.indices.len(),
                stride,
            });
        }

        let mut polygons = Vec::with_capacity(self.indices.len() / stride);
        for face in self.indices.chunks_exact(stride) {
            let mut loop_vertices = Vec::with_capacity(stride);
            for &index in face {
                let vertex =
                    self.vertices
                        .get(index as usize)
                        .ok_or_else(|| CsgError::IndexOutOfRange {
                            index: index as usize,
                            len: self.vertices.len(),
                        })?;
                loop_vertices.push(vertex.clone());
            }
            polygons.push(Polygon::new(loop_vertices, metadata.clone()));
        }
        Ok(polygons)
    }

    /// Fan-triangulate each polygon and flatten to vertex/index buffers.
    ///
    /// Each n-gon becomes `n - 2` triangles sharing its first vertex, and
    /// every triangle gets its own three vertices (no welding), preserving
    /// whichever attributes each vertex carries. The result is always
    /// [`Topology::Triangles`].
    pub fn from_polygons<S: Clone + Send + Sync + Debug>(polygons: &[Polygon<S>]) -> Mesh {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut index_offset: u32 = 0;

        for polygon in polygons {
            for triangle in polygon.tessellate() {
                vertices.extend(triangle);
                indices.extend([index_offset, index_offset + 1, index_offset + 2]);
                index_offset += 3;
            }
        }

        Mesh {
            vertices,
            indices,
            topology: Topology::Triangles,
        }
    }
}
