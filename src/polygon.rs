//! Polygons, the unit of geometry the BSP tree partitions.

use crate::plane::Plane;
use crate::vertex::Vertex;
use std::fmt::Debug;

/// A planar polygon: an ordered vertex loop (first and last implicitly
/// connected), the plane it lies in, and an optional metadata payload that
/// rides along through every split.
///
/// Vertices are expected to be coplanar with `plane` to within the
/// classification tolerance; small violations are exactly what the
/// epsilon-based tests absorb.
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    pub vertices: Vec<Vertex>,
    /// Supporting plane, derived from the first three vertices.
    pub plane: Plane,
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> Polygon<S> {
    /// Build a polygon from a vertex loop, deriving the supporting plane
    /// from the first three vertices.
    ///
    /// Fewer than three vertices (or a collinear first triple) produce a
    /// degenerate plane; such polygons are carried through unclassified
    /// rather than split.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Self {
        let plane = match vertices.as_slice() {
            [a, b, c, ..] => Plane::from_points(&a.pos, &b.pos, &c.pos),
            _ => Plane::from_normal(nalgebra::Vector3::zeros(), 0.0),
        };
        Polygon {
            vertices,
            plane,
            metadata,
        }
    }

    /// Build a polygon with an explicitly provided supporting plane.
    ///
    /// Used for split fragments, which inherit the parent polygon's plane:
    /// it is exact for every fragment, whereas recomputing from a sliver's
    /// first three vertices can degenerate.
    pub const fn with_plane(vertices: Vec<Vertex>, plane: Plane, metadata: Option<S>) -> Self {
        Polygon {
            vertices,
            plane,
            metadata,
        }
    }

    /// Reverse the winding: flip vertex order, each vertex's oriented
    /// attributes, and the supporting plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }

    /// Fan-triangulate into `len - 2` triangles sharing the first vertex.
    ///
    /// Correct for convex polygons, which is all the engine produces from
    /// convex input; concave source n-gons are not repaired here.
    pub fn tessellate(&self) -> Vec<[Vertex; 3]> {
        let mut triangles = Vec::new();
        if self.vertices.len() >= 3 {
            for i in 1..(self.vertices.len() - 1) {
                triangles.push([
                    self.vertices[0].clone(),
                    self.vertices[i].clone(),
                    self.vertices[i + 1].clone(),
                ]);
            }
        }
        triangles
    }
}
