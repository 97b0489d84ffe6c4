//! The top-level CSG solid type and its boolean operators.

use crate::bsp::Node;
use crate::errors::{CsgError, Result};
use crate::float_types::Real;
use crate::float_types::parry3d::{
    bounding_volume::Aabb,
    shape::{Shape, SharedShape, TriMesh},
};
use crate::mesh::Mesh;
use crate::plane::Plane;
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use nalgebra::{Matrix4, Point3, Quaternion, Rotation3, Translation3, Unit, Vector3};
use std::fmt::Debug;
use tracing::debug;

#[cfg(feature = "hashmap")]
use hashbrown::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A CSG solid: a list of polygons bounding a closed volume, plus optional
/// metadata propagated onto polygons created on its behalf.
#[derive(Debug, Clone)]
pub struct CSG<S: Clone> {
    /// Boundary polygons of the solid.
    pub polygons: Vec<Polygon<S>>,

    /// Metadata
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> CSG<S> {
    /// Create an empty CSG
    pub const fn new() -> Self {
        CSG {
            polygons: Vec::new(),
            metadata: None,
        }
    }

    /// Build a CSG from an existing polygon list
    pub fn from_polygons(polygons: &[Polygon<S>]) -> Self {
        CSG {
            polygons: polygons.to_vec(),
            metadata: None,
        }
    }

    /// Build a CSG from a flat indexed mesh, attaching `metadata` to every
    /// polygon.
    pub fn from_mesh(mesh: &Mesh, metadata: Option<S>) -> Result<Self> {
        Ok(CSG {
            polygons: mesh.to_polygons(metadata.clone())?,
            metadata,
        })
    }

    /// Flatten back into an indexed triangle mesh (fan triangulation).
    pub fn to_mesh(&self) -> Mesh {
        Mesh::from_polygons(&self.polygons)
    }

    /// Helper to collect all vertices from the CSG.
    #[cfg(not(feature = "parallel"))]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.polygons
            .iter()
            .flat_map(|p| p.vertices.clone())
            .collect()
    }

    /// Parallel helper to collect all vertices from the CSG.
    #[cfg(feature = "parallel")]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.polygons
            .par_iter()
            .flat_map(|p| p.vertices.clone())
            .collect()
    }

    /// Return a new CSG representing union of the two CSG's.
    ///
    /// ```text
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |       +----+
    ///     +----+--+    |       +----+       |
    ///          |   b   |            |   c   |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    #[must_use = "Use new CSG representing space in both CSG's"]
    pub fn union(&self, other: &CSG<S>) -> CSG<S> {
        debug!(a = self.polygons.len(), b = other.polygons.len(), "union");
        let mut a = Node::new(&self.polygons);
        let mut b = Node::new(&other.polygons);

        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());

        CSG {
            polygons: a.all_polygons(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new CSG representing difference of the two CSG's.
    ///
    /// ```text
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |    +--+
    ///     +----+--+    |       +----+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    #[must_use = "Use new CSG"]
    pub fn difference(&self, other: &CSG<S>) -> CSG<S> {
        debug!(
            a = self.polygons.len(),
            b = other.polygons.len(),
            "difference"
        );
        let mut a = Node::new(&self.polygons);
        let mut b = Node::new(&other.polygons);

        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());
        a.invert();

        CSG {
            polygons: a.all_polygons(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new CSG representing intersection of the two CSG's.
    ///
    /// ```text
    ///     +-------+
    ///     |       |
    ///     |   a   |
    ///     |    +--+----+   =   +--+
    ///     +----+--+    |       +--+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    #[must_use = "Use new CSG"]
    pub fn intersection(&self, other: &CSG<S>) -> CSG<S> {
        debug!(
            a = self.polygons.len(),
            b = other.polygons.len(),
            "intersection"
        );
        let mut a = Node::new(&self.polygons);
        let mut b = Node::new(&other.polygons);

        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(&b.all_polygons());
        a.invert();

        CSG {
            polygons: a.all_polygons(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new CSG representing space in this CSG excluding the space in the
    /// other CSG plus the space in the other CSG excluding the space in this CSG.
    ///
    /// ```text
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   a   |
    ///     |    +--+----+   =   |    +--+----+
    ///     +----+--+    |       +----+--+    |
    ///          |   b   |            |       |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    #[must_use = "Use new CSG"]
    pub fn xor(&self, other: &CSG<S>) -> CSG<S> {
        let a_sub_b = self.difference(other);
        let b_sub_a = other.difference(self);
        a_sub_b.union(&b_sub_a)
    }

    /// Invert this CSG (flip inside vs. outside)
    pub fn inverse(&self) -> CSG<S> {
        let mut csg = self.clone();
        for p in &mut csg.polygons {
            p.flip();
        }
        csg
    }

    /// Apply an arbitrary 3D transform (as a 4x4 matrix) to all polygons.
    ///
    /// Positions go through the matrix; normals go through its
    /// inverse-transpose; tangent directions through the linear part with the
    /// bitangent sign preserved. Each polygon's plane is recomputed from its
    /// transformed vertices.
    pub fn transform(&self, mat: &Matrix4<Real>) -> Result<CSG<S>> {
        let mat_inv_transpose = mat
            .try_inverse()
            .ok_or(CsgError::SingularTransform {
                det: mat.determinant(),
            })?
            .transpose();
        Ok(self.apply_transform(mat, &mat_inv_transpose))
    }

    /// The shared transform loop. Callers supply the inverse-transpose, so
    /// invertible-by-construction transforms (translations, rotations) skip
    /// the fallible inversion entirely.
    fn apply_transform(&self, mat: &Matrix4<Real>, mat_inv_transpose: &Matrix4<Real>) -> CSG<S> {
        let mut csg = self.clone();

        for poly in &mut csg.polygons {
            for vert in &mut poly.vertices {
                vert.pos = mat.transform_point(&vert.pos);

                if let Some(n) = vert.normal.as_mut() {
                    *n = mat_inv_transpose.transform_vector(n).normalize();
                }
                if let Some(t) = vert.tangent.as_mut() {
                    let dir = mat.transform_vector(&Vector3::new(t.x, t.y, t.z));
                    t.x = dir.x;
                    t.y = dir.y;
                    t.z = dir.z;
                }
            }

            if poly.vertices.len() >= 3 {
                poly.plane = Plane::from_points(
                    &poly.vertices[0].pos,
                    &poly.vertices[1].pos,
                    &poly.vertices[2].pos,
                );
            }
        }

        csg
    }

    /// Returns a new CSG translated by x, y, and z.
    #[must_use = "Use the new CSG"]
    pub fn translate(&self, x: Real, y: Real, z: Real) -> CSG<S> {
        self.translate_vector(Vector3::new(x, y, z))
    }

    /// Returns a new CSG translated by vector.
    #[must_use = "Use the new CSG"]
    pub fn translate_vector(&self, vector: Vector3<Real>) -> CSG<S> {
        let mat4 = Translation3::from(vector).to_homogeneous();
        let inv = Translation3::from(-vector).to_homogeneous();
        self.apply_transform(&mat4, &inv.transpose())
    }

    /// Returns a new CSG translated so that its bounding-box center is at the origin (0,0,0).
    #[must_use = "Use the new CSG"]
    pub fn center(&self) -> Self {
        let aabb = self.bounding_box();

        let center_x = (aabb.mins.x + aabb.maxs.x) * 0.5;
        let center_y = (aabb.mins.y + aabb.maxs.y) * 0.5;
        let center_z = (aabb.mins.z + aabb.maxs.z) * 0.5;

        self.translate(-center_x, -center_y, -center_z)
    }

    /// Rotates the CSG by `x_deg`, `y_deg`, `z_deg` degrees, applied in x, y, z order.
    #[must_use = "Use the new CSG"]
    pub fn rotate(&self, x_deg: Real, y_deg: Real, z_deg: Real) -> CSG<S> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());

        let rot = rz * ry * rx;
        let inv = rot.inverse().to_homogeneous();
        self.apply_transform(&rot.to_homogeneous(), &inv.transpose())
    }

    /// Scales the CSG by `sx`, `sy`, `sz`. A zero factor makes the transform
    /// singular and is rejected.
    pub fn scale(&self, sx: Real, sy: Real, sz: Real) -> Result<CSG<S>> {
        let mat4 = Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz));
        self.transform(&mat4)
    }

    /// Axis-aligned bounding box over all polygon vertices.
    pub fn bounding_box(&self) -> Aabb {
        let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
        let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);

        for poly in &self.polygons {
            for v in &poly.vertices {
                mins.x = mins.x.min(v.pos.x);
                mins.y = mins.y.min(v.pos.y);
                mins.z = mins.z.min(v.pos.z);

                maxs.x = maxs.x.max(v.pos.x);
                maxs.y = maxs.y.max(v.pos.y);
                maxs.z = maxs.z.max(v.pos.z);
            }
        }

        // Empty solids get a trivial box at the origin.
        if mins.x > maxs.x {
            return Aabb::new(Point3::origin(), Point3::origin());
        }

        Aabb::new(mins, maxs)
    }

    /// Triangulate each polygon in the CSG returning a CSG containing triangles
    #[must_use = "Use the new CSG"]
    pub fn tessellate(&self) -> CSG<S> {
        let mut triangles = Vec::new();

        for poly in &self.polygons {
            for triangle in poly.tessellate() {
                triangles.push(Polygon::new(triangle.to_vec(), poly.metadata.clone()));
            }
        }

        CSG {
            polygons: triangles,
            metadata: self.metadata.clone(),
        }
    }

    /// Convert the polygons in this CSG to a Parry `TriMesh`, useful for
    /// collision detection.
    pub fn to_trimesh(&self) -> Result<SharedShape> {
        let tri_csg = self.tessellate();
        if tri_csg.polygons.is_empty() {
            return Err(CsgError::EmptyMesh);
        }

        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut index_offset = 0;

        for poly in &tri_csg.polygons {
            vertices.push(poly.vertices[0].pos);
            vertices.push(poly.vertices[1].pos);
            vertices.push(poly.vertices[2].pos);

            indices.push([index_offset, index_offset + 1, index_offset + 2]);
            index_offset += 3;
        }

        let trimesh = TriMesh::new(vertices, indices)
            .map_err(|e| CsgError::TriMeshFailed(format!("{e:?}")))?;
        Ok(SharedShape::new(trimesh))
    }

    /// Approximate mass properties: `(mass, center of mass, principal inertia
    /// frame)` at the given density. For density 1 the mass equals the
    /// enclosed volume.
    pub fn mass_properties(
        &self,
        density: Real,
    ) -> Result<(Real, Point3<Real>, Unit<Quaternion<Real>>)> {
        let shape = self.to_trimesh()?;
        if let Some(trimesh) = shape.as_trimesh() {
            let mp = trimesh.mass_properties(density);
            Ok((mp.mass(), mp.local_com, mp.principal_inertia_local_frame))
        } else {
            Ok((0.0, Point3::origin(), Unit::<Quaternion<Real>>::identity()))
        }
    }

    /// Checks if the CSG object is manifold.
    ///
    /// Tessellates the polygons, then counts how many triangles share each
    /// undirected edge, with endpoints quantized so nearly identical
    /// positions hash together. Every edge of a closed surface must appear
    /// exactly twice.
    #[cfg(feature = "hashmap")]
    pub fn is_manifold(&self) -> bool {
        let tri_csg = self.tessellate();
        let mut edge_counts: HashMap<(EndKey, EndKey), u32> = HashMap::new();

        for poly in &tri_csg.polygons {
            for &(i0, i1) in &[(0, 1), (1, 2), (2, 0)] {
                let a = make_key(&poly.vertices[i0].pos);
                let b = make_key(&poly.vertices[i1].pos);

                // Order endpoints so both directions of an edge share a key.
                let key = if a <= b { (a, b) } else { (b, a) };
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }

        edge_counts.values().all(|&count| count == 2)
    }

    /// Create a right prism (a box) that spans from (0, 0, 0)
    /// to (width, length, height). All dimensions must be >= 0.
    #[cfg(test)]
    pub(crate) fn cube(width: Real, length: Real, height: Real, metadata: Option<S>) -> CSG<S> {
        let p000 = Point3::new(0.0, 0.0, 0.0);
        let p100 = Point3::new(width, 0.0, 0.0);
        let p110 = Point3::new(width, length, 0.0);
        let p010 = Point3::new(0.0, length, 0.0);

        let p001 = Point3::new(0.0, 0.0, height);
        let p101 = Point3::new(width, 0.0, height);
        let p111 = Point3::new(width, length, height);
        let p011 = Point3::new(0.0, length, height);

        // Six faces wound counter-clockwise as seen from outside.
        let bottom_normal = -Vector3::z();
        let bottom = Polygon::new(
            vec![
                Vertex::new(p000, bottom_normal),
                Vertex::new(p010, bottom_normal),
                Vertex::new(p110, bottom_normal),
                Vertex::new(p100, bottom_normal),
            ],
            metadata.clone(),
        );

        let top_normal = Vector3::z();
        let top = Polygon::new(
            vec![
                Vertex::new(p001, top_normal),
                Vertex::new(p101, top_normal),
                Vertex::new(p111, top_normal),
                Vertex::new(p011, top_normal),
            ],
            metadata.clone(),
        );

        let front_normal = -Vector3::y();
        let front = Polygon::new(
            vec![
                Vertex::new(p000, front_normal),
                Vertex::new(p100, front_normal),
                Vertex::new(p101, front_normal),
                Vertex::new(p001, front_normal),
            ],
            metadata.clone(),
        );

        let back_normal = Vector3::y();
        let back = Polygon::new(
            vec![
                Vertex::new(p010, back_normal),
                Vertex::new(p011, back_normal),
                Vertex::new(p111, back_normal),
                Vertex::new(p110, back_normal),
            ],
            metadata.clone(),
        );

        let left_normal = -Vector3::x();
        let left = Polygon::new(
            vec![
                Vertex::new(p000, left_normal),
                Vertex::new(p001, left_normal),
                Vertex::new(p011, left_normal),
                Vertex::new(p010, left_normal),
            ],
            metadata.clone(),
        );

        let right_normal = Vector3::x();
        let right = Polygon::new(
            vec![
                Vertex::new(p100, right_normal),
                Vertex::new(p110, right_normal),
                Vertex::new(p111, right_normal),
                Vertex::new(p101, right_normal),
            ],
            metadata.clone(),
        );

        CSG::from_polygons(&[bottom, top, front, back, left, right])
    }

    /// Construct a sphere with radius, segments, stacks
    #[cfg(test)]
    pub(crate) fn sphere(
        radius: Real,
        segments: usize,
        stacks: usize,
        metadata: Option<S>,
    ) -> CSG<S> {
        use crate::float_types::{PI, TAU};

        let mut polygons = Vec::new();

        for i in 0..segments {
            for j in 0..stacks {
                let mut vertices = Vec::new();

                let vertex = |theta: Real, phi: Real| {
                    let dir =
                        Vector3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin());
                    Vertex::new(
                        Point3::new(dir.x * radius, dir.y * radius, dir.z * radius),
                        dir,
                    )
                };

                let t0 = i as Real / segments as Real;
                let t1 = (i + 1) as Real / segments as Real;
                let p0 = j as Real / stacks as Real;
                let p1 = (j + 1) as Real / stacks as Real;

                let theta0 = t0 * TAU;
                let theta1 = t1 * TAU;
                let phi0 = p0 * PI;
                let phi1 = p1 * PI;

                vertices.push(vertex(theta0, phi0));
                if j > 0 {
                    vertices.push(vertex(theta1, phi0));
                }
                if j < stacks - 1 {
                    vertices.push(vertex(theta1, phi1));
                }
                vertices.push(vertex(theta0, phi1));

                polygons.push(Polygon::new(vertices, metadata.clone()));
            }
        }
        CSG::from_polygons(&polygons)
    }
}

impl<S: Clone + Send + Sync + Debug> Default for CSG<S> {
    fn default() -> Self {
        Self::new()
    }
}

// Quantized endpoint key so nearly identical positions compare equal.
#[cfg(feature = "hashmap")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct EndKey(i64, i64, i64);

#[cfg(feature = "hashmap")]
fn quantize(x: Real) -> i64 {
    (x * 1e8).round() as i64
}

#[cfg(feature = "hashmap")]
fn make_key(pos: &Point3<Real>) -> EndKey {
    EndKey(quantize(pos.x), quantize(pos.y), quantize(pos.z))
}
