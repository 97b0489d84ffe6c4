//! Planes in 3D space, and the polygon splitting routine at the heart of
//! BSP construction and clipping.

use crate::float_types::{EPSILON, Real};
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

// Point/polygon classification relative to a plane. SPANNING is the
// bitwise-or of FRONT and BACK.
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane in normal/offset form: `dot(normal, p) == w` for points `p` on
/// the plane. `normal` is unit length for any valid plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

impl Plane {
    /// Plane from a unit normal and offset.
    pub const fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        Plane { normal, w }
    }

    /// Plane supporting the triangle `a`, `b`, `c`, wound counter-clockwise
    /// as seen from the front.
    ///
    /// Near-collinear points yield a degenerate plane with a zero normal;
    /// [`is_valid`](Plane::is_valid) reports it and no caller ever splits
    /// against one.
    pub fn from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Self {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < EPSILON {
            return Plane {
                normal: Vector3::zeros(),
                w: 0.0,
            };
        }
        let normal = n / len;
        Plane {
            normal,
            w: normal.dot(&a.coords),
        }
    }

    /// Whether this plane has a usable (non-degenerate) normal.
    pub fn is_valid(&self) -> bool {
        self.normal.norm_squared() > EPSILON
    }

    /// Reverse which side counts as front.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Classify a point as [`FRONT`], [`BACK`], or [`COPLANAR`] within
    /// [`EPSILON`].
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let t = self.normal.dot(&point.coords) - self.w;
        if t > EPSILON {
            FRONT
        } else if t < -EPSILON {
            BACK
        } else {
            COPLANAR
        }
    }

    /// Split `polygon` by this plane, returning
    /// `(coplanar_front, coplanar_back, front, back)`.
    ///
    /// A polygon lying in the plane goes whole into one of the coplanar
    /// buckets, chosen by comparing its own normal against ours. A polygon
    /// wholly on one side goes whole into `front` or `back`. A spanning
    /// polygon is cut: each edge crossing the plane contributes an
    /// interpolated vertex to both output loops, and loops that still have
    /// at least three vertices become new polygons carrying the parent's
    /// plane and metadata. Loops reduced below three vertices are a
    /// knife-edge graze and are dropped.
    ///
    /// A degenerate cutting plane cannot classify anything; the polygon is
    /// passed through unsplit in `coplanar_front`.
    #[allow(clippy::type_complexity)]
    pub fn split_polygon<S: Clone + Send + Sync + Debug>(
        &self,
        polygon: &Polygon<S>,
    ) -> (
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
    ) {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        if !self.is_valid() {
            coplanar_front.push(polygon.clone());
            return (coplanar_front, coplanar_back, front, back);
        }

        let mut polygon_type = COPLANAR;
        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| {
                let t = self.orient_point(&v.pos);
                polygon_type |= t;
                t
            })
            .collect();

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let mut f: Vec<Vertex> = Vec::new();
                let mut b: Vec<Vertex> = Vec::new();

                for i in 0..polygon.vertices.len() {
                    let j = (i + 1) % polygon.vertices.len();
                    let ti = types[i];
                    let tj = types[j];
                    let vi = &polygon.vertices[i];
                    let vj = &polygon.vertices[j];

                    if ti != BACK {
                        f.push(vi.clone());
                    }
                    if ti != FRONT {
                        b.push(vi.clone());
                    }

                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(&(vj.pos - vi.pos));
                        // Guaranteed non-zero for a genuine sign change, but
                        // the tolerance can disagree with the sign test.
                        if denom.abs() > EPSILON {
                            let t = (self.w - self.normal.dot(&vi.pos.coords)) / denom;
                            let v = vi.interpolate(vj, t);
                            f.push(v.clone());
                            b.push(v);
                        }
                    }
                }

                if f.len() >= 3 {
                    front.push(Polygon::with_plane(
                        f,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
                if b.len() >= 3 {
                    back.push(Polygon::with_plane(
                        b,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }
}
