//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::Real;
use nalgebra::{Point3, Vector2, Vector3, Vector4};

/// A vertex of a polygon: a position plus whatever interpolated attributes
/// the source mesh carried for it.
///
/// Every attribute is optional. An attribute produced by [`interpolate`]
/// is only present when *both* endpoints carried it, so partial attribute
/// sets never invent data.
///
/// [`interpolate`]: Vertex::interpolate
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Position in model space.
    pub pos: Point3<Real>,
    /// Vertex color (RGBA).
    pub color: Option<Vector4<Real>>,
    /// Shading normal; flipped when the winding is reversed.
    pub normal: Option<Vector3<Real>>,
    /// Tangent, with the bitangent sign in `w`.
    pub tangent: Option<Vector4<Real>>,
    /// First texture channel.
    pub uv0: Option<Vector2<Real>>,
    /// Second texture channel.
    pub uv1: Option<Vector2<Real>>,
    /// Third texture channel (4-wide, as source meshes provide it).
    pub uv2: Option<Vector4<Real>>,
    /// Fourth texture channel (4-wide).
    pub uv3: Option<Vector4<Real>>,
}

impl Vertex {
    /// Create a vertex from a position and a shading normal, with no other
    /// attributes set.
    pub const fn new(pos: Point3<Real>, normal: Vector3<Real>) -> Self {
        Vertex {
            pos,
            color: None,
            normal: Some(normal),
            tangent: None,
            uv0: None,
            uv1: None,
            uv2: None,
            uv3: None,
        }
    }

    /// Create a bare vertex carrying only a position.
    pub const fn from_position(pos: Point3<Real>) -> Self {
        Vertex {
            pos,
            color: None,
            normal: None,
            tangent: None,
            uv0: None,
            uv1: None,
            uv2: None,
            uv3: None,
        }
    }

    /// Flip the orientation-dependent attributes (normal and tangent).
    pub fn flip(&mut self) {
        if let Some(n) = self.normal.as_mut() {
            *n = -*n;
        }
        if let Some(t) = self.tangent.as_mut() {
            *t = -*t;
        }
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    ///
    /// The result carries exactly the attributes present on both endpoints;
    /// anything missing on either side is absent from the result.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        Vertex {
            pos: self.pos + (other.pos - self.pos) * t,
            color: lerp_attr(&self.color, &other.color, t),
            normal: lerp_attr(&self.normal, &other.normal, t),
            tangent: lerp_attr(&self.tangent, &other.tangent, t),
            uv0: lerp_attr(&self.uv0, &other.uv0, t),
            uv1: lerp_attr(&self.uv1, &other.uv1, t),
            uv2: lerp_attr(&self.uv2, &other.uv2, t),
            uv3: lerp_attr(&self.uv3, &other.uv3, t),
        }
    }
}

fn lerp_attr<const D: usize>(
    a: &Option<nalgebra::SVector<Real, D>>,
    b: &Option<nalgebra::SVector<Real, D>>,
    t: Real,
) -> Option<nalgebra::SVector<Real, D>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + (b - a) * t),
        _ => None,
    }
}
