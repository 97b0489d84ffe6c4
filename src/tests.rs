use crate::csg::CSG;
use crate::errors::CsgError;
use crate::float_types::{EPSILON, Real};
use crate::mesh::{Mesh, Topology};
use crate::plane::Plane;
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::{Point3, Vector2, Vector3, Vector4};

/// Signed volume via the divergence theorem over the tessellated boundary.
fn volume(csg: &CSG<()>) -> Real {
    csg.tessellate()
        .polygons
        .iter()
        .map(|p| {
            let a = p.vertices[0].pos.coords;
            let b = p.vertices[1].pos.coords;
            let c = p.vertices[2].pos.coords;
            a.dot(&b.cross(&c)) / 6.0
        })
        .sum()
}

fn polygon_area(polygon: &Polygon<()>) -> Real {
    polygon
        .tessellate()
        .iter()
        .map(|t| {
            let ab = t[1].pos - t[0].pos;
            let ac = t[2].pos - t[0].pos;
            ab.cross(&ac).norm() * 0.5
        })
        .sum()
}

fn square_in_xz() -> Polygon<()> {
    // A 2x2 square in the y = 0 plane, normal +y, straddling z = 0.
    let n = Vector3::y();
    Polygon::new(
        vec![
            Vertex::new(Point3::new(-1.0, 0.0, -1.0), n),
            Vertex::new(Point3::new(-1.0, 0.0, 1.0), n),
            Vertex::new(Point3::new(1.0, 0.0, 1.0), n),
            Vertex::new(Point3::new(1.0, 0.0, -1.0), n),
        ],
        None,
    )
}

// --- vertex ---

#[test]
fn interpolate_lerps_position_and_shared_attributes() {
    let mut a = Vertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::z());
    let mut b = Vertex::new(Point3::new(2.0, 0.0, 0.0), Vector3::z());
    a.uv0 = Some(Vector2::new(0.0, 0.0));
    b.uv0 = Some(Vector2::new(1.0, 1.0));
    a.color = Some(Vector4::new(1.0, 0.0, 0.0, 1.0));
    // b has no color, so the result must not invent one.

    let mid = a.interpolate(&b, 0.5);
    assert_relative_eq!(mid.pos.x, 1.0, epsilon = 1e-12);
    let uv = mid.uv0.unwrap();
    assert_relative_eq!(uv.x, 0.5, epsilon = 1e-12);
    assert_relative_eq!(uv.y, 0.5, epsilon = 1e-12);
    assert!(mid.color.is_none());
    assert!(mid.normal.is_some());
}

#[test]
fn flip_negates_normal_and_tangent_only_when_present() {
    let mut v = Vertex::from_position(Point3::new(1.0, 2.0, 3.0));
    v.flip();
    assert!(v.normal.is_none());

    let mut v = Vertex::new(Point3::origin(), Vector3::z());
    v.tangent = Some(Vector4::new(1.0, 0.0, 0.0, 1.0));
    v.flip();
    assert_relative_eq!(v.normal.unwrap().z, -1.0, epsilon = 1e-12);
    assert_relative_eq!(v.tangent.unwrap().x, -1.0, epsilon = 1e-12);
}

// --- plane ---

#[test]
fn orient_point_uses_epsilon_band() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, 1.0)), crate::plane::FRONT);
    assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, -1.0)), crate::plane::BACK);
    assert_eq!(
        plane.orient_point(&Point3::new(0.0, 0.0, EPSILON * 0.5)),
        crate::plane::COPLANAR
    );
}

#[test]
fn collinear_points_give_invalid_plane() {
    let plane = Plane::from_points(
        &Point3::new(0.0, 0.0, 0.0),
        &Point3::new(1.0, 0.0, 0.0),
        &Point3::new(2.0, 0.0, 0.0),
    );
    assert!(!plane.is_valid());
}

#[test]
fn split_keeps_one_sided_polygon_whole() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    let n = Vector3::z();
    let poly: Polygon<()> = Polygon::new(
        vec![
            Vertex::new(Point3::new(0.0, 0.0, 1.0), n),
            Vertex::new(Point3::new(1.0, 0.0, 1.0), n),
            Vertex::new(Point3::new(1.0, 1.0, 1.0), n),
        ],
        None,
    );

    let (cf, cb, f, b) = plane.split_polygon(&poly);
    assert!(cf.is_empty() && cb.is_empty() && b.is_empty());
    assert_eq!(f.len(), 1);
    assert_eq!(f[0].vertices.len(), 3);
}

#[test]
fn split_routes_coplanar_by_normal_agreement() {
    let plane = Plane::from_normal(Vector3::y(), 0.0);
    let aligned = square_in_xz();
    let mut opposed = square_in_xz();
    opposed.flip();

    let (cf, cb, f, b) = plane.split_polygon(&aligned);
    assert_eq!((cf.len(), cb.len(), f.len(), b.len()), (1, 0, 0, 0));

    let (cf, cb, f, b) = plane.split_polygon(&opposed);
    assert_eq!((cf.len(), cb.len(), f.len(), b.len()), (0, 1, 0, 0));
}

#[test]
fn split_spanning_polygon_preserves_area_and_seams_on_plane() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    let poly = square_in_xz();

    let (cf, cb, f, b) = plane.split_polygon(&poly);
    assert!(cf.is_empty() && cb.is_empty());
    assert_eq!(f.len(), 1);
    assert_eq!(b.len(), 1);

    let total = polygon_area(&f[0]) + polygon_area(&b[0]);
    assert_relative_eq!(total, polygon_area(&poly), epsilon = 1e-9);

    // Every fragment vertex is on the correct side or exactly on the cut.
    for v in &f[0].vertices {
        assert!(v.pos.z >= -EPSILON);
    }
    for v in &b[0].vertices {
        assert!(v.pos.z <= EPSILON);
    }

    // Fragments inherit the parent plane rather than recomputing it.
    assert_relative_eq!(f[0].plane.normal.y, 1.0, epsilon = 1e-12);
    assert_relative_eq!(b[0].plane.normal.y, 1.0, epsilon = 1e-12);
}

// --- polygon ---

#[test]
fn polygon_flip_reverses_winding_and_plane() {
    let mut poly = square_in_xz();
    let first = poly.vertices[0].pos;
    poly.flip();
    assert_relative_eq!(poly.plane.normal.y, -1.0, epsilon = 1e-12);
    assert_relative_eq!(poly.vertices.last().unwrap().pos.x, first.x, epsilon = 1e-12);
    assert_relative_eq!(
        poly.vertices[0].normal.unwrap().y,
        -1.0,
        epsilon = 1e-12
    );
}

#[test]
fn tessellate_fans_from_first_vertex() {
    let poly = square_in_xz();
    let tris = poly.tessellate();
    assert_eq!(tris.len(), 2);
    for tri in &tris {
        assert_relative_eq!(tri[0].pos.x, poly.vertices[0].pos.x, epsilon = 1e-12);
        assert_relative_eq!(tri[0].pos.z, poly.vertices[0].pos.z, epsilon = 1e-12);
    }
}

// --- bsp ---

#[test]
fn node_invert_is_an_involution() {
    let cube: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    let mut node = crate::bsp::Node::new(&cube.polygons);
    let before = node.all_polygons();

    node.invert();
    node.invert();
    let after = node.all_polygons();

    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after.iter()) {
        assert_relative_eq!(a.plane.normal, b.plane.normal, epsilon = 1e-12);
        for (va, vb) in a.vertices.iter().zip(b.vertices.iter()) {
            assert_relative_eq!(va.pos, vb.pos, epsilon = 1e-12);
        }
    }
}

#[test]
fn degenerate_polygons_are_absorbed_without_recursing() {
    // All vertices collinear: the adopted plane is invalid, so the node
    // keeps the polygon instead of trying to split with garbage.
    let n = Vector3::z();
    let degenerate: Polygon<()> = Polygon::new(
        vec![
            Vertex::new(Point3::new(0.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(2.0, 0.0, 0.0), n),
        ],
        None,
    );

    let node = crate::bsp::Node::new(&[degenerate]);
    assert_eq!(node.all_polygons().len(), 1);
    assert!(node.front.is_none());
    assert!(node.back.is_none());
}

#[test]
fn build_absorbs_input_that_will_not_split() {
    // A polygon whose stored plane is offset from its vertices: the node
    // adopts that plane as its splitter, every vertex classifies FRONT,
    // and nothing lands coplanar. Recursing would hand the same list to a
    // fresh child forever, so the node must keep the polygon itself.
    let n = Vector3::z();
    let offset_plane = Plane::from_normal(n, 0.0);
    let poly: Polygon<()> = Polygon::with_plane(
        vec![
            Vertex::new(Point3::new(0.0, 0.0, 1.0), n),
            Vertex::new(Point3::new(1.0, 0.0, 1.0), n),
            Vertex::new(Point3::new(1.0, 1.0, 1.0), n),
        ],
        offset_plane,
        None,
    );

    let node = crate::bsp::Node::new(&[poly]);
    assert_eq!(node.polygons.len(), 1);
    assert!(node.front.is_none());
    assert!(node.back.is_none());
}

#[test]
fn clip_discards_polygons_inside_the_solid() {
    let cube: CSG<()> = CSG::cube(2.0, 2.0, 2.0, None);
    let node = crate::bsp::Node::new(&cube.polygons);

    let n = Vector3::z();
    let inside: Polygon<()> = Polygon::new(
        vec![
            Vertex::new(Point3::new(0.5, 0.5, 1.0), n),
            Vertex::new(Point3::new(1.5, 0.5, 1.0), n),
            Vertex::new(Point3::new(1.5, 1.5, 1.0), n),
        ],
        None,
    );
    let outside: Polygon<()> = Polygon::new(
        vec![
            Vertex::new(Point3::new(5.0, 5.0, 5.0), n),
            Vertex::new(Point3::new(6.0, 5.0, 5.0), n),
            Vertex::new(Point3::new(6.0, 6.0, 5.0), n),
        ],
        None,
    );

    assert!(node.clip_polygons(&[inside]).is_empty());
    assert_eq!(node.clip_polygons(&[outside]).len(), 1);
}

// --- booleans ---

#[test]
fn union_with_self_is_identity() {
    let cube: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    let out = cube.union(&cube);

    assert_relative_eq!(volume(&out), 1.0, epsilon = 1e-9);
    let aabb = out.bounding_box();
    assert_relative_eq!(aabb.mins.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(aabb.maxs.z, 1.0, epsilon = 1e-9);
    #[cfg(feature = "hashmap")]
    assert!(out.is_manifold());
}

#[test]
fn overlapping_cubes_have_expected_volumes() {
    let a: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    let b = a.translate(0.5, 0.5, 0.5);

    assert_relative_eq!(volume(&a.intersection(&b)), 0.125, epsilon = 1e-9);
    assert_relative_eq!(volume(&a.union(&b)), 1.875, epsilon = 1e-9);
    assert_relative_eq!(volume(&a.difference(&b)), 0.875, epsilon = 1e-9);
    assert_relative_eq!(volume(&a.xor(&b)), 1.75, epsilon = 1e-9);
}

#[test]
fn disjoint_cubes_never_split_each_other() {
    let a: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    let b = a.translate(2.0, 0.0, 0.0);

    let merged = a.union(&b);
    assert_eq!(merged.polygons.len(), 12);
    assert_relative_eq!(volume(&merged), 2.0, epsilon = 1e-9);

    assert_abs_diff_eq!(volume(&a.intersection(&b)), 0.0, epsilon = 1e-9);
    assert_relative_eq!(volume(&a.difference(&b)), 1.0, epsilon = 1e-9);
}

#[test]
fn difference_and_intersection_partition_the_union() {
    let a: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    let b = a.translate(0.25, 0.25, 0.25);

    let parts = volume(&a.difference(&b)) + volume(&b.difference(&a)) + volume(&a.intersection(&b));
    assert_relative_eq!(parts, volume(&a.union(&b)), epsilon = 1e-9);
}

#[test]
fn inverse_negates_volume() {
    let cube: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    assert_relative_eq!(volume(&cube.inverse()), -1.0, epsilon = 1e-9);
}

#[test]
fn cube_sphere_difference_removes_a_bite() {
    let cube: CSG<()> = CSG::cube(2.0, 2.0, 2.0, None);
    let sphere: CSG<()> = CSG::sphere(1.0, 12, 6, None).translate(2.0, 1.0, 1.0);

    let out = cube.difference(&sphere);
    assert!(volume(&out) < 8.0);
    assert!(volume(&out) > 8.0 - (4.0 / 3.0) * crate::float_types::PI);
}

// --- transforms ---

#[test]
fn rotate_moves_normals_and_planes_together() {
    let poly = {
        let n = Vector3::z();
        Polygon::new(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0), n),
                Vertex::new(Point3::new(1.0, 0.0, 0.0), n),
                Vertex::new(Point3::new(1.0, 1.0, 0.0), n),
                Vertex::new(Point3::new(0.0, 1.0, 0.0), n),
            ],
            None,
        )
    };
    let csg: CSG<()> = CSG::from_polygons(&[poly]);

    let rotated = csg.rotate(90.0, 0.0, 0.0);
    let poly = &rotated.polygons[0];
    assert_relative_eq!(poly.plane.normal.y, -1.0, epsilon = 1e-9);
    assert_relative_eq!(poly.vertices[0].normal.unwrap().y, -1.0, epsilon = 1e-9);
}

#[test]
fn rotation_and_translation_preserve_volume() {
    let cube: CSG<()> = CSG::cube(1.0, 2.0, 3.0, None);
    let moved = cube.rotate(30.0, 45.0, 60.0).translate(-5.0, 2.0, 0.5);
    assert_relative_eq!(volume(&moved), 6.0, epsilon = 1e-9);
}

#[test]
fn singular_scale_is_rejected() {
    let cube: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    assert!(matches!(
        cube.scale(1.0, 0.0, 1.0),
        Err(CsgError::SingularTransform { .. })
    ));
    assert_relative_eq!(
        volume(&cube.scale(2.0, 1.0, 1.0).unwrap()),
        2.0,
        epsilon = 1e-9
    );
}

#[test]
fn center_moves_bounding_box_to_origin() {
    let cube: CSG<()> = CSG::cube(2.0, 4.0, 6.0, None);
    let centered = cube.center();
    let aabb = centered.bounding_box();
    assert_relative_eq!(aabb.mins.y, -2.0, epsilon = 1e-9);
    assert_relative_eq!(aabb.maxs.y, 2.0, epsilon = 1e-9);
}

// --- mesh adapter ---

#[test]
fn quad_mesh_round_trips_through_polygons() {
    let n = Vector3::z();
    let mesh = Mesh::new(
        vec![
            Vertex::new(Point3::new(0.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(1.0, 1.0, 0.0), n),
            Vertex::new(Point3::new(0.0, 1.0, 0.0), n),
        ],
        vec![0, 1, 2, 3],
        Topology::Quads,
    );

    let polygons = mesh.to_polygons::<()>(None).unwrap();
    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].vertices.len(), 4);
    assert_relative_eq!(polygons[0].plane.normal.z, 1.0, epsilon = 1e-12);

    let out = Mesh::from_polygons(&polygons);
    assert!(matches!(out.topology, Topology::Triangles));
    assert_eq!(out.indices.len(), 6);
    assert_eq!(out.vertices.len(), 6);
}

#[test]
fn ragged_index_buffer_is_rejected() {
    let n = Vector3::z();
    let mesh = Mesh::new(
        vec![
            Vertex::new(Point3::new(0.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(1.0, 1.0, 0.0), n),
        ],
        vec![0, 1],
        Topology::Triangles,
    );
    assert!(matches!(
        mesh.to_polygons::<()>(None),
        Err(CsgError::RaggedIndexBuffer { len: 2, stride: 3 })
    ));
}

#[test]
fn out_of_range_index_is_rejected() {
    let n = Vector3::z();
    let mesh = Mesh::new(
        vec![
            Vertex::new(Point3::new(0.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), n),
            Vertex::new(Point3::new(1.0, 1.0, 0.0), n),
        ],
        vec![0, 1, 7],
        Topology::Triangles,
    );
    assert!(matches!(
        mesh.to_polygons::<()>(None),
        Err(CsgError::IndexOutOfRange { index: 7, len: 3 })
    ));
}

#[test]
fn mesh_boolean_end_to_end() {
    let a: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    let b = a.translate(0.5, 0.5, 0.5);

    let mesh_a = a.to_mesh();
    let mesh_b = b.to_mesh();

    let a2: CSG<()> = CSG::from_mesh(&mesh_a, None).unwrap();
    let b2: CSG<()> = CSG::from_mesh(&mesh_b, None).unwrap();

    assert_relative_eq!(volume(&a2.intersection(&b2)), 0.125, epsilon = 1e-9);
}

// --- parry interop ---

#[test]
fn mass_properties_of_unit_cube() {
    let cube: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    let (mass, com, _frame) = cube.mass_properties(1.0).unwrap();
    assert_relative_eq!(mass, 1.0, epsilon = 1e-6);
    assert_relative_eq!(com.x, 0.5, epsilon = 1e-6);
    assert_relative_eq!(com.y, 0.5, epsilon = 1e-6);
    assert_relative_eq!(com.z, 0.5, epsilon = 1e-6);
}

#[test]
fn empty_solid_has_no_trimesh() {
    let empty: CSG<()> = CSG::new();
    assert!(matches!(empty.to_trimesh(), Err(CsgError::EmptyMesh)));
}

#[cfg(feature = "hashmap")]
#[test]
fn cube_is_manifold_and_open_surface_is_not() {
    let cube: CSG<()> = CSG::cube(1.0, 1.0, 1.0, None);
    assert!(cube.is_manifold());

    let open: CSG<()> = CSG::from_polygons(&[square_in_xz()]);
    assert!(!open.is_manifold());
}

#[test]
fn coarse_sphere_volume_approaches_analytic() {
    let sphere: CSG<()> = CSG::sphere(1.0, 24, 12, None);
    let analytic = (4.0 / 3.0) * crate::float_types::PI;
    let v = volume(&sphere);
    assert!(v > analytic * 0.9 && v < analytic);
}
