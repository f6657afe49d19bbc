//! Test support library
//! Provides various helper functions & utilities for tests.

use brushcsg::{Brush, float_types::Real};
use nalgebra::{Point3, Vector3};

/// Axis-aligned unit cube with its minimum corner at `origin`, wound
/// counter-clockwise when viewed from outside.
pub fn unit_cube(origin: Vector3<Real>) -> Brush<&'static str> {
    cube(origin, Vector3::new(1.0, 1.0, 1.0), None)
}

/// Axis-aligned box at `origin` with the given size, optionally tagged
/// with one material for every face.
pub fn cube(
    origin: Vector3<Real>,
    size: Vector3<Real>,
    material: Option<&'static str>,
) -> Brush<&'static str> {
    let p = |x: Real, y: Real, z: Real| {
        Point3::new(
            origin.x + x * size.x,
            origin.y + y * size.y,
            origin.z + z * size.z,
        )
    };

    // two triangles per side, outward normals
    let soup = [
        // bottom (-z)
        p(0., 0., 0.),
        p(0., 1., 0.),
        p(1., 1., 0.),
        p(0., 0., 0.),
        p(1., 1., 0.),
        p(1., 0., 0.),
        // top (+z)
        p(0., 0., 1.),
        p(1., 0., 1.),
        p(1., 1., 1.),
        p(0., 0., 1.),
        p(1., 1., 1.),
        p(0., 1., 1.),
        // front (-y)
        p(0., 0., 0.),
        p(1., 0., 0.),
        p(1., 0., 1.),
        p(0., 0., 0.),
        p(1., 0., 1.),
        p(0., 0., 1.),
        // back (+y)
        p(0., 1., 0.),
        p(0., 1., 1.),
        p(1., 1., 1.),
        p(0., 1., 0.),
        p(1., 1., 1.),
        p(1., 1., 0.),
        // left (-x)
        p(0., 0., 0.),
        p(0., 0., 1.),
        p(0., 1., 1.),
        p(0., 0., 0.),
        p(0., 1., 1.),
        p(0., 1., 0.),
        // right (+x)
        p(1., 0., 0.),
        p(1., 1., 0.),
        p(1., 1., 1.),
        p(1., 0., 0.),
        p(1., 1., 1.),
        p(1., 0., 1.),
    ];

    let materials = [material; 12];
    Brush::from_faces(&soup, &[], &[], &materials, &[]).expect("valid cube soup")
}

/// Signed volume of the brush about `origin`, one sixth of the summed
/// triple products. Positive for outward counter-clockwise winding, and
/// independent of `origin` exactly when the surface is closed.
pub fn signed_volume_about(brush: &Brush<&'static str>, origin: Point3<Real>) -> Real {
    let mut six_v = 0.0;
    for face in &brush.faces {
        let a = face.vertices[0] - origin;
        let b = face.vertices[1] - origin;
        let c = face.vertices[2] - origin;
        six_v += a.dot(&b.cross(&c));
    }
    six_v / 6.0
}

/// Signed volume about the origin.
pub fn signed_volume(brush: &Brush<&'static str>) -> Real {
    signed_volume_about(brush, Point3::origin())
}

/// Asserts closedness by checking that the signed volume does not depend
/// on the reference point, then returns it.
pub fn closed_volume(brush: &Brush<&'static str>) -> Real {
    let v0 = signed_volume(brush);
    let v1 = signed_volume_about(brush, Point3::new(13.0, -7.5, 4.25));
    assert!(
        (v0 - v1).abs() < 1e-6,
        "open surface: volume {v0} about the origin, {v1} elsewhere"
    );
    v0
}

/// Returns the bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]`
/// over all face vertices.
pub fn bounding_box(brush: &Brush<&'static str>) -> [Real; 6] {
    let mut bb = [
        Real::MAX,
        Real::MAX,
        Real::MAX,
        Real::MIN,
        Real::MIN,
        Real::MIN,
    ];
    for face in &brush.faces {
        for v in &face.vertices {
            for axis in 0..3 {
                bb[axis] = bb[axis].min(v[axis]);
                bb[axis + 3] = bb[axis + 3].max(v[axis]);
            }
        }
    }
    bb
}

pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}
