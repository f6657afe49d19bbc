//! Triangle/triangle relation test gating the clipping pass: a separating
//! axis test preceded by cheap rejections for degenerate and
//! vertex-sharing pairs, plus detection of coplanar pairs, which clip by
//! a different rule.

use crate::brush::Face;
use crate::float_types::{EPSILON, Real};
use crate::plane::Plane;
use nalgebra::{Point3, Vector3};

/// How two faces from opposite brushes relate geometrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FaceRelation {
    /// No clipping needed: separated, parallel, merely touching, or
    /// near-duplicate neighbors.
    Disjoint,
    /// The triangles genuinely cross each other's planes.
    Crossing,
    /// Both triangles lie in the same plane; overlap is resolved by
    /// clipping their edges in 2D.
    Coplanar,
}

fn project(axis: &Vector3<Real>, vertices: &[Point3<Real>; 3]) -> (Real, Real) {
    let mut min = axis.dot(&vertices[0].coords);
    let mut max = min;
    for v in &vertices[1..] {
        let d = axis.dot(&v.coords);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

fn separated_on(axis: &Vector3<Real>, a: &[Point3<Real>; 3], b: &[Point3<Real>; 3]) -> bool {
    let (min_a, max_a) = project(axis, a);
    let (mut min_b, mut max_b) = project(axis, b);

    // widen B by half of A's footprint so grazing contact does not count
    // as an overlap
    let half_a = (max_a - min_a) * 0.5;
    min_b -= half_a;
    max_b += half_a;

    let center_a = (min_a + max_a) * 0.5;
    let dmin = min_b - center_a;
    let dmax = max_b - center_a;

    dmin > EPSILON || dmax < -EPSILON
}

/// (over, under, on) counts of `vertices` against `plane`.
fn side_counts(plane: &Plane, vertices: &[Point3<Real>; 3]) -> (u32, u32, u32) {
    let mut over = 0;
    let mut under = 0;
    let mut on = 0;
    for v in vertices {
        if plane.has_point(v, EPSILON) {
            on += 1;
        } else if plane.is_point_over(v) {
            over += 1;
        } else {
            under += 1;
        }
    }
    (over, under, on)
}

/// Classifies a face pair for the clipping pass. Pairs that merely share
/// vertices or touch along an edge come back [`FaceRelation::Disjoint`].
pub(crate) fn classify_faces(a: &Face, b: &Face, vertex_snap: Real) -> FaceRelation {
    // degenerate triangles clip nothing
    for tri in [&a.vertices, &b.vertices] {
        if tri[0] == tri[1] || tri[0] == tri[2] || tri[1] == tri[2] {
            return FaceRelation::Disjoint;
        }
    }

    // faces welded together at two or more corners are neighbors, not
    // intersectors
    let mut shared = 0;
    for va in &a.vertices {
        for vb in &b.vertices {
            if (va - vb).norm() < vertex_snap {
                shared += 1;
                break;
            }
        }
    }
    if shared >= 2 {
        return FaceRelation::Disjoint;
    }

    let Some(plane_a) = Plane::from_points(&a.vertices[0], &a.vertices[1], &a.vertices[2])
    else {
        return FaceRelation::Disjoint;
    };
    let Some(plane_b) = Plane::from_points(&b.vertices[0], &b.vertices[1], &b.vertices[2])
    else {
        return FaceRelation::Disjoint;
    };

    let (over_b, under_b, on_b) = side_counts(&plane_a, &b.vertices);
    let (over_a, under_a, on_a) = side_counts(&plane_b, &a.vertices);

    if on_b == 3 && on_a == 3 {
        return FaceRelation::Coplanar;
    }
    // something needs to be under AND over both planes
    if over_b == 0 || under_b == 0 || over_a == 0 || under_a == 0 {
        return FaceRelation::Disjoint;
    }

    // separating axis test over the nine edge cross products
    for i in 0..3 {
        let ea = a.vertices[(i + 1) % 3] - a.vertices[i];
        let Some(ea) = ea.try_normalize(EPSILON) else {
            continue;
        };
        for j in 0..3 {
            let eb = b.vertices[(j + 1) % 3] - b.vertices[j];
            let Some(eb) = eb.try_normalize(EPSILON) else {
                continue;
            };
            let Some(axis) = ea.cross(&eb).try_normalize(EPSILON) else {
                continue;
            };
            if separated_on(&axis, &a.vertices, &b.vertices) {
                return FaceRelation::Disjoint;
            }
        }
    }

    FaceRelation::Crossing
}
