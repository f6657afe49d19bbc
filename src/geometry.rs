//! 2D predicates and UV interpolation used by the plane-local clipper.

use crate::float_types::{EPSILON, Real};
use nalgebra::{Point2, Vector2};

/// Intersection of segments `(from_a, to_a)` and `(from_b, to_b)`.
///
/// The second segment is rotated into the frame of the first, which turns
/// the crossing test into a sign check on the rotated y coordinates. An
/// endpoint of B exactly on line A counts as non-crossing on one side
/// (`>= 0`), so shared endpoints do not double-count.
pub fn segment_intersects_segment(
    from_a: &Point2<Real>,
    to_a: &Point2<Real>,
    from_b: &Point2<Real>,
    to_b: &Point2<Real>,
) -> Option<Point2<Real>> {
    let b = to_a - from_a;
    let c = from_b - from_a;
    let d = to_b - from_a;

    let ab_len = b.dot(&b);
    if ab_len <= 0.0 {
        return None;
    }
    let bn = b / ab_len;
    let c = Vector2::new(c.x * bn.x + c.y * bn.y, c.y * bn.x - c.x * bn.y);
    let d = Vector2::new(d.x * bn.x + d.y * bn.y, d.y * bn.x - d.x * bn.y);

    if (c.y < 0.0 && d.y < 0.0) || (c.y >= 0.0 && d.y >= 0.0) {
        return None;
    }

    let ab_pos = d.x + (c.x - d.x) * d.y / (d.y - c.y);
    if !(0.0..=1.0).contains(&ab_pos) {
        return None;
    }

    Some(from_a + b * ab_pos)
}

/// Closest point to `p` on the segment `(a, b)`.
pub fn closest_point_to_segment(
    p: &Point2<Real>,
    a: &Point2<Real>,
    b: &Point2<Real>,
) -> Point2<Real> {
    let rel = p - a;
    let dir = b - a;
    let l2 = dir.norm_squared();
    if l2 < 1e-20 {
        return *a;
    }
    let t = dir.dot(&rel) / l2;
    if t <= 0.0 {
        *a
    } else if t >= 1.0 {
        *b
    } else {
        a + dir * t
    }
}

/// Strict sign-orientation containment test. Points on an edge are outside.
pub fn is_point_in_triangle(
    s: &Point2<Real>,
    a: &Point2<Real>,
    b: &Point2<Real>,
    c: &Point2<Real>,
) -> bool {
    let an = a - s;
    let bn = b - s;
    let cn = c - s;

    let orientation = an.perp(&bn) > 0.0;
    if (bn.perp(&cn) > 0.0) != orientation {
        return false;
    }
    (cn.perp(&an) > 0.0) == orientation
}

/// Cross product of `(a - o)` and `(b - o)`, twice the signed triangle area.
#[inline]
pub fn cross2(o: &Point2<Real>, a: &Point2<Real>, b: &Point2<Real>) -> Real {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// UV for a point `b` on the segment from `a` to `c`, by arc-length ratio.
pub fn interpolate_uv(
    vertex_a: &Point2<Real>,
    vertex_b: &Point2<Real>,
    vertex_c: &Point2<Real>,
    uv_a: &Vector2<Real>,
    uv_c: &Vector2<Real>,
) -> Vector2<Real> {
    let len_a_c = (vertex_c - vertex_a).norm();
    if len_a_c < EPSILON {
        return *uv_a;
    }
    let len_a_b = (vertex_b - vertex_a).norm();
    let t = len_a_b / len_a_c;
    uv_a.lerp(uv_c, t)
}

/// Barycentric UV for a point inside a triangle. Falls back to the
/// matching corner UV when the point sits on a vertex, and to the first
/// corner when the triangle is degenerate.
pub fn interpolate_triangle_uv(
    pos: &Point2<Real>,
    vtx: &[Point2<Real>; 3],
    uv: &[Vector2<Real>; 3],
) -> Vector2<Real> {
    for i in 0..3 {
        if (pos - vtx[i]).norm_squared() < EPSILON * EPSILON {
            return uv[i];
        }
    }

    let v0 = vtx[1] - vtx[0];
    let v1 = vtx[2] - vtx[0];
    let v2 = pos - vtx[0];

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom == 0.0 {
        return uv[0];
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    uv[0] * u + uv[1] * v + uv[2] * w
}
