//! Supporting plane of a brush face, in `normal · p = w` form.

use crate::float_types::{EPSILON, Real};
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vector3<Real>,
    /// Signed offset along the normal.
    pub w: Real,
}

impl Plane {
    /// Plane through three points with counter-clockwise winding.
    /// `None` when the points are collinear.
    pub fn from_points(
        a: &Point3<Real>,
        b: &Point3<Real>,
        c: &Point3<Real>,
    ) -> Option<Self> {
        let normal = (b - a).cross(&(c - a)).try_normalize(EPSILON)?;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    #[inline]
    pub fn signed_distance(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&p.coords) - self.w
    }

    /// True when `p` lies within `tolerance` of the plane.
    #[inline]
    pub fn has_point(&self, p: &Point3<Real>, tolerance: Real) -> bool {
        self.signed_distance(p).abs() <= tolerance
    }

    /// True when `p` is strictly on the side the normal points toward.
    #[inline]
    pub fn is_point_over(&self, p: &Point3<Real>) -> bool {
        self.signed_distance(p) > 0.0
    }

    /// Orthogonal projection of `p` onto the plane.
    #[inline]
    pub fn project(&self, p: &Point3<Real>) -> Point3<Real> {
        p - self.normal * self.signed_distance(p)
    }

    /// Where the segment `begin..end` crosses the plane, if the crossing
    /// parameter falls within the segment (with a little slack at the ends).
    pub fn intersects_segment(
        &self,
        begin: &Point3<Real>,
        end: &Point3<Real>,
    ) -> Option<Point3<Real>> {
        let dir = end - begin;
        let den = self.normal.dot(&dir);
        if den.abs() < EPSILON {
            return None;
        }
        let t = (self.w - self.normal.dot(&begin.coords)) / den;
        if t < -EPSILON || t > 1.0 + EPSILON {
            return None;
        }
        Some(begin + dir * t)
    }
}
