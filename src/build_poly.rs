//! Plane-local working polygon accumulating clip segments.
//!
//! Each brush face that intersects some face of the other brush gets one
//! [`BuildPoly`]: the face's three corners projected into a 2D basis on
//! its own plane, plus every intersection chord contributed by opposing
//! faces. Points and edges are flat index-addressed arrays; the first
//! `base_edges` edges are always the (possibly split) original triangle
//! boundary, and only those are ever candidates for further splitting.

use crate::brush::{Brush, Face};
use crate::float_types::{EPSILON, Real};
use crate::geometry::{
    closest_point_to_segment, interpolate_triangle_uv, interpolate_uv,
    is_point_in_triangle, segment_intersects_segment,
};
use crate::plane::Plane;
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// A 2D polygon vertex with its interpolated UV.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PolyPoint {
    pub point: Point2<Real>,
    pub uv: Vector2<Real>,
}

/// An unordered pair of point indices. `outer` marks boundary edges of
/// the base triangle; chords introduced by clipping are never `outer`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PolyEdge {
    pub points: [usize; 2],
    pub outer: bool,
}

/// Orthonormal frame mapping between the face plane and its 2D chart.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlaneBasis {
    origin: Point3<Real>,
    x: Vector3<Real>,
    y: Vector3<Real>,
}

impl PlaneBasis {
    pub fn to_local(&self, p: &Point3<Real>) -> Point2<Real> {
        let rel = p - self.origin;
        Point2::new(rel.dot(&self.x), rel.dot(&self.y))
    }

    pub fn to_world(&self, p: &Point2<Real>) -> Point3<Real> {
        self.origin + self.x * p.x + self.y * p.y
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BuildPoly<M> {
    pub plane: Plane,
    pub basis: PlaneBasis,
    pub points: Vec<PolyPoint>,
    pub edges: Vec<PolyEdge>,
    /// How many leading edges belong to the base triangle boundary.
    pub base_edges: usize,
    pub smooth: bool,
    pub invert: bool,
    pub material: Option<M>,
}

impl<M: Clone> BuildPoly<M> {
    /// Sets up the working polygon for one brush face. `None` when the
    /// face is too degenerate to span a plane.
    pub fn create(brush: &Brush<M>, face_index: usize) -> Option<Self> {
        let face = &brush.faces[face_index];
        let va = &face.vertices;

        let plane = Plane::from_points(&va[0], &va[1], &va[2])?;
        let x = (va[1] - va[2]).try_normalize(EPSILON)?;
        // n x first-axis keeps the chart winding equal to the face
        // winding, which the loop walk depends on
        let y = plane.normal.cross(&x).try_normalize(EPSILON)?;
        let basis = PlaneBasis {
            origin: va[0],
            x,
            y,
        };

        let mut points = Vec::with_capacity(3);
        let mut edges = Vec::with_capacity(3);
        for i in 0..3 {
            points.push(PolyPoint {
                point: basis.to_local(&va[i]),
                uv: face.uvs[i],
            });
            edges.push(PolyEdge {
                points: [i, (i + 1) % 3],
                outer: true,
            });
        }

        Some(Self {
            plane,
            basis,
            points,
            edges,
            base_edges: 3,
            smooth: face.smooth,
            invert: face.invert,
            material: face.material.map(|idx| brush.materials[idx].clone()),
        })
    }

    /// Clips an opposing face into this polygon: the opposing triangle's
    /// crossing of this plane is reduced to a 2D segment, which is then
    /// stitched into the point/edge graph.
    pub fn clip(&mut self, face: &Face, snap: Real) {
        let mut segment: Vec<Point2<Real>> = Vec::with_capacity(3);

        for i in 0..3 {
            let p = face.vertices[i];
            if self.plane.has_point(&p, snap) {
                let pp = self.plane.project(&p);
                segment.push(self.basis.to_local(&pp));
            } else {
                let q = face.vertices[(i + 1) % 3];
                if self.plane.has_point(&q, snap) {
                    continue; // endpoint lands on the plane, added on its own turn
                }
                if self.plane.is_point_over(&p) == self.plane.is_point_over(&q) {
                    continue; // edge does not cross
                }
                if let Some(res) = self.plane.intersects_segment(&p, &q) {
                    segment.push(self.basis.to_local(&res));
                }
            }
        }

        // a single touching point carries no clipping information
        if segment.len() < 2 {
            return;
        }
        if segment[0] == segment[1] {
            return; // too small
        }

        self.clip_segment(&[segment[0], segment[1]], snap);
    }

    /// Clips a coplanar opposing face into this polygon. There is no
    /// single crossing chord in that case; every edge of the opposing
    /// triangle is stitched in on its own, so the overlap boundary ends
    /// up in the graph.
    pub fn clip_coplanar(&mut self, face: &Face, snap: Real) {
        for i in 0..3 {
            let p = self.plane.project(&face.vertices[i]);
            let q = self.plane.project(&face.vertices[(i + 1) % 3]);
            let a = self.basis.to_local(&p);
            let b = self.basis.to_local(&q);
            if a == b {
                continue;
            }
            self.clip_segment(&[a, b], snap);
        }
    }

    fn clip_segment(&mut self, segment: &[Point2<Real>; 2], snap: Real) {
        let mut inserted_points: Vec<usize> = Vec::new();
        let mut segment_idx: [Option<usize>; 2] = [None, None];

        // reuse polygon vertices that coincide with a segment endpoint
        for i in 0..self.points.len() {
            for (j, seg) in segment.iter().enumerate() {
                if (*seg - self.points[i].point).norm() < snap {
                    segment_idx[j] = Some(i);
                    inserted_points.push(i);
                    break;
                }
            }
        }

        if let (Some(a), Some(b)) = (segment_idx[0], segment_idx[1]) {
            if a == b {
                return; // segment collapsed onto one vertex
            }
            // if an edge already joins the two vertices there is nothing to add
            if self
                .edges
                .iter()
                .any(|e| e.points == [a, b] || e.points == [b, a])
            {
                return;
            }
        }

        // test the segment against the base triangle boundary, splitting
        // crossed edges
        let mut i = 0;
        while i < self.base_edges {
            let edge_points = self.edges[i].points;

            // an edge sharing a vertex with the segment is never split;
            // the shared vertex already accounts for the contact
            if segment_idx
                .iter()
                .flatten()
                .any(|&s| edge_points[0] == s || edge_points[1] == s)
            {
                i += 1;
                continue;
            }

            let ep0 = self.points[edge_points[0]].point;
            let ep1 = self.points[edge_points[1]].point;

            let mut res = None;
            let mut assign_segment_idx = None;

            // an endpoint resting on the edge splits it there
            for (j, seg) in segment.iter().enumerate() {
                let closest = closest_point_to_segment(seg, &ep0, &ep1);
                if (closest - *seg).norm() < snap {
                    res = Some(closest);
                    assign_segment_idx = Some(j);
                }
            }

            // otherwise a proper crossing does
            if res.is_none() {
                res = segment_intersects_segment(&segment[0], &segment[1], &ep0, &ep1);
            }

            let Some(res) = res else {
                i += 1;
                continue;
            };

            // a contact landing within snap of an existing vertex is
            // reused rather than inserted again; edges meeting at that
            // vertex need no split
            if let Some(existing) = self
                .points
                .iter()
                .position(|p| (p.point - res).norm() < snap)
            {
                if let Some(j) = assign_segment_idx {
                    segment_idx[j] = Some(existing);
                }
                if !inserted_points.contains(&existing) {
                    inserted_points.push(existing);
                }
                i += 1;
                continue;
            }

            let uv = interpolate_uv(
                &ep0,
                &res,
                &ep1,
                &self.points[edge_points[0]].uv,
                &self.points[edge_points[1]].uv,
            );
            let new_index = self.points.len();
            self.points.push(PolyPoint { point: res, uv });

            // split the edge in two
            let outer = self.edges[i].outer;
            self.edges[i].points[0] = new_index;
            self.edges.insert(
                i,
                PolyEdge {
                    points: [edge_points[0], new_index],
                    outer,
                },
            );
            self.base_edges += 1;

            if let Some(j) = assign_segment_idx {
                segment_idx[j] = Some(new_index);
            }
            inserted_points.push(new_index);

            // a straight segment meets a straight edge once; both halves
            // are settled for this pass
            i += 2;
        }

        if inserted_points.len() >= 2 {
            self.push_chord(inserted_points[0], inserted_points[1]);
            return;
        }

        // an endpoint may still fall strictly inside the base triangle
        for (j, seg) in segment.iter().enumerate() {
            if segment_idx[j].is_some() {
                continue;
            }
            if is_point_in_triangle(
                seg,
                &self.points[0].point,
                &self.points[1].point,
                &self.points[2].point,
            ) {
                let vtx = [
                    self.points[0].point,
                    self.points[1].point,
                    self.points[2].point,
                ];
                let uvs = [self.points[0].uv, self.points[1].uv, self.points[2].uv];
                let uv = interpolate_triangle_uv(seg, &vtx, &uvs);
                let idx = self.points.len();
                self.points.push(PolyPoint { point: *seg, uv });
                inserted_points.push(idx);
            }
        }

        if inserted_points.len() >= 2 {
            self.push_chord(inserted_points[0], inserted_points[1]);
        }
    }

    /// Adds an interior chord unless the two vertices are already joined.
    fn push_chord(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        if self
            .edges
            .iter()
            .any(|e| e.points == [a, b] || e.points == [b, a])
        {
            return;
        }
        self.edges.push(PolyEdge {
            points: [a, b],
            outer: false,
        });
    }
}
