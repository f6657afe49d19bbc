//! Welding accumulator for the merged output mesh, and the inside/outside
//! classification pass that drives the boolean selection.

use crate::bvh::FaceBvh;
use crate::float_types::{EPSILON, Real};
use crate::float_types::parry3d::bounding_volume::{Aabb, BoundingVolume};
use crate::float_types::parry3d::query::{Ray, RayCast};
use crate::float_types::parry3d::shape::Triangle;
use crate::ops::MergeOptions;
use crate::plane::Plane;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector2, Vector3};

/// Quantized grid cell for vertex welding. The fixed sub-cell offset
/// breaks the exact-boundary ties that axis-aligned geometry would
/// otherwise hit constantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    x: i64,
    y: i64,
    z: i64,
}

impl VertexKey {
    fn quantize(p: &Point3<Real>, snap: Real) -> Self {
        let snap = snap as f64;
        Self {
            x: ((p.x as f64 + snap * 0.31234) / snap) as i64,
            y: ((p.y as f64 + snap * 0.31234) / snap) as i64,
            z: ((p.z as f64 + snap * 0.31234) / snap) as i64,
        }
    }
}

/// A triangle over welded point indices, tagged with its origin brush and
/// (after [`MeshMerge::mark_inside_faces`]) its containment state.
#[derive(Debug, Clone)]
pub(crate) struct MergedFace {
    pub points: [usize; 3],
    pub uvs: [Vector2<Real>; 3],
    pub smooth: bool,
    pub invert: bool,
    pub material: Option<usize>,
    pub from_b: bool,
    pub inside: bool,
}

/// Accumulates welded triangles from both brushes during one merge call.
#[derive(Debug)]
pub(crate) struct MeshMerge<M> {
    pub points: Vec<Point3<Real>>,
    pub faces: Vec<MergedFace>,
    /// Output material palette, first-seen order across both brushes.
    pub materials: Vec<M>,
    snap_cache: HashMap<VertexKey, usize>,
    vertex_snap: Real,
}

impl<M: Clone + PartialEq> MeshMerge<M> {
    pub fn new(vertex_snap: Real) -> Self {
        Self {
            points: Vec::new(),
            faces: Vec::new(),
            materials: Vec::new(),
            snap_cache: HashMap::new(),
            vertex_snap,
        }
    }

    /// Welds the three corners into the point cloud and appends the face.
    /// A triangle that collapses under welding is dropped.
    pub fn add_face(
        &mut self,
        vertices: &[Point3<Real>; 3],
        uvs: &[Vector2<Real>; 3],
        smooth: bool,
        invert: bool,
        material: Option<M>,
        from_b: bool,
    ) {
        let mut indices = [0usize; 3];
        for i in 0..3 {
            let key = VertexKey::quantize(&vertices[i], self.vertex_snap);
            indices[i] = match self.snap_cache.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = self.points.len();
                    self.points.push(vertices[i]);
                    self.snap_cache.insert(key, idx);
                    idx
                },
            };
        }

        if indices[0] == indices[1] || indices[0] == indices[2] || indices[1] == indices[2] {
            return; // welded into a degenerate
        }

        let material = material.map(|mat| {
            match self.materials.iter().position(|m| *m == mat) {
                Some(idx) => idx,
                None => {
                    self.materials.push(mat);
                    self.materials.len() - 1
                },
            }
        });

        self.faces.push(MergedFace {
            points: indices,
            uvs: *uvs,
            smooth,
            invert,
            material,
            from_b,
            inside: false,
        });
    }

    fn face_aabb(&self, face: &MergedFace) -> Aabb {
        let a = &self.points[face.points[0]];
        let b = &self.points[face.points[1]];
        let c = &self.points[face.points[2]];
        Aabb::new(a.inf(b).inf(c), a.sup(b).sup(c))
    }

    /// Classifies every face that can possibly be enclosed by the other
    /// brush: a ray from the face centroid along its normal, far past the
    /// whole point cloud, crossing the rest of the mesh an odd number of
    /// times means the face sits inside the other operand's volume.
    ///
    /// A face lying in the same plane as another, facing the same way and
    /// covering the centroid, is overlap rather than a crossing. It
    /// toggles the parity once, and only for faces of brush A, so exactly
    /// one copy of a doubled surface survives selection.
    pub fn mark_inside_faces(&mut self, options: &MergeOptions) {
        if self.faces.is_empty() {
            return;
        }

        let mut cloud = Aabb::new(self.points[0], self.points[0]);
        for p in &self.points[1..] {
            cloud.mins = cloud.mins.inf(p);
            cloud.maxs = cloud.maxs.sup(p);
        }
        let max_distance = cloud.extents().norm() * 1.2;

        let mut leaf_aabbs = Vec::with_capacity(self.faces.len());
        let mut aabb_a: Option<Aabb> = None;
        let mut aabb_b: Option<Aabb> = None;
        for face in &self.faces {
            let aabb = self.face_aabb(face);
            leaf_aabbs.push(aabb);
            let side = if face.from_b { &mut aabb_b } else { &mut aabb_a };
            match side {
                Some(s) => s.merge(&aabb),
                None => *side = Some(aabb),
            }
        }

        // faces can only be inside where the two brushes overlap at all
        let (Some(aabb_a), Some(aabb_b)) = (aabb_a, aabb_b) else {
            return;
        };
        let Some(intersection) = aabb_a.intersection(&aabb_b) else {
            return;
        };
        if intersection.extents() == Vector3::zeros() {
            return;
        }
        let intersection =
            intersection.loosened(intersection.extents().max() * options.intersection_grow);

        let bvh = FaceBvh::build(&leaf_aabbs);

        for i in 0..self.faces.len() {
            if !intersection.intersects(&leaf_aabbs[i]) {
                continue;
            }

            let face_points = self.faces[i].points;
            let from_b = self.faces[i].from_b;
            let a = self.points[face_points[0]];
            let b = self.points[face_points[1]];
            let c = self.points[face_points[2]];

            let Some(plane) = Plane::from_points(&a, &b, &c) else {
                continue;
            };

            let center = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            // the jitter lowers the odds of grazing an edge or vertex
            // exactly
            let target = center + plane.normal * max_distance + options.ray_jitter;
            let ray = Ray::new(center, target - center);

            let mut crossings = 0usize;
            let mut covered = false;
            bvh.for_each_segment_candidate(&center, &target, |f| {
                if f as usize == i {
                    return;
                }
                let other = &self.faces[f as usize];
                let tri = Triangle::new(
                    self.points[other.points[0]],
                    self.points[other.points[1]],
                    self.points[other.points[2]],
                );

                if let Some(other_plane) = Plane::from_points(&tri.a, &tri.b, &tri.c) {
                    if other_plane.normal.dot(&plane.normal) > 1.0 - EPSILON
                        && other_plane.has_point(&center, EPSILON)
                    {
                        // same plane, same facing: overlap, never a crossing
                        if !from_b && triangle_contains(&center, &tri, &other_plane.normal)
                        {
                            covered = true;
                        }
                        return;
                    }
                }

                if let Some(toi) = tri.cast_local_ray(&ray, 1.0, false) {
                    // a hit at the origin is a graze along an opposed
                    // coplanar face
                    if toi > EPSILON {
                        crossings += 1;
                    }
                }
            });

            if (crossings + usize::from(covered)) % 2 == 1 {
                self.faces[i].inside = true;
            }
        }
    }
}

/// Containment of an on-plane point in a welded triangle. Boundary points
/// count as inside: the two brushes triangulate a shared surface
/// independently, so a covered centroid can land exactly on an edge of
/// the covering side's triangulation.
fn triangle_contains(p: &Point3<Real>, tri: &Triangle, normal: &Vector3<Real>) -> bool {
    let verts = [tri.a, tri.b, tri.c];
    for k in 0..3 {
        let v = verts[k];
        let w = verts[(k + 1) % 3];
        if (w - v).cross(&(*p - v)).dot(normal) < -EPSILON {
            return false;
        }
    }
    true
}
