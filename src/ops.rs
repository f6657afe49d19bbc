//! Boolean merge orchestration: pairs faces by AABB overlap, drives the
//! clipping and reconstruction, then selects the output subset for the
//! requested operation.

use crate::brush::{Brush, Face};
use crate::build_poly::BuildPoly;
use crate::errors::CsgError;
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::BoundingVolume;
use crate::intersect::{FaceRelation, classify_faces};
use crate::merge::MeshMerge;
use crate::reconstruct::merge_poly;
use nalgebra::Vector3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Which boolean result to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Everything enclosed by either brush.
    Union,
    /// Only the volume enclosed by both.
    Intersection,
    /// A minus B.
    Difference,
}

/// Tolerance knobs for one merge call. The defaults reproduce behavior
/// tuned for meshes around unit scale; all of them are scene-scale
/// heuristics, not physical constants.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Welding distance, also the point-on-edge tolerance while clipping.
    pub vertex_snap: Real,
    /// Offset added to the inside-test ray target to avoid exact edge and
    /// vertex grazing.
    pub ray_jitter: Vector3<Real>,
    /// Relative growth of the brush-overlap AABB gating the inside test.
    pub intersection_grow: Real,
    /// Relative inflation of the per-face AABBs on the result brush.
    pub face_aabb_grow: Real,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            vertex_snap: 0.001,
            ray_jitter: Vector3::new(0.0001234, 0.000512, 0.00013423),
            intersection_grow: 0.01,
            face_aabb_grow: 0.001,
        }
    }
}

/// Boolean-merges two brushes with default tolerances and the given
/// welding snap distance.
pub fn merge_brushes<M: Clone + PartialEq>(
    operation: Operation,
    brush_a: &Brush<M>,
    brush_b: &Brush<M>,
    vertex_snap: Real,
) -> Result<Brush<M>, CsgError> {
    merge_brushes_with(
        operation,
        brush_a,
        brush_b,
        &MergeOptions {
            vertex_snap,
            ..MergeOptions::default()
        },
    )
}

/// Boolean-merges two brushes.
///
/// Deterministic for identical inputs and options; the output carries a
/// freshly deduplicated material palette and recomputed face AABBs.
pub fn merge_brushes_with<M: Clone + PartialEq>(
    operation: Operation,
    brush_a: &Brush<M>,
    brush_b: &Brush<M>,
    options: &MergeOptions,
) -> Result<Brush<M>, CsgError> {
    let mut mesh = MeshMerge::new(options.vertex_snap);

    // face pairs worth a closer look, by AABB overlap
    #[cfg(feature = "parallel")]
    let candidate_pairs: Vec<(usize, usize)> = brush_a
        .faces
        .par_iter()
        .enumerate()
        .flat_map_iter(|(i, fa)| {
            brush_b
                .faces
                .iter()
                .enumerate()
                .filter(move |(_, fb)| fa.aabb.intersects(&fb.aabb))
                .map(move |(j, _)| (i, j))
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let candidate_pairs: Vec<(usize, usize)> = brush_a
        .faces
        .iter()
        .enumerate()
        .flat_map(|(i, fa)| {
            brush_b
                .faces
                .iter()
                .enumerate()
                .filter(move |(_, fb)| fa.aabb.intersects(&fb.aabb))
                .map(move |(j, _)| (i, j))
        })
        .collect();

    // clip every intersecting pair into both working polygons, creating
    // the polygons lazily on first contact
    let mut build_polys_a: Vec<Option<BuildPoly<M>>> =
        (0..brush_a.faces.len()).map(|_| None).collect();
    let mut build_polys_b: Vec<Option<BuildPoly<M>>> =
        (0..brush_b.faces.len()).map(|_| None).collect();

    for &(i, j) in &candidate_pairs {
        let relation = classify_faces(&brush_a.faces[i], &brush_b.faces[j], options.vertex_snap);
        if relation == FaceRelation::Disjoint {
            continue;
        }

        if build_polys_a[i].is_none() {
            build_polys_a[i] = BuildPoly::create(brush_a, i);
        }
        if build_polys_b[j].is_none() {
            build_polys_b[j] = BuildPoly::create(brush_b, j);
        }

        if let Some(poly) = build_polys_a[i].as_mut() {
            match relation {
                FaceRelation::Crossing => poly.clip(&brush_b.faces[j], options.vertex_snap),
                _ => poly.clip_coplanar(&brush_b.faces[j], options.vertex_snap),
            }
        }
        if let Some(poly) = build_polys_b[j].as_mut() {
            match relation {
                FaceRelation::Crossing => poly.clip(&brush_a.faces[i], options.vertex_snap),
                _ => poly.clip_coplanar(&brush_a.faces[i], options.vertex_snap),
            }
        }
    }

    // reconstruct the clipped polygons back into welded 3D triangles
    for poly in build_polys_a.iter().flatten() {
        merge_poly(&mut mesh, poly, false)?;
    }
    for poly in build_polys_b.iter().flatten() {
        merge_poly(&mut mesh, poly, true)?;
    }

    // faces never touched by clipping pass through unchanged
    emit_untouched(&mut mesh, brush_a, &build_polys_a, false);
    emit_untouched(&mut mesh, brush_b, &build_polys_b, true);

    mesh.mark_inside_faces(options);

    let mut faces = Vec::with_capacity(mesh.faces.len());
    for mm in &mesh.faces {
        let keep = match operation {
            Operation::Union => !mm.inside,
            Operation::Intersection => mm.inside,
            Operation::Difference => {
                if mm.from_b {
                    mm.inside
                } else {
                    !mm.inside
                }
            },
        };
        if !keep {
            continue;
        }

        let mut vertices = [
            mesh.points[mm.points[0]],
            mesh.points[mm.points[1]],
            mesh.points[mm.points[2]],
        ];
        let mut uvs = mm.uvs;

        // kept insides of B bound the difference from the other side
        if operation == Operation::Difference && mm.from_b {
            vertices.swap(1, 2);
            uvs.swap(1, 2);
        }

        faces.push(Face {
            aabb: Face::compute_aabb(&vertices, options.face_aabb_grow),
            vertices,
            uvs,
            smooth: mm.smooth,
            invert: mm.invert,
            material: mm.material,
        });
    }

    Ok(Brush {
        faces,
        materials: mesh.materials,
    })
}

fn emit_untouched<M: Clone + PartialEq>(
    mesh: &mut MeshMerge<M>,
    brush: &Brush<M>,
    build_polys: &[Option<BuildPoly<M>>],
    from_b: bool,
) {
    for (face, poly) in brush.faces.iter().zip(build_polys) {
        if poly.is_some() {
            continue; // emitted through reconstruction
        }
        let material = face.material.map(|idx| brush.materials[idx].clone());
        mesh.add_face(
            &face.vertices,
            &face.uvs,
            face.smooth,
            face.invert,
            material,
            from_b,
        );
    }
}
