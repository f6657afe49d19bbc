//! Brush representation: a triangle list plus a deduplicated material palette.

use crate::errors::CsgError;
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::{Aabb, BoundingVolume};
use nalgebra::{Matrix4, Point3, Vector2};

/// Default per-face AABB inflation factor, relative to the longest axis.
pub(crate) const FACE_AABB_GROW: Real = 0.001;

/// One triangle of a brush with its interpolation attributes.
#[derive(Debug, Clone)]
pub struct Face {
    pub vertices: [Point3<Real>; 3],
    pub uvs: [Vector2<Real>; 3],
    pub smooth: bool,
    pub invert: bool,
    /// Index into the brush's material palette.
    pub material: Option<usize>,
    /// Slightly inflated bounds, used for pair prefiltering.
    pub aabb: Aabb,
}

impl Face {
    pub(crate) fn compute_aabb(vertices: &[Point3<Real>; 3], grow: Real) -> Aabb {
        let mins = vertices[0].inf(&vertices[1]).inf(&vertices[2]);
        let maxs = vertices[0].sup(&vertices[1]).sup(&vertices[2]);
        let aabb = Aabb::new(mins, maxs);
        aabb.loosened(aabb.extents().max() * grow)
    }
}

/// A closed triangle mesh ready for boolean merging.
///
/// `M` is the caller's material handle; any cheaply comparable clonable
/// type works (an id, an `Arc`, a string). Faces reference materials by
/// index into `materials`, which holds each distinct material once, in
/// first-seen order.
#[derive(Debug, Clone)]
pub struct Brush<M> {
    pub faces: Vec<Face>,
    pub materials: Vec<M>,
}

impl<M: Clone + PartialEq> Brush<M> {
    /// Builds a brush from a flat triangle soup.
    ///
    /// `vertices` must hold a whole number of triangles. The parallel
    /// arrays are honored only when their length matches exactly
    /// (`uvs`: vertex count; `smooth`/`materials`/`invert`: triangle
    /// count) and are defaulted otherwise. Materials are deduplicated
    /// into the palette in first-seen order.
    pub fn from_faces(
        vertices: &[Point3<Real>],
        uvs: &[Vector2<Real>],
        smooth: &[bool],
        materials: &[Option<M>],
        invert: &[bool],
    ) -> Result<Self, CsgError> {
        let vc = vertices.len();
        if vc % 3 != 0 {
            return Err(CsgError::InvalidVertexCount(vc));
        }
        let fc = vc / 3;

        let mut palette: Vec<M> = Vec::new();
        let mut faces = Vec::with_capacity(fc);

        for i in 0..fc {
            let tri = [vertices[i * 3], vertices[i * 3 + 1], vertices[i * 3 + 2]];
            let uv = if uvs.len() == vc {
                [uvs[i * 3], uvs[i * 3 + 1], uvs[i * 3 + 2]]
            } else {
                [Vector2::zeros(); 3]
            };
            let material = if materials.len() == fc {
                materials[i].as_ref().map(|mat| {
                    match palette.iter().position(|m| m == mat) {
                        Some(idx) => idx,
                        None => {
                            palette.push(mat.clone());
                            palette.len() - 1
                        },
                    }
                })
            } else {
                None
            };

            faces.push(Face {
                aabb: Face::compute_aabb(&tri, FACE_AABB_GROW),
                vertices: tri,
                uvs: uv,
                smooth: if smooth.len() == fc { smooth[i] } else { false },
                invert: if invert.len() == fc { invert[i] } else { false },
                material,
            });
        }

        Ok(Self {
            faces,
            materials: palette,
        })
    }

    /// Copy of this brush with every vertex run through `xform`.
    pub fn transformed(&self, xform: &Matrix4<Real>) -> Brush<M> {
        let mut result = self.clone();
        for face in &mut result.faces {
            for v in &mut face.vertices {
                *v = xform.transform_point(v);
            }
            face.aabb = Face::compute_aabb(&face.vertices, FACE_AABB_GROW);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri_soup(n: usize) -> Vec<Point3<Real>> {
        let mut soup = Vec::new();
        for i in 0..n {
            let z = i as Real;
            soup.push(Point3::new(0.0, 0.0, z));
            soup.push(Point3::new(1.0, 0.0, z));
            soup.push(Point3::new(0.0, 1.0, z));
        }
        soup
    }

    #[test]
    fn rejects_partial_triangles() {
        let mut soup = tri_soup(1);
        soup.pop();
        let err = Brush::<&str>::from_faces(&soup, &[], &[], &[], &[]).unwrap_err();
        assert_eq!(err, CsgError::InvalidVertexCount(2));
    }

    #[test]
    fn mismatched_optional_arrays_are_defaulted() {
        let soup = tri_soup(2);
        // smooth has the wrong length (vertex count instead of face count)
        let brush =
            Brush::<&str>::from_faces(&soup, &[], &[true; 6], &[], &[]).unwrap();
        assert!(brush.faces.iter().all(|f| !f.smooth));
        assert!(brush.faces.iter().all(|f| f.material.is_none()));
    }

    #[test]
    fn palette_dedups_in_first_seen_order() {
        let soup = tri_soup(4);
        let mats = [Some("stone"), Some("wood"), Some("stone"), None];
        let brush = Brush::from_faces(&soup, &[], &[], &mats, &[]).unwrap();
        assert_eq!(brush.materials, vec!["stone", "wood"]);
        assert_eq!(brush.faces[0].material, Some(0));
        assert_eq!(brush.faces[1].material, Some(1));
        assert_eq!(brush.faces[2].material, Some(0));
        assert_eq!(brush.faces[3].material, None);
    }

    #[test]
    fn face_aabbs_are_inflated() {
        let soup = tri_soup(1);
        let brush = Brush::<&str>::from_faces(&soup, &[], &[], &[], &[]).unwrap();
        let aabb = &brush.faces[0].aabb;
        assert!(aabb.mins.x < 0.0 && aabb.maxs.x > 1.0);
    }

    #[test]
    fn transformed_moves_vertices_and_bounds() {
        let soup = tri_soup(1);
        let brush = Brush::<&str>::from_faces(&soup, &[], &[], &[], &[]).unwrap();
        let shift = Matrix4::new_translation(&nalgebra::Vector3::new(10.0, 0.0, 0.0));
        let moved = brush.transformed(&shift);
        assert!((moved.faces[0].vertices[1].x - 11.0).abs() < 1e-12);
        assert!(moved.faces[0].aabb.mins.x > 9.0);
    }
}
