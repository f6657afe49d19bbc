mod support;

use brushcsg::{Operation, float_types::Real, merge_brushes};
use nalgebra::Vector3;
use support::*;

const SNAP: Real = 0.001;

#[test]
fn union_of_disjoint_brushes_keeps_both() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(3.0, 0.0, 0.0));
    let result = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();
    assert_eq!(result.faces.len(), 24);
    assert!(approx_eq(closed_volume(&result), 2.0, 1e-6));
}

#[test]
fn intersection_of_disjoint_brushes_is_empty() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(3.0, 0.0, 0.0));
    let result = merge_brushes(Operation::Intersection, &a, &b, SNAP).unwrap();
    assert!(result.faces.is_empty());
}

#[test]
fn difference_with_disjoint_brush_is_identity() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(3.0, 0.0, 0.0));
    let result = merge_brushes(Operation::Difference, &a, &b, SNAP).unwrap();
    assert_eq!(result.faces.len(), 12);
    assert!(approx_eq(closed_volume(&result), 1.0, 1e-6));
    assert_eq!(bounding_box(&result), bounding_box(&a));
}

#[test]
fn union_of_overlapping_cubes() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(0.5, 0.5, 0.5));
    let result = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();

    // 1 + 1 minus the shared corner octant
    assert!(approx_eq(closed_volume(&result), 1.875, 1e-6));
    let bb = bounding_box(&result);
    assert!(approx_eq(bb[0], 0.0, 1e-9) && approx_eq(bb[3], 1.5, 1e-9));
    assert!(approx_eq(bb[2], 0.0, 1e-9) && approx_eq(bb[5], 1.5, 1e-9));
}

#[test]
fn intersection_of_overlapping_cubes() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(0.5, 0.5, 0.5));
    let result = merge_brushes(Operation::Intersection, &a, &b, SNAP).unwrap();

    assert!(approx_eq(closed_volume(&result), 0.125, 1e-6));
    let bb = bounding_box(&result);
    for axis in 0..3 {
        assert!(approx_eq(bb[axis], 0.5, 1e-9));
        assert!(approx_eq(bb[axis + 3], 1.0, 1e-9));
    }
}

#[test]
fn difference_of_overlapping_cubes() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(0.5, 0.5, 0.5));
    let result = merge_brushes(Operation::Difference, &a, &b, SNAP).unwrap();

    assert!(approx_eq(closed_volume(&result), 0.875, 1e-6));
    let bb = bounding_box(&result);
    for axis in 0..3 {
        assert!(approx_eq(bb[axis], 0.0, 1e-9));
        assert!(approx_eq(bb[axis + 3], 1.0, 1e-9));
    }
}

#[test]
fn union_of_cubes_with_coplanar_sides() {
    // offset along x only: the top, bottom, front and back planes of the
    // two cubes coincide
    let a = unit_cube(Vector3::new(-0.5, -0.5, -0.5));
    let b = unit_cube(Vector3::new(0.0, -0.5, -0.5));
    let result = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();

    assert!(approx_eq(closed_volume(&result), 1.5, 1e-6));
    let bb = bounding_box(&result);
    assert!(approx_eq(bb[0], -0.5, 1e-9) && approx_eq(bb[3], 1.0, 1e-9));
    assert!(approx_eq(bb[1], -0.5, 1e-9) && approx_eq(bb[4], 0.5, 1e-9));
    assert!(approx_eq(bb[2], -0.5, 1e-9) && approx_eq(bb[5], 0.5, 1e-9));
}

#[test]
fn intersection_of_cubes_with_coplanar_sides() {
    let a = unit_cube(Vector3::new(-0.5, -0.5, -0.5));
    let b = unit_cube(Vector3::new(0.0, -0.5, -0.5));
    let result = merge_brushes(Operation::Intersection, &a, &b, SNAP).unwrap();

    assert!(approx_eq(closed_volume(&result), 0.5, 1e-6));
    let bb = bounding_box(&result);
    assert!(approx_eq(bb[0], 0.0, 1e-9) && approx_eq(bb[3], 0.5, 1e-9));
}

#[test]
fn difference_of_cubes_with_coplanar_sides() {
    let a = unit_cube(Vector3::new(-0.5, -0.5, -0.5));
    let b = unit_cube(Vector3::new(0.0, -0.5, -0.5));
    let result = merge_brushes(Operation::Difference, &a, &b, SNAP).unwrap();

    // what survives of A lies on the -x side of the cut
    assert!(approx_eq(closed_volume(&result), 0.5, 1e-6));
    let bb = bounding_box(&result);
    assert!(approx_eq(bb[0], -0.5, 1e-9) && approx_eq(bb[3], 0.0, 1e-9));
}

#[test]
fn difference_reverses_the_cutter_faces() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(0.5, 0.5, 0.5));
    let result = merge_brushes(Operation::Difference, &a, &b, SNAP).unwrap();

    // the cut wall at x = 0.5 comes from B's left side; after the flip it
    // must face +x, away from the remaining solid
    let mut wall_faces = 0;
    for face in &result.faces {
        if face.vertices.iter().all(|v| (v.x - 0.5).abs() < 1e-6) {
            let n = (face.vertices[1] - face.vertices[0])
                .cross(&(face.vertices[2] - face.vertices[0]));
            assert!(n.x > 0.0, "cut face wound toward the solid");
            wall_faces += 1;
        }
    }
    assert!(wall_faces > 0);
}

#[test]
fn materials_merge_into_one_palette() {
    let a = cube(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), Some("stone"));
    let b = cube(
        Vector3::new(0.5, 0.5, 0.5),
        Vector3::new(1.0, 1.0, 1.0),
        Some("wood"),
    );
    let result = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();

    assert_eq!(result.materials, vec!["stone", "wood"]);
    for face in &result.faces {
        let idx = face.material.unwrap();
        assert!(idx < result.materials.len());
    }
}

#[test]
fn difference_keeps_the_cutter_material_on_cut_walls() {
    let a = cube(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), Some("stone"));
    let b = cube(
        Vector3::new(0.5, 0.5, 0.5),
        Vector3::new(1.0, 1.0, 1.0),
        Some("wood"),
    );
    let result = merge_brushes(Operation::Difference, &a, &b, SNAP).unwrap();

    let wood = result
        .materials
        .iter()
        .position(|m| *m == "wood")
        .expect("cutter material present");
    let wood_faces = result
        .faces
        .iter()
        .filter(|f| f.material == Some(wood))
        .count();
    assert!(wood_faces > 0);
}

#[test]
fn per_face_flags_survive_the_merge() {
    let mut a = unit_cube(Vector3::zeros());
    for face in &mut a.faces {
        face.invert = true;
    }
    let b = unit_cube(Vector3::new(3.0, 0.0, 0.0));
    let result = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();

    assert_eq!(result.faces.iter().filter(|f| f.invert).count(), 12);
    assert_eq!(result.faces.iter().filter(|f| !f.invert).count(), 12);
}

#[test]
fn merging_is_deterministic() {
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(0.5, 0.5, 0.5));
    let first = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();
    let second = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();

    assert_eq!(first.faces.len(), second.faces.len());
    for (fa, fb) in first.faces.iter().zip(&second.faces) {
        assert_eq!(fa.vertices, fb.vertices);
        assert_eq!(fa.material, fb.material);
    }
}

#[test]
fn operations_nest() {
    // carve a corner off the result of a previous union
    let a = unit_cube(Vector3::zeros());
    let b = unit_cube(Vector3::new(0.5, 0.5, 0.5));
    let c = unit_cube(Vector3::new(-0.5, -0.5, -0.5));
    let union = merge_brushes(Operation::Union, &a, &b, SNAP).unwrap();
    let result = merge_brushes(Operation::Difference, &union, &c, SNAP).unwrap();

    // c overlaps only a, by one corner octant
    assert!(approx_eq(closed_volume(&result), 1.75, 1e-6));
}
