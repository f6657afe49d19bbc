//! Recovers simple polygon loops from a clipped [`BuildPoly`] edge graph,
//! fuses holes into their outlines, triangulates, and feeds the result to
//! the mesh accumulator.
//!
//! Loop extraction is the standard planar-graph face walk: at every vertex
//! take the most counter-clockwise unvisited edge relative to the incoming
//! direction. A second walk taking the most clockwise turn pulls out the
//! bounding outline of a disconnected component when deciding whether it
//! is a hole of an already-extracted loop.

use std::collections::VecDeque;

use crate::build_poly::BuildPoly;
use crate::errors::CsgError;
use crate::float_types::{EPSILON, Real};
use crate::geometry::{cross2, segment_intersects_segment};
use crate::merge::MeshMerge;
use geo::{Coord, LineString, Polygon as GeoPolygon};
use nalgebra::{Point2, Vector2};

/// One reconstructed loop plus the holes found inside it.
#[derive(Debug, Default)]
struct PolyPoints {
    points: Vec<usize>,
    holes: Vec<Vec<usize>>,
}

/// A candidate edge at a walk step, ordered by turn angle with the edge
/// index as the deterministic tie-breaker for coincident directions.
#[derive(Debug, Clone, Copy)]
struct EdgeSort {
    angle: Real,
    edge: usize,
    prev_point: usize,
    edge_point: usize,
}

/// Local frame of the incoming segment, for turn-angle measurement.
struct TurnFrame {
    origin: Point2<Real>,
    dir: Vector2<Real>,
}

impl TurnFrame {
    fn new(from: &Point2<Real>, to: &Point2<Real>) -> Option<Self> {
        let dir = (to - from).try_normalize(EPSILON)?;
        Some(Self { origin: *to, dir })
    }

    /// Negated angle of `target` in this frame; sorting ascending then
    /// picks the most counter-clockwise turn first.
    fn turn_angle(&self, target: &Point2<Real>) -> Real {
        let rel = target - self.origin;
        let x = rel.x * self.dir.x + rel.y * self.dir.y;
        let y = -rel.x * self.dir.y + rel.y * self.dir.x;
        -y.atan2(x)
    }
}

fn opposite_point<M>(poly: &BuildPoly<M>, edge: usize, point: usize) -> usize {
    if poly.edges[edge].points[0] == point {
        poly.edges[edge].points[1]
    } else {
        poly.edges[edge].points[0]
    }
}

/// Extracts every loop reachable from `start_edge`, following minimum-angle
/// turns. Sibling candidates are stacked so disconnected-but-reachable
/// loops are all visited.
fn add_poly_points<M>(
    poly: &BuildPoly<M>,
    start_edge: usize,
    from_point: usize,
    to_point: usize,
    vertex_edges: &[Vec<usize>],
    edge_process: &mut [bool],
    polys: &mut Vec<PolyPoints>,
) {
    let mut edge_stack = VecDeque::new();
    edge_stack.push_back(EdgeSort {
        angle: 0.0, // never compared for the seed
        edge: start_edge,
        prev_point: from_point,
        edge_point: to_point,
    });

    while let Some(e) = edge_stack.pop_front() {
        if edge_process[e.edge] {
            continue;
        }

        let mut points = vec![e.prev_point];
        let mut prev_point = e.prev_point;
        let mut to_point = e.edge_point;
        let mut current_edge = e.edge;
        edge_process[e.edge] = true;

        let mut limit = poly.points.len() * 4;

        while to_point != e.prev_point && limit > 0 {
            let Some(frame) = TurnFrame::new(
                &poly.points[prev_point].point,
                &poly.points[to_point].point,
            ) else {
                break; // zero-length step, abandon this loop
            };

            let mut next_edges: Vec<EdgeSort> = Vec::new();
            for &edge in &vertex_edges[to_point] {
                let opposite = opposite_point(poly, edge, to_point);
                if opposite == prev_point {
                    continue; // not going back
                }
                next_edges.push(EdgeSort {
                    angle: frame.turn_angle(&poly.points[opposite].point),
                    edge,
                    prev_point: to_point,
                    edge_point: opposite,
                });
            }

            next_edges.sort_by(|a, b| {
                a.angle.total_cmp(&b.angle).then(a.edge.cmp(&b.edge))
            });

            let (next_point, next_edge);
            if let Some((first, rest)) = next_edges.split_first() {
                next_point = first.edge_point;
                next_edge = first.edge;
                // stack the siblings; they seed the remaining loops
                for es in rest {
                    if !edge_process[es.edge] {
                        edge_stack.push_back(*es);
                    }
                }
            } else {
                // dead end, turn around
                next_point = prev_point;
                next_edge = current_edge;
            }

            points.push(to_point);
            prev_point = to_point;
            to_point = next_point;
            edge_process[next_edge] = true;
            current_edge = next_edge;
            limit -= 1;
        }

        // a walk cut short by the limit or by a zero-length step never
        // closed and does not bound a region
        if to_point == e.prev_point && points.len() > 2 {
            polys.push(PolyPoints {
                points,
                holes: Vec::new(),
            });
        }
    }
}

/// Walks the bounding outline of the component containing the given edge
/// by always taking the maximum-angle turn. No stack: only the outermost
/// loop is of interest here.
fn add_poly_outline<M>(
    poly: &BuildPoly<M>,
    from_point: usize,
    to_point: usize,
    vertex_edges: &[Vec<usize>],
) -> Vec<usize> {
    let mut outline = vec![from_point];
    let mut prev_point = from_point;
    let mut to_point = to_point;

    let mut limit = poly.points.len() * 4;

    while to_point != from_point && limit > 0 {
        let Some(frame) = TurnFrame::new(
            &poly.points[prev_point].point,
            &poly.points[to_point].point,
        ) else {
            break;
        };

        let mut max_angle = 0.0;
        let mut next_point = None;
        for &edge in &vertex_edges[to_point] {
            let opposite = opposite_point(poly, edge, to_point);
            if opposite == prev_point {
                continue;
            }
            let angle = frame.turn_angle(&poly.points[opposite].point);
            if next_point.is_none() || angle > max_angle {
                max_angle = angle;
                next_point = Some(opposite);
            }
        }

        // no route forward means walking back
        let next = next_point.unwrap_or(prev_point);
        outline.push(to_point);
        prev_point = to_point;
        to_point = next;
        limit -= 1;
    }

    if to_point != from_point {
        return Vec::new(); // never closed
    }
    outline
}

/// Doubled signed area of a loop, positive when it runs counter-clockwise.
fn ring_area<M>(poly: &BuildPoly<M>, ring: &[usize]) -> Real {
    let mut doubled = 0.0;
    for k in 0..ring.len() {
        let p = poly.points[ring[k]].point;
        let q = poly.points[ring[(k + 1) % ring.len()]].point;
        doubled += p.x * q.y - p.y * q.x;
    }
    doubled
}

/// Crossing parity of the segment `ref_point -> out_point` against a loop.
fn crossings<M>(
    poly: &BuildPoly<M>,
    loop_points: &[usize],
    ref_point: &Point2<Real>,
    out_point: &Point2<Real>,
) -> usize {
    let mut count = 0;
    for k in 0..loop_points.len() {
        let p1 = poly.points[loop_points[k]].point;
        let p2 = poly.points[loop_points[(k + 1) % loop_points.len()]].point;
        if segment_intersects_segment(ref_point, out_point, &p1, &p2).is_some() {
            count += 1;
        }
    }
    count
}

/// Finds a bridge segment from some hole vertex to some outline vertex
/// that crosses no other outline or hole edge. Returns
/// `(hole index, hole vertex, outline vertex)`.
fn find_hole_bridge<M>(poly: &BuildPoly<M>, pp: &PolyPoints) -> Option<(usize, usize, usize)> {
    for j in 0..pp.holes.len() {
        for k in 0..pp.holes[j].len() {
            let from = poly.points[pp.holes[j][k]].point;
            'outline: for l in 0..pp.points.len() {
                let to = poly.points[pp.points[l]].point;

                // against the outline, skipping the edges that share the
                // chosen outline vertex
                for m in 0..pp.points.len() {
                    let m_next = (m + 1) % pp.points.len();
                    if m == l || m_next == l {
                        continue;
                    }
                    let p1 = poly.points[pp.points[m]].point;
                    let p2 = poly.points[pp.points[m_next]].point;
                    if segment_intersects_segment(&from, &to, &p1, &p2).is_some() {
                        continue 'outline;
                    }
                }

                // against every hole, skipping the edges that share the
                // chosen hole vertex
                for m in 0..pp.holes.len() {
                    for n in 0..pp.holes[m].len() {
                        let n_next = (n + 1) % pp.holes[m].len();
                        if m == j && (n == k || n_next == k) {
                            continue;
                        }
                        let p1 = poly.points[pp.holes[m][n]].point;
                        let p2 = poly.points[pp.holes[m][n_next]].point;
                        if segment_intersects_segment(&from, &to, &p1, &p2).is_some() {
                            continue 'outline;
                        }
                    }
                }

                return Some((j, k, l));
            }
        }
    }
    None
}

/// Triangulates one fused ring, returning index triples into the ring.
fn triangulate_ring(vertices: &[Point2<Real>]) -> Vec<[usize; 3]> {
    let coords: Vec<Coord<Real>> = vertices
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    let polygon = GeoPolygon::new(LineString::new(coords), Vec::new());

    #[cfg(feature = "earcut")]
    {
        use geo::TriangulateEarcut;
        let triangulation = polygon.earcut_triangles_raw();

        // the ring is closed internally, so raw indices may reference the
        // repeated first coordinate; wrap them back
        let n = vertices.len();
        triangulation
            .triangle_indices
            .chunks_exact(3)
            .map(|tri| [tri[0] % n, tri[1] % n, tri[2] % n])
            .collect()
    }

    #[cfg(feature = "delaunay")]
    {
        use geo::TriangulateSpade;
        let Ok(tris) = polygon.constrained_triangulation(Default::default()) else {
            return Vec::new();
        };

        // spade hands back coordinates, not indices; map each corner back
        // to the ring vertex it came from
        let index_of = |c: &Coord<Real>| {
            vertices
                .iter()
                .position(|p| p.x == c.x && p.y == c.y)
        };
        let mut result = Vec::with_capacity(tris.len());
        for triangle in tris {
            let (Some(a), Some(b), Some(c)) = (
                index_of(&triangle.0),
                index_of(&triangle.1),
                index_of(&triangle.2),
            ) else {
                continue; // steiner point, skip the synthetic triangle
            };
            result.push([a, b, c]);
        }
        result
    }
}

/// Converts one fully-clipped polygon back into welded 3D triangles.
pub(crate) fn merge_poly<M: Clone + PartialEq>(
    mesh: &mut MeshMerge<M>,
    poly: &BuildPoly<M>,
    from_b: bool,
) -> Result<(), CsgError> {
    let mut vertex_edges: Vec<Vec<usize>> = vec![Vec::new(); poly.points.len()];
    let mut edge_process = vec![false; poly.edges.len()];

    for (i, edge) in poly.edges.iter().enumerate() {
        vertex_edges[edge.points[0]].push(i);
        vertex_edges[edge.points[1]].push(i);
    }

    let mut polys: Vec<PolyPoints> = Vec::new();

    for i in 0..edge_process.len() {
        if edge_process[i] {
            continue;
        }

        let mut intersect_poly = None;

        if i > 0 {
            // a disconnected component; find which extracted loop it is a
            // hole of by ray-crossing parity from a point outside the loop
            let ref_point = poly.points[poly.edges[i].points[0]].point;

            for (j, pp) in polys.iter().enumerate() {
                let mut out_point: Point2<Real> = Point2::new(-1e20, -1e20);
                for &k in &pp.points {
                    let p = poly.points[k].point;
                    out_point.x = out_point.x.max(p.x);
                    out_point.y = out_point.y.max(p.y);
                }
                // nudge off-axis to dodge exact edge/vertex hits
                out_point += Vector2::new(0.12341234, 0.4123412);

                if crossings(poly, &pp.points, &ref_point, &out_point) % 2 == 1 {
                    intersect_poly = Some(j);
                    break;
                }
            }
        }

        if let Some(j) = intersect_poly {
            let outline = add_poly_outline(
                poly,
                poly.edges[i].points[0],
                poly.edges[i].points[1],
                &vertex_edges,
            );
            if outline.len() > 1 {
                polys[j].holes.push(outline);
            }
        }

        add_poly_points(
            poly,
            i,
            poly.edges[i].points[0],
            poly.edges[i].points[1],
            &vertex_edges,
            &mut edge_process,
            &mut polys,
        );
    }

    // splice each hole into its outline through a non-crossing bridge
    for pp in &mut polys {
        while !pp.holes.is_empty() {
            let Some((hole_idx, hole_vertex, outline_vertex)) = find_hole_bridge(poly, pp)
            else {
                return Err(CsgError::HoleBridgingFailed);
            };

            let mut hole = pp.holes.remove(hole_idx);
            let mut hole_vertex = hole_vertex;

            // the hole must run opposite the outline, or the spliced ring
            // overlaps itself and the enclosed area stays covered
            if ring_area(poly, &hole) * ring_area(poly, &pp.points) > 0.0 {
                hole.reverse();
                hole_vertex = hole.len() - 1 - hole_vertex;
            }

            // duplicate the outline vertex, then run the whole hole from
            // the bridge vertex around back to itself
            let mut insertion = Vec::with_capacity(hole.len() + 2);
            insertion.push(pp.points[outline_vertex]);
            for k in 0..=hole.len() {
                insertion.push(hole[(hole_vertex + k) % hole.len()]);
            }
            pp.points.splice(outline_vertex..outline_vertex, insertion);
        }
    }

    for pp in &polys {
        let vertices: Vec<Point2<Real>> = pp
            .points
            .iter()
            .map(|&idx| poly.points[idx].point)
            .collect();

        for tri in triangulate_ring(&vertices) {
            let a = &poly.points[pp.points[tri[0]]];
            let b = &poly.points[pp.points[tri[1]]];
            let c = &poly.points[pp.points[tri[2]]];

            // slivers produced by the bridge duplicates collapse to zero
            // area; drop them
            if cross2(&a.point, &b.point, &c.point).abs() < EPSILON {
                continue;
            }

            mesh.add_face(
                &[
                    poly.basis.to_world(&a.point),
                    poly.basis.to_world(&b.point),
                    poly.basis.to_world(&c.point),
                ],
                &[a.uv, b.uv, c.uv],
                poly.smooth,
                poly.invert,
                poly.material.clone(),
                from_b,
            );
        }
    }

    Ok(())
}
