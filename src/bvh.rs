//! Median-split bounding volume hierarchy over merged faces, used to
//! find segment/triangle intersection candidates for the inside
//! classification.
//!
//! Small groups of faces are not split further; their leaves are chained
//! through `next` and scanned linearly, trading depth for a few extra
//! triangle tests.

use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::{Aabb, BoundingVolume};
use crate::float_types::parry3d::query::{Ray, RayCast};
use nalgebra::Point3;

/// Stop splitting once a node holds this many faces or fewer.
const BVH_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    aabb: Aabb,
    center: Point3<Real>,
    face: Option<u32>,
    left: Option<u32>,
    right: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
pub(crate) struct FaceBvh {
    nodes: Vec<BvhNode>,
    root: Option<u32>,
}

fn longest_axis(aabb: &Aabb) -> usize {
    let e = aabb.extents();
    let mut axis = 0;
    if e.y > e[axis] {
        axis = 1;
    }
    if e.z > e[axis] {
        axis = 2;
    }
    axis
}

impl FaceBvh {
    /// Builds the hierarchy over one leaf AABB per face; leaf `i`
    /// corresponds to face index `i` of the caller's face list.
    pub fn build(leaf_aabbs: &[Aabb]) -> Self {
        let mut nodes: Vec<BvhNode> = leaf_aabbs
            .iter()
            .enumerate()
            .map(|(i, aabb)| BvhNode {
                aabb: *aabb,
                center: aabb.center(),
                face: Some(i as u32),
                left: None,
                right: None,
                next: None,
            })
            .collect();

        let mut order: Vec<u32> = (0..leaf_aabbs.len() as u32).collect();
        let root = Self::split(&mut nodes, &mut order);

        Self { nodes, root }
    }

    fn split(nodes: &mut Vec<BvhNode>, order: &mut [u32]) -> Option<u32> {
        if order.is_empty() {
            return None;
        }

        if order.len() <= BVH_LIMIT {
            for w in 0..order.len() - 1 {
                nodes[order[w] as usize].next = Some(order[w + 1]);
            }
            return Some(order[0]);
        }

        let mut aabb = nodes[order[0] as usize].aabb;
        for &i in &order[1..] {
            aabb.merge(&nodes[i as usize].aabb);
        }

        let axis = longest_axis(&aabb);
        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            nodes[a as usize].center[axis].total_cmp(&nodes[b as usize].center[axis])
        });

        let (lo, hi) = order.split_at_mut(mid);
        let left = Self::split(nodes, lo);
        let right = Self::split(nodes, hi);

        let index = nodes.len() as u32;
        nodes.push(BvhNode {
            aabb,
            center: aabb.center(),
            face: None,
            left,
            right,
            next: None,
        });
        Some(index)
    }

    /// Visits every face whose AABB meets the segment `begin..end`. What
    /// a candidate counts for is the caller's call; the welded triangles
    /// themselves live outside the hierarchy.
    pub fn for_each_segment_candidate<F>(
        &self,
        begin: &Point3<Real>,
        end: &Point3<Real>,
        mut visit: F,
    ) where
        F: FnMut(u32),
    {
        let Some(root) = self.root else {
            return;
        };

        let ray = Ray::new(*begin, end - begin);
        let segment_aabb = Aabb::new(begin.inf(end), begin.sup(end));

        let mut stack = vec![root];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];

            if node.face.is_some() {
                // leaf bucket: scan the chain
                let mut cursor = Some(index);
                while let Some(ci) = cursor {
                    let leaf = &self.nodes[ci as usize];
                    if let Some(face) = leaf.face {
                        if leaf.aabb.intersects(&segment_aabb)
                            && leaf.aabb.intersects_local_ray(&ray, 1.0)
                        {
                            visit(face);
                        }
                    }
                    cursor = leaf.next;
                }
            } else if node.aabb.intersects(&segment_aabb)
                && node.aabb.intersects_local_ray(&ray, 1.0)
            {
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }
    }
}
