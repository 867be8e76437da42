use foundation::bounds::Aabb2;
use foundation::math::precision::stable_total_cmp_f64;

use crate::node::NodeId;

/// A deterministic bounding volume hierarchy over node positions in
/// `[lng, lat]` degrees.
///
/// Ordering contract:
/// - `query` returns nodes in ascending `NodeId` order.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    nodes: Vec<BvhNode>,
}

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        bounds: Aabb2,
        items: Vec<Item>,
    },
    Internal {
        bounds: Aabb2,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub node: NodeId,
    pub bounds: Aabb2,
}

impl Item {
    pub fn point(node: NodeId, lng: f64, lat: f64) -> Self {
        Self {
            node,
            bounds: Aabb2::point([lng, lat]),
        }
    }
}

impl SpatialIndex {
    pub fn build(items: Vec<Item>) -> Self {
        let mut nodes = Vec::new();
        let mut items = items;
        if !items.is_empty() {
            build_node(&mut nodes, &mut items);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes whose bounds intersect `query`, touching edges included.
    pub fn query(&self, query: &Aabb2) -> Vec<NodeId> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<NodeId> = Vec::new();
        let mut stack: Vec<usize> = vec![0];

        while let Some(idx) = stack.pop() {
            match &self.nodes[idx] {
                BvhNode::Leaf { bounds, items } => {
                    if !bounds.intersects(query) {
                        continue;
                    }
                    hits.extend(
                        items
                            .iter()
                            .filter(|item| item.bounds.intersects(query))
                            .map(|item| item.node),
                    );
                }
                BvhNode::Internal {
                    bounds,
                    left,
                    right,
                } => {
                    if !bounds.intersects(query) {
                        continue;
                    }
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        hits.sort();
        hits.dedup();
        hits
    }
}

const LEAF_MAX: usize = 8;

fn build_node(nodes: &mut Vec<BvhNode>, items: &mut [Item]) -> usize {
    let bounds = bounds_for_items(items);
    if items.len() <= LEAF_MAX {
        let idx = nodes.len();
        nodes.push(BvhNode::Leaf {
            bounds,
            items: items.to_vec(),
        });
        return idx;
    }

    let axis = split_axis(&bounds);
    items.sort_by(|a, b| {
        let ca = centroid_axis(&a.bounds, axis);
        let cb = centroid_axis(&b.bounds, axis);
        stable_total_cmp_f64(ca, cb).then_with(|| a.node.cmp(&b.node))
    });

    let mid = items.len() / 2;
    let (left_items, right_items) = items.split_at_mut(mid);

    let idx = nodes.len();
    // Patched once both children exist.
    nodes.push(BvhNode::Leaf {
        bounds,
        items: Vec::new(),
    });

    let left = build_node(nodes, left_items);
    let right = build_node(nodes, right_items);

    nodes[idx] = BvhNode::Internal {
        bounds,
        left,
        right,
    };
    idx
}

fn centroid_axis(aabb: &Aabb2, axis: usize) -> f64 {
    (aabb.min[axis] + aabb.max[axis]) * 0.5
}

/// Longest extent; ties prefer longitude.
fn split_axis(bounds: &Aabb2) -> usize {
    let ex = bounds.max[0] - bounds.min[0];
    let ey = bounds.max[1] - bounds.min[1];
    if ex >= ey { 0 } else { 1 }
}

fn bounds_for_items(items: &[Item]) -> Aabb2 {
    items[1..]
        .iter()
        .fold(items[0].bounds, |acc, item| acc.union(&item.bounds))
}

#[cfg(test)]
mod tests {
    use super::{Item, SpatialIndex};
    use crate::node::NodeId;
    use foundation::bounds::Aabb2;

    fn grid(n: u32) -> Vec<Item> {
        let mut items = Vec::new();
        for i in 0..n {
            for j in 0..n {
                let id = NodeId(i * n + j);
                items.push(Item::point(id, 13.0 + i as f64 * 1e-4, 55.0 + j as f64 * 1e-4));
            }
        }
        items
    }

    #[test]
    fn query_returns_nodes_in_id_order() {
        let index = SpatialIndex::build(vec![
            Item::point(NodeId(2), 10.0, 0.0),
            Item::point(NodeId(1), 0.5, 0.5),
            Item::point(NodeId(3), 1.0, 1.0),
        ]);
        let hits = index.query(&Aabb2::new([0.25, 0.25], [1.0, 1.0]));
        assert_eq!(hits, vec![NodeId(1), NodeId(3)]);
    }

    #[test]
    fn matches_linear_scan_on_a_grid() {
        let items = grid(12);
        let index = SpatialIndex::build(items.clone());
        let query = Aabb2::new([13.00025, 55.00035], [13.00071, 55.00092]);
        let mut expected: Vec<NodeId> = items
            .iter()
            .filter(|item| item.bounds.intersects(&query))
            .map(|item| item.node)
            .collect();
        expected.sort();
        assert!(!expected.is_empty());
        assert_eq!(index.query(&query), expected);
    }

    #[test]
    fn build_is_input_order_independent_for_results() {
        let a = grid(5);
        let mut b = a.clone();
        b.reverse();
        let q = Aabb2::new([13.0001, 55.0001], [13.0003, 55.0002]);
        assert_eq!(SpatialIndex::build(a).query(&q), SpatialIndex::build(b).query(&q));
        assert!(SpatialIndex::build(Vec::new()).query(&q).is_empty());
    }
}
