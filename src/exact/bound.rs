//! Admissible distance bound on the remainder of a tour.
//!
//! Straight-line distances never exceed shortest-path distances, so every
//! quantity here is a lower bound on the road distance still to drive.

use crate::graph::{NodeId, Router};

/// Weight of a minimum spanning tree over `nodes` under straight-line
/// distance. Prim's algorithm on the implicit complete graph, `O(n²)`.
///
/// ```
/// use optload::exact::euclidean_mst;
/// use optload::graph::{Graph, Router};
///
/// let mut g = Graph::builder();
/// g.add_node(0, 0.0, 0.0).unwrap();
/// g.add_node(1, 3.0, 0.0).unwrap();
/// g.add_node(2, 3.0, 4.0).unwrap();
/// let router = Router::new(g.build_shared());
/// assert_eq!(euclidean_mst(&router, &[0, 1, 2]), 7.0);
/// assert_eq!(euclidean_mst(&router, &[2]), 0.0);
/// ```
pub fn euclidean_mst(router: &Router, nodes: &[NodeId]) -> f64 {
    if nodes.len() < 2 {
        return 0.0;
    }
    let mut in_tree = vec![false; nodes.len()];
    let mut best = vec![f64::INFINITY; nodes.len()];
    best[0] = 0.0;
    let mut total = 0.0;

    for _ in 0..nodes.len() {
        let mut next = None;
        for i in 0..nodes.len() {
            if !in_tree[i] && next.map_or(true, |j: usize| best[i] < best[j]) {
                next = Some(i);
            }
        }
        let Some(u) = next else { break };
        in_tree[u] = true;
        total += best[u];
        for v in 0..nodes.len() {
            if !in_tree[v] {
                let d = router.euclidean(nodes[u], nodes[v]);
                if d < best[v] {
                    best[v] = d;
                }
            }
        }
    }
    total
}

/// Lower bound on the distance from `current` through every node of
/// `remaining` and back to `depot`:
/// nearest hop in, spanning tree of the rest, nearest hop out.
pub fn remaining_distance_bound(
    router: &Router,
    current: NodeId,
    remaining: &[NodeId],
    depot: NodeId,
) -> f64 {
    if remaining.is_empty() {
        return router.euclidean(current, depot);
    }
    let nearest = |from: NodeId| {
        remaining
            .iter()
            .map(|&n| router.euclidean(from, n))
            .fold(f64::INFINITY, f64::min)
    };
    nearest(current) + euclidean_mst(router, remaining) + nearest(depot)
}
