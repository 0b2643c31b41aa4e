//! Time-dependent shortest-distance router.
//!
//! # Algorithm
//!
//! A* over the graph where the accumulated cost is *distance*. Time is carried
//! alongside: whenever a node's best distance improves, its arrival time is
//! recomputed by applying the edge's arrival function to the arrival time
//! recorded at the predecessor. Time therefore follows the shortest path, not
//! the earliest-arrival path. Under FIFO arrival functions (enforced by
//! [`GraphBuilder`](super::GraphBuilder)) the arrival recorded this way is
//! the arrival of actually driving the returned path.
//!
//! The heuristic is the straight-line distance to the destination, which is
//! admissible as long as no edge is shorter than the straight line between
//! its endpoints.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::trace;

use super::{Graph, NodeId};
use crate::Map;

/// Result of routing one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    /// Length of the shortest path.
    pub distance: f64,
    /// Arrival time at the destination when departing at the requested time.
    pub arrival: f64,
}

#[derive(Debug, Clone, Copy)]
struct Label {
    distance: f64,
    arrival: f64,
}

#[derive(Debug, PartialEq, Eq)]
struct Frontier {
    priority: OrderedFloat<f64>,
    node: NodeId,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest-leg oracle shared by every strategy.
///
/// # Examples
///
/// ```
/// use optload::graph::{ArrivalFn, Graph, Router};
///
/// let mut b = Graph::builder();
/// b.add_node(0, 0.0, 0.0).unwrap();
/// b.add_node(1, 3.0, 0.0).unwrap();
/// b.add_node(2, 3.0, 4.0).unwrap();
/// b.add_edge(0, 1, 3.0, ArrivalFn::Constant(3.0)).unwrap();
/// b.add_edge(1, 2, 4.0, ArrivalFn::Constant(4.0)).unwrap();
/// let router = Router::new(b.build_shared());
///
/// let leg = router.shortest_leg(0, 2, 10.0).unwrap();
/// assert_eq!(leg.distance, 7.0);
/// assert_eq!(leg.arrival, 17.0);
/// assert!(router.shortest_leg(2, 0, 10.0).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    graph: Arc<Graph>,
}

impl Router {
    /// Creates a router over a shared graph.
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Straight-line distance between two nodes; `0.0` if either is unknown.
    pub fn euclidean(&self, a: NodeId, b: NodeId) -> f64 {
        self.graph.euclidean_distance(a, b).unwrap_or(0.0)
    }

    /// Shortest-distance leg from `src` to `dst` departing at `departure`.
    ///
    /// Returns `None` if either node is unknown or `dst` is unreachable.
    pub fn shortest_leg(&self, src: NodeId, dst: NodeId, departure: f64) -> Option<Leg> {
        let target = self.graph.node(dst)?;
        let source = self.graph.node(src)?;

        let mut labels: Map<NodeId, Label> = Map::default();
        let mut heap = BinaryHeap::new();

        labels.insert(
            src,
            Label {
                distance: 0.0,
                arrival: departure,
            },
        );
        heap.push(Frontier {
            priority: OrderedFloat(source.euclidean_distance(target)),
            node: src,
        });

        while let Some(Frontier { priority, node }) = heap.pop() {
            let Some(&label) = labels.get(&node) else {
                continue;
            };
            if node == dst {
                return Some(Leg {
                    distance: label.distance,
                    arrival: label.arrival,
                });
            }
            let Some(current) = self.graph.node(node) else {
                continue;
            };
            // Stale entry: the node was improved after this push.
            if priority.0 > label.distance + current.euclidean_distance(target) {
                continue;
            }

            for edge in current.edges() {
                let child = edge.to();
                let tentative = label.distance + edge.distance();
                let improves = labels.get(&child).map_or(true, |l| tentative < l.distance);
                if !improves {
                    continue;
                }
                let Some(child_node) = self.graph.node(child) else {
                    continue;
                };
                labels.insert(
                    child,
                    Label {
                        distance: tentative,
                        arrival: edge.arrival(label.arrival),
                    },
                );
                heap.push(Frontier {
                    priority: OrderedFloat(tentative + child_node.euclidean_distance(target)),
                    node: child,
                });
            }
        }

        trace!(src, dst, departure, "destination unreachable");
        None
    }
}
