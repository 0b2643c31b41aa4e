//! Node registry and graph construction.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ArrivalFn, Edge, NodeId};
use crate::error::{Error, Result};
use crate::Map;

/// A graph node with planar coordinates and its outgoing edges.
///
/// # Examples
///
/// ```
/// use optload::graph::Node;
///
/// let a = Node::new(0, 0.0, 0.0);
/// let b = Node::new(1, 3.0, 4.0);
/// assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    x: f64,
    y: f64,
    edges: Vec<Edge>,
}

impl Node {
    /// Creates a node without edges.
    pub fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            edges: Vec::new(),
        }
    }

    /// Node identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// X-coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y-coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Outgoing edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Straight-line distance to another node.
    pub fn euclidean_distance(&self, other: &Node) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Immutable registry of nodes and their time-dependent outgoing edges.
///
/// Built once through [`GraphBuilder`] and shared read-only afterwards,
/// typically behind an [`Arc`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Map<NodeId, Node>,
}

impl Graph {
    /// Starts building a graph.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns `true` if the graph contains the node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed edges.
    pub fn num_edges(&self) -> usize {
        self.nodes.values().map(|n| n.edges.len()).sum()
    }

    /// Iterates over all nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Straight-line distance between two nodes, if both exist.
    pub fn euclidean_distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        Some(self.node(a)?.euclidean_distance(self.node(b)?))
    }
}

/// Validating builder for [`Graph`].
///
/// # Examples
///
/// ```
/// use optload::graph::{ArrivalFn, Graph};
///
/// let mut builder = Graph::builder();
/// builder.add_node(0, 0.0, 0.0).unwrap();
/// builder.add_node(1, 3.0, 4.0).unwrap();
/// builder.add_edge(0, 1, 5.0, ArrivalFn::Constant(5.0)).unwrap();
/// assert!(builder.add_edge(0, 9, 1.0, ArrivalFn::Instant).is_err());
///
/// let graph = builder.build();
/// assert_eq!(graph.num_nodes(), 2);
/// assert_eq!(graph.num_edges(), 1);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Map<NodeId, Node>,
}

impl GraphBuilder {
    /// Registers a node.
    pub fn add_node(&mut self, id: NodeId, x: f64, y: f64) -> Result<&mut Self> {
        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }
        self.nodes.insert(id, Node::new(id, x, y));
        Ok(self)
    }

    /// Adds a directed edge between two registered nodes.
    ///
    /// Rejects negative or non-finite distances and non-FIFO arrival
    /// functions. An edge shorter than the straight line between its
    /// endpoints is accepted but logged, since it weakens the router's
    /// heuristic.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        distance: f64,
        arrival: ArrivalFn,
    ) -> Result<&mut Self> {
        if !self.nodes.contains_key(&to) {
            return Err(Error::UnknownNode(to));
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::NegativeDistance { from, to, distance });
        }
        if !arrival.is_fifo() {
            return Err(Error::NonFifoProfile { from, to });
        }
        let straight = match (self.nodes.get(&from), self.nodes.get(&to)) {
            (Some(a), Some(b)) => a.euclidean_distance(b),
            _ => return Err(Error::UnknownNode(from)),
        };
        if distance + 1e-9 < straight {
            warn!(from, to, distance, straight, "edge shorter than straight line");
        }
        if let Some(node) = self.nodes.get_mut(&from) {
            node.edges.push(Edge::new(from, to, distance, arrival));
        }
        Ok(self)
    }

    /// Adds edges in both directions with the same distance and arrival
    /// function.
    pub fn add_bidirectional_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        distance: f64,
        arrival: ArrivalFn,
    ) -> Result<&mut Self> {
        self.add_edge(a, b, distance, arrival.clone())?;
        self.add_edge(b, a, distance, arrival)
    }

    /// Finishes the graph.
    pub fn build(self) -> Graph {
        let graph = Graph { nodes: self.nodes };
        debug!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "graph built"
        );
        graph
    }

    /// Finishes the graph behind a shared handle.
    pub fn build_shared(self) -> Arc<Graph> {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GraphBuilder {
        let mut b = Graph::builder();
        b.add_node(0, 0.0, 0.0).expect("node");
        b.add_node(1, 3.0, 0.0).expect("node");
        b.add_node(2, 3.0, 4.0).expect("node");
        b
    }

    #[test]
    fn test_duplicate_node() {
        let mut b = triangle();
        assert!(matches!(b.add_node(1, 9.0, 9.0), Err(Error::DuplicateNode(1))));
    }

    #[test]
    fn test_unknown_endpoints() {
        let mut b = triangle();
        assert!(matches!(
            b.add_edge(7, 1, 1.0, ArrivalFn::Instant),
            Err(Error::UnknownNode(7))
        ));
        assert!(matches!(
            b.add_edge(1, 7, 1.0, ArrivalFn::Instant),
            Err(Error::UnknownNode(7))
        ));
    }

    #[test]
    fn test_invalid_distance() {
        let mut b = triangle();
        assert!(matches!(
            b.add_edge(0, 1, -1.0, ArrivalFn::Instant),
            Err(Error::NegativeDistance { .. })
        ));
        assert!(b.add_edge(0, 1, f64::INFINITY, ArrivalFn::Instant).is_err());
    }

    #[test]
    fn test_non_fifo_rejected() {
        let mut b = triangle();
        let f = ArrivalFn::piecewise(vec![(0.0, 50.0), (10.0, 5.0)]);
        assert!(matches!(
            b.add_edge(0, 1, 3.0, f),
            Err(Error::NonFifoProfile { from: 0, to: 1 })
        ));
    }

    #[test]
    fn test_build_and_lookup() {
        let mut b = triangle();
        b.add_bidirectional_edge(0, 1, 3.0, ArrivalFn::Instant)
            .expect("edge");
        b.add_edge(1, 2, 4.0, ArrivalFn::Constant(4.0)).expect("edge");
        let g = b.build();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 3);
        assert!(g.contains(2));
        assert!(!g.contains(3));
        assert_eq!(g.node(1).expect("node").edges().len(), 2);
        assert!((g.euclidean_distance(0, 2).expect("both exist") - 5.0).abs() < 1e-10);
        assert!(g.euclidean_distance(0, 9).is_none());
    }
}
