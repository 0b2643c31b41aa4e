//! Spatial-temporal road graph and the router that queries it.
//!
//! - [`Graph`] / [`GraphBuilder`] — validated, read-only node and edge registry
//! - [`ArrivalFn`] — FIFO time-dependent arrival profile of an edge
//! - [`Router`] — A* shortest-distance legs with time propagation

mod edge;
mod network;
mod router;

pub use edge::{ArrivalFn, Edge};
pub use network::{Graph, GraphBuilder, Node};
pub use router::{Leg, Router};

/// Identifier of a graph node.
pub type NodeId = usize;
