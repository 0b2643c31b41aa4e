//! Crate error type.
//!
//! Ordinary infeasibility (an unreachable leg, a missed time window, an
//! overfull vehicle) is never an error: solvers discard the candidate and
//! carry on. Errors are reserved for malformed input detected while building a
//! [`Graph`](crate::graph::Graph) or [`Query`](crate::models::Query), and for
//! internal-consistency faults that must abort the current query.

use crate::graph::NodeId;
use crate::models::RequestId;

/// Errors raised while ingesting instances or running a solver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A node id was referenced that the graph does not contain.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// A node id was registered twice.
    #[error("node {0} registered twice")]
    DuplicateNode(NodeId),

    /// An edge carries a negative or non-finite distance.
    #[error("edge {from} -> {to} has invalid distance {distance}")]
    NegativeDistance {
        from: NodeId,
        to: NodeId,
        distance: f64,
    },

    /// An edge's arrival profile lets a later departure arrive earlier.
    #[error("edge {from} -> {to} has a non-FIFO travel time profile")]
    NonFifoProfile { from: NodeId, to: NodeId },

    /// A query block was finished without a depot.
    #[error("query {query} has no depot")]
    MissingDepot { query: usize },

    /// A query declares a negative vehicle capacity.
    #[error("query {query} has negative capacity {capacity}")]
    NegativeCapacity { query: usize, capacity: i32 },

    /// A time window is empty or non-finite.
    #[error("invalid time window [{start}, {end}]")]
    InvalidTimeWindow { start: f64, end: f64 },

    /// A request carries a non-positive quantity.
    #[error("request quantity must be positive, got {quantity}")]
    InvalidQuantity { quantity: i32 },

    /// Cluster capacity repair ran out of pickups to remove while the cluster
    /// still overflows. Indicates a bug in earlier feasibility reasoning.
    #[error("capacity repair found no removable pickup in query {query}")]
    CapacityRepairFailed { query: usize },

    /// Capacity repair had to drop a request and the configured policy
    /// forbids silent demand loss.
    #[error("request {request} dropped by capacity repair in query {query}")]
    DemandDropped { query: usize, request: RequestId },

    /// A strategy name did not match any known strategy.
    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),

    /// Solver configuration could not be parsed.
    #[error("invalid solver configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
