//! Cluster ordering enumeration and the clustering heuristic.
//!
//! - [`ClusterEnumerator`] — all valid orderings of a small cluster, with an
//!   incremental LIFO lower bound on LU cost
//! - [`repair_capacity`] — greedy removal of small pickups until a cluster fits
//! - [`ClusterHeuristic`] — sorts, clusters, enumerates and appends

mod clustering;
mod enumerator;

pub use clustering::ClusterHeuristic;
pub use enumerator::{repair_capacity, CapacityRepair, ClusterEnumerator, ClusterOrdering};
