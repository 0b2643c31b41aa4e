//! Exact branch-and-bound solver.
//!
//! - [`ExactSolver`] — depth-first search with demand and distance bounds
//! - [`euclidean_mst`], [`remaining_distance_bound`] — admissible distance bound

mod bnb;
mod bound;

pub use bnb::{ExactSolver, SearchOutcome, SearchStatistics};
pub use bound::{euclidean_mst, remaining_distance_bound};
