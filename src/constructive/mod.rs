//! Constructive heuristics that grow a single route.
//!
//! - [`insertion`] — cheapest pair insertion in pickup-window order, O(n³) evaluations
//! - [`greedy_global`] — global best insertion with weighted LU cost, O(n⁴) evaluations
//! - [`greedy_nearest`] — nearest next move under the LIFO rule, O(n²) legs
//! - [`lifo_stack`] — nearest next move on a multi-compartment vehicle, O(n²) legs
//!
//! Every heuristic returns `None` only when even the empty route
//! `[depot, depot]` is infeasible.

mod greedy_nearest;
mod insertion;
mod lifo_stack;
mod moves;

pub use greedy_nearest::greedy_nearest;
pub use insertion::{greedy_global, insertion};
pub use lifo_stack::lifo_stack;
