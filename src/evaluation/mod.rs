//! Route evaluation: feasibility checking and cost computation.
//!
//! - [`RouteEvaluator`] — routes each leg and checks windows, horizon,
//!   capacity, precedence and the LIFO compartment
//! - [`LoadStack`] — on-board freight in loading order
//! - [`find_crossing`] — non-crossing check on a bare stop sequence

mod evaluator;
mod loading;

pub use evaluator::{RouteEvaluation, RouteEvaluator, RouteState};
pub use loading::{delivery_lu, find_crossing, pickup_lu, LoadStack};
