//! Domain model types for pickup-and-delivery routing with loading costs.
//!
//! Provides the core abstractions: time windows, depot/pickup/delivery
//! points, requests grouped into a single-vehicle query, finished route
//! plans, and the violations that make a stop sequence infeasible.

mod plan;
mod point;
mod query;
mod time_window;
mod violation;

pub use plan::RoutePlan;
pub use point::{Point, PointKind};
pub use query::{Query, QueryBuilder, RequestId, Service};
pub use time_window::TimeWindow;
pub use violation::{Violation, ViolationType};
