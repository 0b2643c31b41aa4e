//! Solver output.

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use super::Point;

/// A finished tour: the stop sequence from depot to depot plus its metrics.
///
/// Plans are produced once by a solver and never mutated.
///
/// # Examples
///
/// ```
/// use optload::models::{Point, RoutePlan, TimeWindow};
///
/// let tw = TimeWindow::new(0.0, 100.0).unwrap();
/// let stops = vec![
///     Point::depot(0, tw),
///     Point::pickup(1, 4, tw),
///     Point::delivery(1, 9, tw),
///     Point::depot(0, tw),
/// ];
/// let plan = RoutePlan::new(stops, 5, 10, 12.0);
/// assert_eq!(
///     plan.to_string(),
///     "[Depot:0,S1:4,D1:9,Depot:0]\tserved:5\tlu:10\tdistance:12"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    stops: Vec<Point>,
    served: i64,
    lu_cost: i64,
    distance: f64,
}

impl RoutePlan {
    pub fn new(stops: Vec<Point>, served: i64, lu_cost: i64, distance: f64) -> Self {
        Self {
            stops,
            served,
            lu_cost,
            distance,
        }
    }

    /// Stops in visiting order, depot first and last.
    pub fn stops(&self) -> &[Point] {
        &self.stops
    }

    /// Quantity of fully delivered requests.
    pub fn served(&self) -> i64 {
        self.served
    }

    /// Accumulated loading/unloading cost.
    pub fn lu_cost(&self) -> i64 {
        self.lu_cost
    }

    /// Total travel distance.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Orders plans best first: more served, then shorter, then cheaper to
    /// load. `Ordering::Less` means `self` is better.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .served
            .cmp(&self.served)
            .then_with(|| self.distance.total_cmp(&other.distance))
            .then_with(|| self.lu_cost.cmp(&other.lu_cost))
    }

    /// Returns `true` if `self` ranks strictly before `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Less
    }
}

impl fmt::Display for RoutePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]\tserved:{}\tlu:{}\tdistance:{}",
            self.stops.iter().join(","),
            self.served,
            self.lu_cost,
            self.distance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;

    fn plan(served: i64, lu: i64, distance: f64) -> RoutePlan {
        let tw = TimeWindow::new(0.0, 1.0).expect("valid");
        RoutePlan::new(vec![Point::depot(0, tw), Point::depot(0, tw)], served, lu, distance)
    }

    #[test]
    fn test_rank_served_first() {
        assert!(plan(5, 100, 90.0).is_better_than(&plan(4, 0, 1.0)));
    }

    #[test]
    fn test_rank_distance_then_lu() {
        assert!(plan(5, 100, 10.0).is_better_than(&plan(5, 0, 11.0)));
        assert!(plan(5, 3, 10.0).is_better_than(&plan(5, 4, 10.0)));
        assert_eq!(plan(5, 3, 10.0).rank_cmp(&plan(5, 3, 10.0)), Ordering::Equal);
    }

    #[test]
    fn test_sort_best_first() {
        let mut plans = vec![plan(1, 0, 1.0), plan(3, 9, 7.0), plan(3, 1, 7.0)];
        plans.sort_by(RoutePlan::rank_cmp);
        assert_eq!(plans[0].lu_cost(), 1);
        assert_eq!(plans[2].served(), 1);
    }

    #[test]
    fn test_display_fractional_distance() {
        assert!(plan(0, 0, 2.5).to_string().ends_with("distance:2.5"));
    }
}
