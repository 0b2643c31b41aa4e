//! Helpers shared by the next-move heuristics.

use crate::evaluation::{RouteEvaluator, RouteState};
use crate::graph::Router;
use crate::models::{Point, PointKind, RoutePlan, Service};

/// Serves `point` next if that is feasible and the depot stays reachable
/// in time afterwards.
pub(crate) fn feasible_move(
    evaluator: &RouteEvaluator<'_>,
    state: &RouteState,
    point: &Point,
) -> Option<RouteState> {
    let next = evaluator.advance(state, point).ok()?;
    evaluator.can_close(&next).then_some(next)
}

/// Time margin left after serving `point` at `time`.
///
/// For a delivery this is its window end minus `time`. For a pickup it is
/// the delivery window end minus a straight-line estimate of the arrival
/// there, so a negative value flags a pickup whose delivery is likely late.
pub(crate) fn slack(router: &Router, service: &Service, point: &Point, time: f64) -> f64 {
    match point.kind() {
        PointKind::Pickup(_) => {
            let to_delivery = router.euclidean(point.node(), service.delivery().node());
            service.delivery().window().end() - (time + to_delivery)
        }
        _ => point.window().end() - time,
    }
}

/// Closes the route at the depot and evaluates it.
pub(crate) fn close(evaluator: &RouteEvaluator<'_>, mut stops: Vec<Point>) -> Option<RoutePlan> {
    stops.push(*evaluator.query().depot());
    evaluator.plan(stops)
}
