//! Greedy nearest-move heuristic.
//!
//! Starting at the depot, the vehicle repeatedly takes the cheapest legal
//! next move. Legal moves are the pickup of any request not yet picked and
//! the delivery of the request on top of the load stack. A move is scored as
//!
//! ```text
//! leg distance + wait_weight × waiting − size_weight × quantity
//!     + slack_weight × max(0, −slack)
//! ```
//!
//! so short legs, little idle time and large parcels are preferred, and moves
//! that are likely to make a later deadline are penalised. A pickup is only
//! legal if its delivery could still follow right after it.

use tracing::{debug, trace};

use super::moves::{close, feasible_move, slack};
use crate::config::GreedyNearestConfig;
use crate::evaluation::{RouteEvaluator, RouteState};
use crate::graph::Router;
use crate::models::{Point, Query, RoutePlan, Service};

#[derive(Debug)]
struct Move<'q> {
    point: Point,
    state: RouteState,
    service: &'q Service,
    score: f64,
}

fn score(
    router: &Router,
    config: &GreedyNearestConfig,
    from: &RouteState,
    to: &RouteState,
    service: &Service,
    point: &Point,
) -> f64 {
    let leg = to.distance() - from.distance();
    let late = (-slack(router, service, point, to.time())).max(0.0);
    leg + config.wait_weight * to.waiting() - config.size_weight * service.quantity() as f64
        + config.slack_weight * late
}

/// Builds one route by nearest-move selection.
pub fn greedy_nearest(
    query: &Query,
    router: &Router,
    config: &GreedyNearestConfig,
) -> Option<RoutePlan> {
    let evaluator = RouteEvaluator::new(query, router);
    let mut state = evaluator.start();
    let mut stops = vec![*query.depot()];

    loop {
        let mut best: Option<Move<'_>> = None;
        let mut consider = |point: Point, next: RouteState, service| {
            let score = score(router, config, &state, &next, service, &point);
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(Move {
                    point,
                    state: next,
                    service,
                    score,
                });
            }
        };

        if let Some(top) = state.stack().top() {
            if let Some(service) = query.service(top) {
                if let Some(next) = feasible_move(&evaluator, &state, service.delivery()) {
                    consider(*service.delivery(), next, service);
                }
            }
        }
        for service in query.services().filter(|s| !state.is_picked(s.id())) {
            let Some(next) = feasible_move(&evaluator, &state, service.pickup()) else {
                continue;
            };
            if feasible_move(&evaluator, &next, service.delivery()).is_none() {
                trace!(request = service.id(), "pickup skipped, delivery out of reach");
                continue;
            }
            consider(*service.pickup(), next, service);
        }

        let Some(chosen) = best else { break };
        trace!(point = %chosen.point, request = chosen.service.id(), score = chosen.score, "move taken");
        stops.push(chosen.point);
        state = chosen.state;
    }

    if !state.stack().is_empty() {
        debug!(
            query = query.id(),
            carried = state.stack().len(),
            "closing with undelivered requests on board"
        );
    }
    close(&evaluator, stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::find_crossing;
    use crate::graph::{ArrivalFn, Graph};
    use std::sync::Arc;

    fn line(n: usize) -> Arc<Graph> {
        let mut g = Graph::builder();
        for id in 0..n {
            g.add_node(id, id as f64, 0.0).expect("node");
        }
        for a in 0..n {
            for b in 0..n {
                if a != b {
                    let d = (a as f64 - b as f64).abs();
                    g.add_edge(a, b, d, ArrivalFn::Constant(d)).expect("edge");
                }
            }
        }
        g.build_shared()
    }

    #[test]
    fn test_single_request() {
        let graph = line(3);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 100.0);
        b.request(1, (0.0, 100.0), 2, (0.0, 100.0), 4);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = greedy_nearest(&q, &r, &GreedyNearestConfig::default()).expect("plan");
        assert_eq!(plan.served(), 4);
        assert_eq!(plan.stops().len(), 4);
        assert!((plan.distance() - 4.0).abs() < 1e-10);
        assert_eq!(plan.lu_cost(), 8);
    }

    #[test]
    fn test_serves_all_without_crossing() {
        let graph = line(8);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 4, (0.0, 1000.0), 2);
        b.request(2, (0.0, 1000.0), 6, (0.0, 1000.0), 3);
        b.request(3, (0.0, 1000.0), 7, (0.0, 1000.0), 1);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = greedy_nearest(&q, &r, &GreedyNearestConfig::default()).expect("plan");
        assert_eq!(plan.served(), 6);
        assert_eq!(find_crossing(plan.stops()), None);
        assert!(plan.stops().last().expect("stop").is_depot());
    }

    #[test]
    fn test_capacity_respected() {
        let graph = line(6);
        let mut b = Query::builder(1);
        b.depot(0).capacity(3).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 5, (0.0, 1000.0), 2);
        b.request(2, (0.0, 1000.0), 4, (0.0, 1000.0), 2);
        b.request(3, (0.0, 1000.0), 4, (0.0, 1000.0), 9);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = greedy_nearest(&q, &r, &GreedyNearestConfig::default()).expect("plan");
        assert_eq!(plan.served(), 4);
        let eval = RouteEvaluator::new(&q, &r).evaluate(plan.stops());
        assert!(eval.is_feasible());
    }

    #[test]
    fn test_late_delivery_never_picked() {
        let graph = line(6);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 100.0), 5, (0.0, 2.0), 1);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = greedy_nearest(&q, &r, &GreedyNearestConfig::default()).expect("plan");
        assert_eq!(plan.served(), 0);
        assert_eq!(plan.stops().len(), 2);
    }

    #[test]
    fn test_size_weight_prefers_large_parcel() {
        // Two pickups at the same node; the larger parcel is taken first and
        // therefore delivered last.
        let graph = line(4);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 2, (0.0, 1000.0), 1);
        b.request(1, (0.0, 1000.0), 3, (0.0, 1000.0), 5);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = greedy_nearest(&q, &r, &GreedyNearestConfig::default()).expect("plan");
        assert_eq!(plan.stops()[1].request(), Some(2));
    }
}
