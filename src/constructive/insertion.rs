//! Cheapest-insertion heuristics.
//!
//! # Algorithm
//!
//! The route starts as `[depot, depot]`. A request is inserted by trying
//! every pair of positions (pickup first, delivery anywhere after it),
//! evaluating each candidate route in full and keeping the feasible one
//! with the smallest increase in `distance + loading_weight × LU`.
//!
//! - [`insertion`] processes requests in order of pickup window start with
//!   `loading_weight = 1`.
//! - [`greedy_global`] picks, at each step, whichever remaining request has
//!   the cheapest best insertion.
//!
//! # Complexity
//!
//! O(n²) candidate routes per insertion, each evaluated in O(n) router
//! calls. Greedy global repeats this for every remaining request per step.

use tracing::trace;

use crate::config::GreedyGlobalConfig;
use crate::evaluation::{RouteEvaluation, RouteEvaluator};
use crate::graph::Router;
use crate::models::{Point, Query, RequestId, RoutePlan, Service};

/// Scores closer than this count as tied.
const TIE_EPS: f64 = 1e-9;

/// A feasible route with one more request inserted.
#[derive(Debug, Clone)]
pub(crate) struct Insertion {
    pub stops: Vec<Point>,
    pub evaluation: RouteEvaluation,
    pub score: f64,
}

impl Insertion {
    /// Lower score wins; on a tie the shorter route wins.
    fn beats(&self, other: &Insertion) -> bool {
        if (self.score - other.score).abs() < TIE_EPS {
            self.evaluation.distance < other.evaluation.distance - TIE_EPS
        } else {
            self.score < other.score
        }
    }
}

/// Best feasible insertion of `service` into `stops`, whose evaluation is
/// `base`.
pub(crate) fn best_insertion(
    evaluator: &RouteEvaluator<'_>,
    stops: &[Point],
    base: &RouteEvaluation,
    service: &Service,
    loading_weight: f64,
) -> Option<Insertion> {
    let mut best: Option<Insertion> = None;
    for i in 1..stops.len() {
        for j in i..stops.len() {
            let mut candidate = Vec::with_capacity(stops.len() + 2);
            candidate.extend_from_slice(&stops[..i]);
            candidate.push(*service.pickup());
            candidate.extend_from_slice(&stops[i..j]);
            candidate.push(*service.delivery());
            candidate.extend_from_slice(&stops[j..]);

            let evaluation = evaluator.evaluate(&candidate);
            if !evaluation.is_feasible() {
                continue;
            }
            let score = (evaluation.distance - base.distance)
                + loading_weight * (evaluation.lu_cost - base.lu_cost) as f64;
            let insertion = Insertion {
                stops: candidate,
                evaluation,
                score,
            };
            if best.as_ref().map_or(true, |b| insertion.beats(b)) {
                best = Some(insertion);
            }
        }
    }
    best
}

fn empty_route(query: &Query) -> Vec<Point> {
    vec![*query.depot(), *query.depot()]
}

/// Inserts requests one by one in order of pickup window start, each at its
/// cheapest feasible position pair. Requests with no feasible position are
/// left out.
///
/// # Examples
///
/// ```
/// use optload::constructive::insertion;
/// use optload::graph::{ArrivalFn, Graph, Router};
/// use optload::models::Query;
///
/// let mut g = Graph::builder();
/// g.add_node(0, 0.0, 0.0).unwrap();
/// g.add_node(1, 3.0, 0.0).unwrap();
/// g.add_node(2, 3.0, 4.0).unwrap();
/// g.add_edge(0, 1, 3.0, ArrivalFn::Instant).unwrap();
/// g.add_edge(1, 2, 4.0, ArrivalFn::Instant).unwrap();
/// g.add_edge(2, 0, 5.0, ArrivalFn::Instant).unwrap();
/// let graph = g.build_shared();
///
/// let mut b = Query::builder(1);
/// b.depot(0).capacity(10).horizon(0.0, 1000.0);
/// b.request(1, (0.0, 100.0), 2, (0.0, 200.0), 5);
/// let query = b.build(&graph).unwrap();
///
/// let plan = insertion(&query, &Router::new(graph)).unwrap();
/// assert_eq!(plan.served(), 5);
/// assert_eq!(plan.lu_cost(), 10);
/// ```
pub fn insertion(query: &Query, router: &Router) -> Option<RoutePlan> {
    let evaluator = RouteEvaluator::new(query, router);
    let mut services: Vec<&Service> = query.services().collect();
    services.sort_by(|a, b| {
        a.pickup()
            .window()
            .start()
            .total_cmp(&b.pickup().window().start())
            .then(a.id().cmp(&b.id()))
    });

    let mut stops = empty_route(query);
    let mut base = evaluator.evaluate(&stops);
    if !base.is_feasible() {
        return None;
    }

    for service in services {
        match best_insertion(&evaluator, &stops, &base, service, 1.0) {
            Some(ins) => {
                stops = ins.stops;
                base = ins.evaluation;
            }
            None => trace!(request = service.id(), "no feasible insertion"),
        }
    }
    evaluator.plan(stops)
}

/// Repeatedly inserts whichever remaining request has the cheapest best
/// insertion under `distance + loading_weight × LU`, ties broken by the
/// shorter resulting route.
pub fn greedy_global(query: &Query, router: &Router, config: &GreedyGlobalConfig) -> Option<RoutePlan> {
    let evaluator = RouteEvaluator::new(query, router);
    let mut remaining: Vec<&Service> = query.services().collect();

    let mut stops = empty_route(query);
    let mut base = evaluator.evaluate(&stops);
    if !base.is_feasible() {
        return None;
    }

    loop {
        let mut best: Option<(RequestId, Insertion)> = None;
        for service in &remaining {
            let Some(ins) = best_insertion(&evaluator, &stops, &base, service, config.loading_weight)
            else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, b)| ins.beats(b)) {
                best = Some((service.id(), ins));
            }
        }

        let Some((id, ins)) = best else { break };
        trace!(request = id, score = ins.score, "request inserted");
        remaining.retain(|s| s.id() != id);
        stops = ins.stops;
        base = ins.evaluation;
    }
    evaluator.plan(stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::find_crossing;
    use crate::graph::{ArrivalFn, Graph};
    use std::sync::Arc;

    fn complete(coords: &[(f64, f64)]) -> Arc<Graph> {
        let mut g = Graph::builder();
        for (id, &(x, y)) in coords.iter().enumerate() {
            g.add_node(id, x, y).expect("node");
        }
        for (a, &(ax, ay)) in coords.iter().enumerate() {
            for (b, &(bx, by)) in coords.iter().enumerate() {
                if a != b {
                    let d = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
                    g.add_edge(a, b, d, ArrivalFn::Constant(d)).expect("edge");
                }
            }
        }
        g.build_shared()
    }

    fn instance(capacity: i32) -> (Query, Router) {
        let graph = complete(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (4.0, 1.0),
            (6.0, 0.0),
            (8.0, 1.0),
            (1.0, 5.0),
            (3.0, 6.0),
        ]);
        let mut b = Query::builder(1);
        b.depot(0).capacity(capacity).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 3, (0.0, 1000.0), 2);
        b.request(2, (0.0, 1000.0), 4, (0.0, 1000.0), 1);
        b.request(5, (0.0, 1000.0), 6, (0.0, 1000.0), 3);
        (b.build(&graph).expect("valid"), Router::new(graph))
    }

    #[test]
    fn test_insertion_serves_all() {
        let (q, r) = instance(10);
        let plan = insertion(&q, &r).expect("plan");
        assert_eq!(plan.served(), 6);
        assert_eq!(plan.stops().len(), 8);
        assert_eq!(find_crossing(plan.stops()), None);
        let eval = RouteEvaluator::new(&q, &r).evaluate(plan.stops());
        assert!((eval.distance - plan.distance()).abs() < 1e-10);
    }

    #[test]
    fn test_greedy_global_serves_all() {
        let (q, r) = instance(10);
        let plan = greedy_global(&q, &r, &GreedyGlobalConfig::default()).expect("plan");
        assert_eq!(plan.served(), 6);
        assert_eq!(find_crossing(plan.stops()), None);
    }

    #[test]
    fn test_capacity_skips_request() {
        let (q, r) = instance(2);
        let plan = insertion(&q, &r).expect("plan");
        // Request 3 needs 3 units.
        assert!(plan.stops().iter().all(|p| p.request() != Some(3)));
        assert_eq!(plan.served(), 3);
    }

    #[test]
    fn test_best_insertion_into_empty_route() {
        let (q, r) = instance(10);
        let ev = RouteEvaluator::new(&q, &r);
        let stops = empty_route(&q);
        let base = ev.evaluate(&stops);
        let s = q.service(1).expect("request");
        let ins = best_insertion(&ev, &stops, &base, s, 1.0).expect("feasible");
        assert_eq!(ins.stops.len(), 4);
        // 2 + 4 + 6 distance, LU 2 + 2.
        assert!((ins.score - 16.0).abs() < 1e-10);
    }

    fn scored(score: f64, distance: f64) -> Insertion {
        Insertion {
            stops: Vec::new(),
            evaluation: RouteEvaluation {
                distance,
                lu_cost: 0,
                served: 0,
                end_time: 0.0,
                violation: None,
            },
            score,
        }
    }

    #[test]
    fn test_near_equal_scores_prefer_shorter_route() {
        let long = scored(10.0, 30.0);
        let short = scored(10.0 + 1e-12, 20.0);
        assert!(short.beats(&long));
        assert!(!long.beats(&short));

        // A real score gap still decides.
        let cheaper = scored(9.0, 40.0);
        assert!(cheaper.beats(&short));
        assert!(!scored(10.0, 20.0).beats(&scored(10.0, 20.0)));
    }

    #[test]
    fn test_unreachable_request_left_out() {
        let mut g = Graph::builder();
        g.add_node(0, 0.0, 0.0).expect("node");
        g.add_node(1, 1.0, 0.0).expect("node");
        g.add_node(2, 2.0, 0.0).expect("node");
        g.add_bidirectional_edge(0, 1, 1.0, ArrivalFn::Instant)
            .expect("edge");
        let graph = g.build_shared();
        let mut b = Query::builder(1);
        b.depot(0).capacity(5).horizon(0.0, 100.0);
        b.request(1, (0.0, 100.0), 2, (0.0, 100.0), 1);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = insertion(&q, &r).expect("plan");
        assert_eq!(plan.served(), 0);
        assert_eq!(plan.stops().len(), 2);
    }
}
