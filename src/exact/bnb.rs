//! Depth-first branch-and-bound over pickup/delivery interleavings.
//!
//! # Algorithm
//!
//! Each search node is a [`RouteState`] plus the stops that led to it. From a
//! node the search branches on the pickup of every request not yet picked
//! and on the delivery of the request on top of the load stack; every branch
//! is checked by [`RouteEvaluator::advance`]. Whenever the vehicle is empty
//! the node may also close the tour at the depot, which yields a candidate
//! plan (so requests that can never be served simply stay unserved).
//!
//! Two bounds cut the tree:
//!
//! - **demand**: a node whose served quantity plus everything still
//!   servable falls short of the incumbent cannot catch up;
//! - **distance**: a node that can at best tie the incumbent on served
//!   quantity is cut when its distance plus
//!   [`remaining_distance_bound`] already reaches the incumbent's distance.
//!
//! Child nodes own their state, so sibling branches never share mutable
//! data.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::bound::remaining_distance_bound;
use crate::config::ExactConfig;
use crate::evaluation::{RouteEvaluator, RouteState};
use crate::graph::{NodeId, Router};
use crate::models::{Point, Query, RoutePlan, Service};

/// Counters collected during one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStatistics {
    pub nodes_explored: u64,
    pub pruned_by_demand: u64,
    pub pruned_by_distance: u64,
    /// Branches rejected by the feasibility model.
    pub rejected_moves: u64,
    /// Number of times the incumbent improved.
    pub incumbent_updates: u64,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Result of one search: the best plan found and how the search went.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub plan: Option<RoutePlan>,
    pub statistics: SearchStatistics,
}

/// Exact single-vehicle solver.
///
/// # Examples
///
/// ```
/// use optload::config::ExactConfig;
/// use optload::exact::ExactSolver;
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
/// let outcome = ExactSolver::new(ExactConfig::default()).search(&query, &Router::new(graph));
/// let plan = outcome.plan.unwrap();
/// assert_eq!(plan.to_string(), "[Depot:0,S1:1,D1:2,Depot:0]\tserved:5\tlu:10\tdistance:12");
/// assert!(!outcome.statistics.timed_out);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExactSolver {
    config: ExactConfig,
}

impl ExactSolver {
    pub fn new(config: ExactConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExactConfig {
        &self.config
    }

    /// Searches the whole tree, or until the time limit expires, and returns
    /// the incumbent.
    pub fn search(&self, query: &Query, router: &Router) -> SearchOutcome {
        let evaluator = RouteEvaluator::new(query, router);
        let mut search = Search {
            evaluator,
            requests: query.services().collect(),
            depot: query.depot().node(),
            clock: Clock::new(self.config.time_limit(), self.config.check_interval),
            incumbent: None,
            stats: SearchStatistics::default(),
            stopped: false,
        };

        let root = SearchNode {
            state: evaluator.start(),
            stops: vec![*query.depot()],
        };
        search.explore(root);

        let mut stats = search.stats;
        stats.elapsed = search.clock.elapsed();
        debug!(
            query = query.id(),
            nodes = stats.nodes_explored,
            pruned_demand = stats.pruned_by_demand,
            pruned_distance = stats.pruned_by_distance,
            updates = stats.incumbent_updates,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "branch-and-bound finished"
        );
        SearchOutcome {
            plan: search.incumbent,
            statistics: stats,
        }
    }
}

/// Deadline checked every `interval` explored nodes.
#[derive(Debug)]
struct Clock {
    start: Instant,
    limit: Option<Duration>,
    interval: u64,
}

impl Clock {
    fn new(limit: Option<Duration>, interval: u64) -> Self {
        Self {
            start: Instant::now(),
            limit,
            interval: interval.max(1),
        }
    }

    fn expired(&self, steps: u64) -> bool {
        match self.limit {
            Some(limit) => steps % self.interval == 0 && self.start.elapsed() >= limit,
            None => false,
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[derive(Debug, Clone)]
struct SearchNode {
    state: RouteState,
    stops: Vec<Point>,
}

struct Search<'a> {
    evaluator: RouteEvaluator<'a>,
    requests: Vec<&'a Service>,
    depot: NodeId,
    clock: Clock,
    incumbent: Option<RoutePlan>,
    stats: SearchStatistics,
    stopped: bool,
}

impl Search<'_> {
    fn explore(&mut self, node: SearchNode) {
        if self.stopped {
            return;
        }
        self.stats.nodes_explored += 1;
        if self.clock.expired(self.stats.nodes_explored) {
            warn!(
                query = self.evaluator.query().id(),
                nodes = self.stats.nodes_explored,
                "time limit reached, returning incumbent"
            );
            self.stats.timed_out = true;
            self.stopped = true;
            return;
        }

        if node.state.load() == 0 {
            self.try_close(&node);
        }
        if self.prune(&node.state) {
            return;
        }

        for i in 0..self.requests.len() {
            let service = self.requests[i];
            let id = service.id();
            let point = if !node.state.is_picked(id) {
                service.pickup()
            } else if node.state.is_carried(id) && node.state.stack().can_deliver(id) {
                service.delivery()
            } else {
                continue;
            };

            match self.evaluator.advance(&node.state, point) {
                Ok(state) => {
                    let mut stops = node.stops.clone();
                    stops.push(*point);
                    self.explore(SearchNode { state, stops });
                }
                Err(violation) => {
                    self.stats.rejected_moves += 1;
                    trace!(%violation, "branch rejected");
                }
            }
        }
    }

    fn try_close(&mut self, node: &SearchNode) {
        let depot = self.evaluator.query().depot();
        let Ok(closed) = self.evaluator.advance(&node.state, depot) else {
            return;
        };
        let mut stops = node.stops.clone();
        stops.push(*depot);
        let plan = RoutePlan::new(stops, closed.served(), closed.lu_cost(), closed.distance());
        if self
            .incumbent
            .as_ref()
            .map_or(true, |best| plan.is_better_than(best))
        {
            debug!(
                served = plan.served(),
                distance = plan.distance(),
                lu = plan.lu_cost(),
                "new incumbent"
            );
            self.stats.incumbent_updates += 1;
            self.incumbent = Some(plan);
        }
    }

    /// Returns `true` if no completion of `state` can beat the incumbent.
    fn prune(&mut self, state: &RouteState) -> bool {
        let Some(best) = &self.incumbent else {
            return false;
        };
        let capacity = self.evaluator.query().capacity();

        let mut reachable = state.served();
        let mut remaining = Vec::new();
        for service in &self.requests {
            let id = service.id();
            if state.is_carried(id) {
                reachable += i64::from(service.quantity());
                remaining.push(service.delivery().node());
            } else if !state.is_picked(id) && service.quantity() <= capacity {
                reachable += i64::from(service.quantity());
                remaining.push(service.pickup().node());
                remaining.push(service.delivery().node());
            }
        }

        if reachable < best.served() {
            self.stats.pruned_by_demand += 1;
            return true;
        }
        if reachable == best.served() {
            let bound = remaining_distance_bound(
                self.evaluator.router(),
                state.node(),
                &remaining,
                self.depot,
            );
            if state.distance() + bound >= best.distance() {
                self.stats.pruned_by_distance += 1;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::find_crossing;
    use crate::graph::{ArrivalFn, Graph};
    use std::sync::Arc;

    /// Complete graph over the given coordinates with straight-line edges.
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

    fn single_request() -> (Query, Router) {
        let mut g = Graph::builder();
        g.add_node(0, 0.0, 0.0).expect("node");
        g.add_node(1, 3.0, 0.0).expect("node");
        g.add_node(2, 3.0, 4.0).expect("node");
        g.add_edge(0, 1, 3.0, ArrivalFn::Instant).expect("edge");
        g.add_edge(1, 2, 4.0, ArrivalFn::Instant).expect("edge");
        g.add_edge(2, 0, 5.0, ArrivalFn::Instant).expect("edge");
        let graph = g.build_shared();
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 100.0), 2, (0.0, 200.0), 5);
        (b.build(&graph).expect("valid"), Router::new(graph))
    }

    #[test]
    fn test_single_request_plan() {
        let (q, r) = single_request();
        let outcome = ExactSolver::default().search(&q, &r);
        let plan = outcome.plan.expect("plan");
        assert_eq!(plan.stops().len(), 4);
        assert!(plan.stops()[1].is_pickup());
        assert!(plan.stops()[2].is_delivery());
        assert!((plan.distance() - 12.0).abs() < 1e-10);
        assert_eq!(plan.served(), 5);
        assert_eq!(plan.lu_cost(), 10);
        assert!(outcome.statistics.incumbent_updates >= 2);
    }

    #[test]
    fn test_crossing_optimum_rejected() {
        // Convex pentagon: following the hull (S1, S2, D1, D2) is the
        // shortest tour but crosses; the nested S1, S2, D2, D1 must win.
        let graph = complete(&[(0.0, 0.0), (0.0, 10.0), (10.0, 15.0), (20.0, 10.0), (20.0, 0.0)]);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 3, (0.0, 1000.0), 1);
        b.request(2, (0.0, 1000.0), 4, (0.0, 1000.0), 1);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);

        let ev = RouteEvaluator::new(&q, &r);
        let s1 = q.service(1).expect("request");
        let s2 = q.service(2).expect("request");
        let crossing = [
            *q.depot(),
            *s1.pickup(),
            *s2.pickup(),
            *s1.delivery(),
            *s2.delivery(),
            *q.depot(),
        ];
        assert!(!ev.evaluate(&crossing).is_feasible());
        let crossing_length = 10.0 + 125f64.sqrt() * 2.0 + 10.0 + 20.0;

        let plan = ExactSolver::default().search(&q, &r).plan.expect("plan");
        assert_eq!(plan.served(), 2);
        assert_eq!(find_crossing(plan.stops()), None);
        let nested_length = 20.0 + 125f64.sqrt() + 325f64.sqrt() + 500f64.sqrt();
        assert!((plan.distance() - nested_length).abs() < 1e-9);
        assert!(plan.distance() > crossing_length);
        assert_eq!(plan.stops()[1].request(), Some(1));
        assert_eq!(plan.stops()[3], *s2.delivery());
        let eval = ev.evaluate(plan.stops());
        assert!(eval.is_feasible());
        assert_eq!(eval.lu_cost, plan.lu_cost());
    }

    #[test]
    fn test_oversized_request_unserved() {
        let graph = complete(&[(0.0, 0.0), (3.0, 0.0), (3.0, 4.0), (0.0, 4.0)]);
        let mut b = Query::builder(1);
        b.depot(0).capacity(4).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 2, (0.0, 1000.0), 7);
        b.request(2, (0.0, 1000.0), 3, (0.0, 1000.0), 2);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);

        let plan = ExactSolver::default().search(&q, &r).plan.expect("plan");
        assert_eq!(plan.served(), 2);
        assert!(plan.stops().iter().all(|p| p.request() != Some(1)));
        assert!(plan.stops().first().expect("stop").is_depot());
        assert!(plan.stops().last().expect("stop").is_depot());
    }

    #[test]
    fn test_only_oversized_request() {
        let (_, r) = single_request();
        let mut b = Query::builder(2);
        b.depot(0).capacity(1).horizon(0.0, 1000.0);
        b.request(1, (0.0, 100.0), 2, (0.0, 200.0), 5);
        let q = b.build(r.graph()).expect("valid");
        let plan = ExactSolver::default().search(&q, &r).plan.expect("plan");
        assert_eq!(plan.served(), 0);
        assert_eq!(plan.stops().len(), 2);
        assert_eq!(plan.distance(), 0.0);
    }

    #[test]
    fn test_time_windows_force_order() {
        let graph = complete(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0), (2.0, 2.0)]);
        let mut b = Query::builder(1);
        b.depot(0).capacity(1).horizon(0.0, 1000.0);
        // Request 2 must be served late, request 1 early.
        b.request(1, (0.0, 20.0), 2, (0.0, 30.0), 1);
        b.request(2, (100.0, 120.0), 4, (100.0, 200.0), 1);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = ExactSolver::default().search(&q, &r).plan.expect("plan");
        assert_eq!(plan.served(), 2);
        assert_eq!(plan.stops()[1].request(), Some(1));
        assert!(RouteEvaluator::new(&q, &r).evaluate(plan.stops()).is_feasible());
    }

    #[test]
    fn test_zero_time_limit_still_returns_incumbent() {
        let (q, r) = single_request();
        let solver = ExactSolver::new(ExactConfig {
            time_limit_secs: Some(0.0),
            check_interval: 1,
        });
        let outcome = solver.search(&q, &r);
        assert!(outcome.statistics.timed_out);
        assert_eq!(outcome.statistics.nodes_explored, 1);
        assert!(outcome.plan.is_none());
    }

    #[test]
    fn test_pruning_counts() {
        let graph = complete(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 1.0),
            (3.0, 0.0),
            (4.0, 1.0),
            (5.0, 0.0),
            (6.0, 1.0),
        ]);
        let mut b = Query::builder(1);
        b.depot(0).capacity(3).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 2, (0.0, 1000.0), 1);
        b.request(2, (0.0, 1000.0), 4, (0.0, 1000.0), 1);
        b.request(3, (0.0, 1000.0), 6, (0.0, 1000.0), 1);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let outcome = ExactSolver::default().search(&q, &r);
        assert_eq!(outcome.plan.expect("plan").served(), 3);
        assert!(outcome.statistics.pruned_by_distance > 0);
    }
}
