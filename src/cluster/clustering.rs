//! Clustering heuristic built on the ordering enumerator.
//!
//! Points are sorted by the midpoint of their time window and cut into small
//! consecutive clusters. Each cluster is repaired for capacity, all of its
//! orderings are enumerated, and every ordering is greedily appended to the
//! route built so far. The ordering serving the most, then cheapest in
//! distance plus LU cost, is committed before moving on.

use ordered_float::OrderedFloat;
use tracing::{debug, trace, warn};

use super::enumerator::{repair_capacity, ClusterEnumerator};
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::evaluation::{RouteEvaluator, RouteState};
use crate::graph::Router;
use crate::models::{Point, PointKind, Query, RequestId, RoutePlan};
use crate::Set;

/// Cluster-by-cluster constructive heuristic.
///
/// # Examples
///
/// ```
/// use optload::cluster::ClusterHeuristic;
/// use optload::config::ClusterConfig;
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
/// let plan = ClusterHeuristic::new(ClusterConfig::default())
///     .solve(&query, &Router::new(graph))
///     .unwrap()
///     .unwrap();
/// assert_eq!(plan.served(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClusterHeuristic {
    config: ClusterConfig,
}

#[derive(Debug, Clone)]
struct Committed {
    stops: Vec<Point>,
    state: RouteState,
}

impl ClusterHeuristic {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Builds one route. `Ok(None)` if the route cannot be closed at the
    /// depot.
    pub fn solve(&self, query: &Query, router: &Router) -> Result<Option<RoutePlan>> {
        let evaluator = RouteEvaluator::new(query, router);
        let clusters = self.clusters(query);
        debug!(query = query.id(), clusters = clusters.len(), "clusters formed");

        let mut route = Committed {
            stops: vec![*query.depot()],
            state: evaluator.start(),
        };

        for cluster in clusters {
            let cluster: Vec<Point> = cluster
                .iter()
                .filter(|p| match p.kind() {
                    PointKind::Delivery(r) => {
                        route.state.is_carried(r)
                            || cluster.iter().any(|x| x.kind() == PointKind::Pickup(r))
                    }
                    _ => true,
                })
                .copied()
                .collect();

            let repair = repair_capacity(
                query,
                &cluster,
                route.state.load(),
                self.config.repair_policy,
            )?;
            let orderings = ClusterEnumerator::new(query, repair.points)
                .with_carried(route.state.stack().clone())
                .with_lu_pruning(self.config.lu_pruning)
                .enumerate();

            let best = orderings
                .iter()
                .map(|o| append(&evaluator, &route, o.points()))
                .min_by_key(|c| {
                    (
                        -c.state.served(),
                        OrderedFloat(c.state.distance() + c.state.lu_cost() as f64),
                    )
                });
            if let Some(best) = best {
                route = best;
            }
        }

        let depot = query.depot();
        match evaluator.advance(&route.state, depot) {
            Ok(_) => {
                route.stops.push(*depot);
                Ok(evaluator.plan(route.stops))
            }
            Err(violation) => {
                warn!(query = query.id(), %violation, "route cannot return to depot");
                Ok(None)
            }
        }
    }

    /// Sorts all servable points by window midpoint and cuts them into
    /// clusters of at most `max_cluster_size` points. A new cluster also
    /// starts when the next window opens after every window of the current
    /// cluster has closed.
    fn clusters(&self, query: &Query) -> Vec<Vec<Point>> {
        let mut keyed = Vec::new();
        for service in query.services() {
            if service.quantity() > query.capacity() {
                debug!(query = query.id(), request = service.id(), "request exceeds capacity");
                continue;
            }
            let pickup_key = service.pickup().window().midpoint();
            let delivery_key = service.delivery().window().midpoint().max(pickup_key);
            keyed.push(((OrderedFloat(pickup_key), 0, service.id()), *service.pickup()));
            keyed.push(((OrderedFloat(delivery_key), 1, service.id()), *service.delivery()));
        }
        keyed.sort_by_key(|&(key, _)| key);

        let max = self.config.max_cluster_size.max(1);
        let mut clusters = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        let mut latest_end = f64::NEG_INFINITY;
        for (_, point) in keyed {
            if !current.is_empty() && (current.len() >= max || point.window().start() > latest_end) {
                clusters.push(std::mem::take(&mut current));
                latest_end = f64::NEG_INFINITY;
            }
            latest_end = latest_end.max(point.window().end());
            current.push(point);
        }
        if !current.is_empty() {
            clusters.push(current);
        }
        clusters
    }
}

/// Appends `points` to `base` one by one, skipping every stop that would
/// break feasibility or strand the vehicle away from the depot. Skipping a
/// pickup drops its request.
fn append(evaluator: &RouteEvaluator<'_>, base: &Committed, points: &[Point]) -> Committed {
    let mut route = base.clone();
    let mut skipped: Set<RequestId> = Set::default();
    for point in points {
        if let PointKind::Delivery(r) = point.kind() {
            if skipped.contains(&r) || !route.state.is_carried(r) {
                continue;
            }
        }
        match evaluator.advance(&route.state, point) {
            Ok(next) if evaluator.can_close(&next) => {
                route.state = next;
                route.stops.push(*point);
            }
            Ok(_) => {
                trace!(%point, "stop skipped, depot out of reach");
                if let PointKind::Pickup(r) = point.kind() {
                    skipped.insert(r);
                }
            }
            Err(violation) => {
                trace!(%point, %violation, "stop skipped");
                if let PointKind::Pickup(r) = point.kind() {
                    skipped.insert(r);
                }
            }
        }
    }
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepairPolicy;
    use crate::error::Error;
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
    fn test_clusters_respect_size_and_precedence() {
        let graph = line(8);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 10.0), 2, (0.0, 10.0), 1);
        b.request(3, (5.0, 15.0), 4, (0.0, 4.0), 1);
        b.request(5, (0.0, 100.0), 6, (0.0, 100.0), 1);
        let q = b.build(&graph).expect("valid");

        let h = ClusterHeuristic::default();
        let clusters = h.clusters(&q);
        assert!(clusters.iter().all(|c| c.len() <= 3));
        let flat: Vec<Point> = clusters.concat();
        assert_eq!(flat.len(), 6);
        for s in q.services() {
            let p = flat.iter().position(|x| x == s.pickup()).expect("pickup");
            let d = flat.iter().position(|x| x == s.delivery()).expect("delivery");
            assert!(p < d);
        }
    }

    #[test]
    fn test_temporal_gap_starts_cluster() {
        let graph = line(6);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 10.0), 2, (0.0, 10.0), 1);
        b.request(3, (100.0, 110.0), 4, (100.0, 110.0), 1);
        let q = b.build(&graph).expect("valid");
        let clusters = ClusterHeuristic::default().clusters(&q);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn test_serves_all_on_easy_instance() {
        let graph = line(8);
        let mut b = Query::builder(1);
        b.depot(0).capacity(10).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 2, (0.0, 1000.0), 2);
        b.request(3, (0.0, 1000.0), 4, (0.0, 1000.0), 3);
        b.request(5, (0.0, 1000.0), 6, (0.0, 1000.0), 1);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = ClusterHeuristic::default()
            .solve(&q, &r)
            .expect("no fault")
            .expect("plan");
        assert_eq!(plan.served(), 6);
        assert_eq!(find_crossing(plan.stops()), None);
        assert!(plan.stops().first().expect("stop").is_depot());
        assert!(plan.stops().last().expect("stop").is_depot());
    }

    #[test]
    fn test_oversized_request_skipped() {
        let graph = line(4);
        let mut b = Query::builder(1);
        b.depot(0).capacity(2).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 2, (0.0, 1000.0), 5);
        b.request(2, (0.0, 1000.0), 3, (0.0, 1000.0), 2);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let plan = ClusterHeuristic::default()
            .solve(&q, &r)
            .expect("no fault")
            .expect("plan");
        assert_eq!(plan.served(), 2);
    }

    #[test]
    fn test_reject_policy_surfaces_drop() {
        let graph = line(6);
        let mut b = Query::builder(4);
        b.depot(0).capacity(3).horizon(0.0, 1000.0);
        b.request(1, (0.0, 1000.0), 5, (0.0, 1000.0), 2);
        b.request(2, (0.0, 1000.0), 5, (0.0, 1000.0), 2);
        let q = b.build(&graph).expect("valid");
        let r = Router::new(graph);
        let h = ClusterHeuristic::new(ClusterConfig {
            repair_policy: RepairPolicy::Reject,
            max_cluster_size: 4,
            ..ClusterConfig::default()
        });
        assert!(matches!(
            h.solve(&q, &r),
            Err(Error::DemandDropped { query: 4, .. })
        ));

        let plan = ClusterHeuristic::new(ClusterConfig {
            max_cluster_size: 4,
            ..ClusterConfig::default()
        })
        .solve(&q, &r)
        .expect("no fault")
        .expect("plan");
        assert_eq!(plan.served(), 2);
    }
}
