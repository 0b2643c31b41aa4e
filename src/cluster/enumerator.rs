//! Cluster-local ordering enumeration and capacity repair.
//!
//! # Algorithm
//!
//! Backtracking over every interleaving of a cluster's points. A pickup may
//! be placed whenever it is unused; a delivery once its pickup was placed,
//! or right away if its request was loaded in an earlier cluster. A running
//! load counter, started at the load already on board, cuts partial orders
//! that overflow the vehicle.
//!
//! In parallel a load stack is simulated. Each delivery adds the number of
//! requests loaded above it to a lower bound on the ordering's LU cost: every
//! such request is still on board afterwards and adds at least 2 to the
//! rehandling term. With LU pruning enabled a partial order is abandoned
//! once this bound reaches the best complete LU cost found so far.

use tracing::{debug, error};

use crate::config::RepairPolicy;
use crate::error::{Error, Result};
use crate::evaluation::{delivery_lu, pickup_lu, LoadStack};
use crate::models::{Point, PointKind, Query, RequestId};
use crate::Set;

/// One complete ordering of a cluster with its LU cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOrdering {
    points: Vec<Point>,
    lu_cost: i64,
}

impl ClusterOrdering {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// LU cost of the ordering, charged against the absolute on-board load.
    pub fn lu_cost(&self) -> i64 {
        self.lu_cost
    }
}

/// Enumerates the precedence- and capacity-valid orderings of a cluster.
///
/// # Examples
///
/// ```
/// use optload::cluster::ClusterEnumerator;
/// use optload::graph::Graph;
/// use optload::models::Query;
///
/// let mut g = Graph::builder();
/// for id in 0..5 {
///     g.add_node(id, id as f64, 0.0).unwrap();
/// }
/// let graph = g.build();
/// let mut b = Query::builder(1);
/// b.depot(0).capacity(2).horizon(0.0, 100.0);
/// b.request(1, (0.0, 100.0), 2, (0.0, 100.0), 1);
/// b.request(3, (0.0, 100.0), 4, (0.0, 100.0), 1);
/// let query = b.build(&graph).unwrap();
///
/// let points: Vec<_> = query
///     .services()
///     .flat_map(|s| [*s.pickup(), *s.delivery()])
///     .collect();
/// let orderings = ClusterEnumerator::new(&query, points)
///     .with_lu_pruning(false)
///     .enumerate();
/// assert_eq!(orderings.len(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct ClusterEnumerator<'a> {
    query: &'a Query,
    points: Vec<Point>,
    carried: LoadStack,
    lu_pruning: bool,
}

#[derive(Debug, Clone)]
struct Partial {
    order: Vec<usize>,
    used: Vec<bool>,
    stack: LoadStack,
    load: i64,
    lu_cost: i64,
    bound: i64,
}

struct Enumeration {
    orderings: Vec<ClusterOrdering>,
    best_lu: Option<i64>,
}

impl<'a> ClusterEnumerator<'a> {
    /// Creates an enumerator over `points` with an empty vehicle and LU
    /// pruning enabled.
    pub fn new(query: &'a Query, points: Vec<Point>) -> Self {
        Self {
            query,
            points,
            carried: LoadStack::new(),
            lu_pruning: true,
        }
    }

    /// Freight already on board when the cluster starts.
    pub fn with_carried(mut self, carried: LoadStack) -> Self {
        self.carried = carried;
        self
    }

    pub fn with_lu_pruning(mut self, lu_pruning: bool) -> Self {
        self.lu_pruning = lu_pruning;
        self
    }

    /// All valid orderings, in discovery order.
    ///
    /// Deliveries whose request is neither picked up inside the cluster nor
    /// on board are ignored.
    pub fn enumerate(&self) -> Vec<ClusterOrdering> {
        let points: Vec<Point> = self
            .points
            .iter()
            .filter(|p| match p.kind() {
                PointKind::Delivery(r) => self.carried.contains(r) || self.pickup_index(r).is_some(),
                _ => true,
            })
            .copied()
            .collect();
        if points.is_empty() {
            return Vec::new();
        }

        let mut run = Enumeration {
            orderings: Vec::new(),
            best_lu: None,
        };
        let root = Partial {
            order: Vec::with_capacity(points.len()),
            used: vec![false; points.len()],
            stack: self.carried.clone(),
            load: self.carried.load(),
            lu_cost: 0,
            bound: 0,
        };
        self.extend(&points, root, &mut run);
        run.orderings
    }

    fn pickup_index(&self, request: RequestId) -> Option<usize> {
        self.points
            .iter()
            .position(|p| p.kind() == PointKind::Pickup(request))
    }

    fn extend(&self, points: &[Point], partial: Partial, run: &mut Enumeration) {
        if self.lu_pruning && run.best_lu.is_some_and(|best| partial.bound >= best) {
            return;
        }
        if partial.order.len() == points.len() {
            run.best_lu = Some(run.best_lu.map_or(partial.lu_cost, |b| b.min(partial.lu_cost)));
            run.orderings.push(ClusterOrdering {
                points: partial.order.iter().map(|&i| points[i]).collect(),
                lu_cost: partial.lu_cost,
            });
            return;
        }

        for (i, point) in points.iter().enumerate() {
            if partial.used[i] {
                continue;
            }
            let mut child = partial.clone();
            match point.kind() {
                PointKind::Depot => {}
                PointKind::Pickup(r) => {
                    let quantity = self.query.quantity(r);
                    child.load += i64::from(quantity);
                    if child.load > i64::from(self.query.capacity()) {
                        continue;
                    }
                    child.stack.push(r, quantity);
                    child.lu_cost += pickup_lu(quantity);
                }
                PointKind::Delivery(r) => {
                    let Some((above, quantity)) = child.stack.remove(r) else {
                        // Pickup not placed yet.
                        continue;
                    };
                    child.load -= i64::from(quantity);
                    child.bound += above as i64;
                    child.lu_cost += delivery_lu(quantity, child.load);
                }
            }
            child.used[i] = true;
            child.order.push(i);
            self.extend(points, child, run);
        }
    }
}

/// Outcome of [`repair_capacity`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityRepair {
    /// Remaining points in their original order.
    pub points: Vec<Point>,
    /// Requests removed, in removal order.
    pub dropped: Vec<RequestId>,
}

/// Greedy capacity repair of a cluster.
///
/// While visiting `points` in the given order, starting with `carried_load`
/// on board, would overflow the vehicle, removes the pickup with the
/// smallest quantity together with its delivery. Not optimality-preserving.
///
/// Fails with [`Error::CapacityRepairFailed`] if the overflow persists with
/// no pickup left to remove, and with [`Error::DemandDropped`] on the first
/// removal under [`RepairPolicy::Reject`].
pub fn repair_capacity(
    query: &Query,
    points: &[Point],
    carried_load: i32,
    policy: RepairPolicy,
) -> Result<CapacityRepair> {
    let mut points = points.to_vec();
    let mut dropped = Vec::new();

    while overflows(query, &points, carried_load) {
        let smallest = points
            .iter()
            .filter_map(|p| match p.kind() {
                PointKind::Pickup(r) => Some(r),
                _ => None,
            })
            .min_by_key(|&r| (query.quantity(r), r));

        let Some(request) = smallest else {
            error!(
                query = query.id(),
                carried_load,
                capacity = query.capacity(),
                "capacity repair found no removable pickup"
            );
            return Err(Error::CapacityRepairFailed { query: query.id() });
        };

        if policy == RepairPolicy::Reject {
            return Err(Error::DemandDropped {
                query: query.id(),
                request,
            });
        }
        debug!(query = query.id(), request, "capacity repair dropped request");
        points.retain(|p| p.request() != Some(request));
        dropped.push(request);
    }

    Ok(CapacityRepair { points, dropped })
}

fn overflows(query: &Query, points: &[Point], carried_load: i32) -> bool {
    let capacity = i64::from(query.capacity());
    let mut load = i64::from(carried_load);
    if load > capacity {
        return true;
    }
    let mut loaded = Set::default();
    for p in points {
        match p.kind() {
            PointKind::Pickup(r) => {
                load += i64::from(query.quantity(r));
                loaded.insert(r);
            }
            PointKind::Delivery(r) => {
                let from_earlier_cluster = !points.iter().any(|x| x.kind() == PointKind::Pickup(r));
                if loaded.contains(&r) || from_earlier_cluster {
                    load -= i64::from(query.quantity(r));
                }
            }
            PointKind::Depot => {}
        }
        if load > capacity {
            return true;
        }
    }
    false
}
