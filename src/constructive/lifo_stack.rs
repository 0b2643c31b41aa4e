//! LIFO multi-stack heuristic.
//!
//! The vehicle is modelled as a few side-by-side compartments, each loaded
//! and unloaded from the top. A pickup goes onto the shallowest compartment.
//! A delivery may take an item from anywhere, but every item above it in its
//! compartment has to be moved out of the way and back; each such rehandle
//! costs `rehandling_penalty` both in the move score and in the LU cost.
//!
//! Because compartments are independent, delivery intervals may cross when
//! their requests sit in different compartments. The single-compartment
//! non-crossing rule does not apply to routes built here.
//!
//! # References
//!
//! Iori, M. & Martello, S. (2010). "Routing problems with loading
//! constraints", *TOP* 18(1), 4-27.

use tracing::{debug, trace};

use super::moves::{close, feasible_move, slack};
use crate::config::LifoStackConfig;
use crate::evaluation::{LoadStack, RouteEvaluator, RouteState};
use crate::graph::Router;
use crate::models::{Point, PointKind, Query, RequestId, RoutePlan};
use crate::Map;

/// Compartments of the vehicle and which one holds each carried request.
#[derive(Debug, Clone)]
struct Compartments {
    stacks: Vec<LoadStack>,
    slot: Map<RequestId, usize>,
}

impl Compartments {
    fn new(count: usize) -> Self {
        Self {
            stacks: vec![LoadStack::new(); count],
            slot: Map::default(),
        }
    }

    /// Index of the stack with the fewest items, lowest index on ties.
    fn shallowest(&self) -> usize {
        self.stacks
            .iter()
            .enumerate()
            .min_by_key(|(i, s)| (s.len(), *i))
            .map_or(0, |(i, _)| i)
    }

    fn push(&mut self, request: RequestId, quantity: i32) {
        let index = self.shallowest();
        self.stacks[index].push(request, quantity);
        self.slot.insert(request, index);
    }

    /// Items that must be moved to reach `request`.
    fn rehandles(&self, request: RequestId) -> Option<usize> {
        let index = *self.slot.get(&request)?;
        self.stacks[index].items_above(request)
    }

    fn remove(&mut self, request: RequestId) -> Option<usize> {
        let index = self.slot.remove(&request)?;
        self.stacks[index].remove(request).map(|(above, _)| above)
    }
}

/// Number of compartments for a vehicle of `capacity`.
fn stack_count(capacity: i32, config: &LifoStackConfig) -> usize {
    usize::try_from(capacity)
        .unwrap_or(0)
        .min(config.max_stacks)
        .max(config.min_stacks)
        .max(1)
}

#[derive(Debug)]
struct Move {
    point: Point,
    state: RouteState,
    rehandles: usize,
    score: f64,
}

/// Builds one route on a multi-compartment vehicle.
///
/// The returned plan's LU cost includes the rehandling penalties, so it is
/// not comparable to the single-compartment LU of the other strategies.
pub fn lifo_stack(query: &Query, router: &Router, config: &LifoStackConfig) -> Option<RoutePlan> {
    let evaluator = RouteEvaluator::new(query, router).with_lifo(false);
    let mut compartments = Compartments::new(stack_count(query.capacity(), config));
    let mut state = evaluator.start();
    let mut stops = vec![*query.depot()];
    let mut lu_cost: i64 = 0;
    let penalty = config.rehandling_penalty;

    loop {
        let mut best: Option<Move> = None;
        for service in query.services() {
            let (point, rehandles) = if !state.is_picked(service.id()) {
                (*service.pickup(), 0)
            } else if state.is_carried(service.id()) {
                let Some(rehandles) = compartments.rehandles(service.id()) else {
                    continue;
                };
                (*service.delivery(), rehandles)
            } else {
                continue;
            };

            let Some(next) = feasible_move(&evaluator, &state, &point) else {
                continue;
            };
            if point.is_pickup() && feasible_move(&evaluator, &next, service.delivery()).is_none() {
                continue;
            }
            let late = (-slack(router, service, &point, next.time())).max(0.0);
            let score = (next.distance() - state.distance())
                + config.wait_weight * next.waiting()
                + config.slack_weight * late
                + (penalty * rehandles as i64) as f64;
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(Move {
                    point,
                    state: next,
                    rehandles,
                    score,
                });
            }
        }

        let Some(chosen) = best else { break };
        match chosen.point.kind() {
            PointKind::Pickup(request) => {
                let quantity = query.quantity(request);
                compartments.push(request, quantity);
                lu_cost += i64::from(quantity);
            }
            PointKind::Delivery(request) => {
                let quantity = query.quantity(request);
                compartments.remove(request);
                lu_cost += i64::from(quantity)
                    + penalty * chosen.rehandles as i64
                    + 2 * i64::from(chosen.state.load());
                if chosen.rehandles > 0 {
                    debug!(request, rehandles = chosen.rehandles, "delivery rehandles items");
                }
            }
            PointKind::Depot => {}
        }
        trace!(point = %chosen.point, score = chosen.score, "move taken");
        stops.push(chosen.point);
        state = chosen.state;
    }

    let plan = close(&evaluator, stops)?;
    Some(RoutePlan::new(
        plan.stops().to_vec(),
        plan.served(),
        lu_cost,
        plan.distance(),
    ))
}
