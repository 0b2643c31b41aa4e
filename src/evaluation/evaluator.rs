//! Route evaluator that computes timing, load, LU cost and feasibility.

use tracing::trace;

use super::loading::{delivery_lu, pickup_lu, LoadStack};
use crate::graph::{NodeId, Router};
use crate::models::{Point, PointKind, Query, RequestId, RoutePlan, Violation, ViolationType};
use crate::Set;

/// Vehicle state after serving a prefix of a route.
///
/// Produced by [`RouteEvaluator::start`] and advanced one stop at a time by
/// [`RouteEvaluator::advance`], which returns a new state and leaves the old
/// one untouched. Search procedures keep states per branch.
#[derive(Debug, Clone)]
pub struct RouteState {
    node: NodeId,
    arrival: f64,
    time: f64,
    distance: f64,
    load: i32,
    lu_cost: i64,
    served: i64,
    stack: LoadStack,
    picked: Set<RequestId>,
    delivered: Set<RequestId>,
    position: usize,
}

impl RouteState {
    /// Current node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Arrival time at the current stop, before any waiting.
    pub fn arrival(&self) -> f64 {
        self.arrival
    }

    /// Service start time at the current stop.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Time spent waiting for the current stop's window to open.
    pub fn waiting(&self) -> f64 {
        self.time - self.arrival
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn load(&self) -> i32 {
        self.load
    }

    pub fn lu_cost(&self) -> i64 {
        self.lu_cost
    }

    /// Quantity delivered so far.
    pub fn served(&self) -> i64 {
        self.served
    }

    /// Freight on board in loading order.
    pub fn stack(&self) -> &LoadStack {
        &self.stack
    }

    pub fn is_picked(&self, request: RequestId) -> bool {
        self.picked.contains(&request)
    }

    pub fn is_delivered(&self, request: RequestId) -> bool {
        self.delivered.contains(&request)
    }

    /// Picked up but not yet delivered.
    pub fn is_carried(&self, request: RequestId) -> bool {
        self.is_picked(request) && !self.is_delivered(request)
    }

    /// Index of the current stop in the route.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Outcome of evaluating a full stop sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEvaluation {
    /// Total travel distance, `f64::INFINITY` when infeasible.
    pub distance: f64,
    pub lu_cost: i64,
    /// Quantity of requests whose delivery was reached.
    pub served: i64,
    /// Service start at the final stop.
    pub end_time: f64,
    /// First violation found, if any.
    pub violation: Option<Violation>,
}

impl RouteEvaluation {
    pub fn is_feasible(&self) -> bool {
        self.violation.is_none()
    }
}

/// Evaluates stop sequences against a query: routing every leg, checking
/// time windows, the horizon, capacity, precedence and the LIFO
/// compartment, and accumulating distance and LU cost.
///
/// # Examples
///
/// ```
/// use optload::evaluation::RouteEvaluator;
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
/// let router = Router::new(graph);
///
/// let s = query.service(1).unwrap();
/// let stops = [*query.depot(), *s.pickup(), *s.delivery(), *query.depot()];
/// let eval = RouteEvaluator::new(&query, &router).evaluate(&stops);
/// assert!(eval.is_feasible());
/// assert_eq!(eval.distance, 12.0);
/// assert_eq!(eval.served, 5);
/// assert_eq!(eval.lu_cost, 10);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RouteEvaluator<'a> {
    query: &'a Query,
    router: &'a Router,
    lifo: bool,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates an evaluator enforcing the single-compartment LIFO rule.
    pub fn new(query: &'a Query, router: &'a Router) -> Self {
        Self {
            query,
            router,
            lifo: true,
        }
    }

    /// Enables or disables the LIFO rule. Multi-compartment vehicles allow
    /// unloading from below and pay for it elsewhere.
    pub fn with_lifo(mut self, lifo: bool) -> Self {
        self.lifo = lifo;
        self
    }

    pub fn query(&self) -> &'a Query {
        self.query
    }

    pub fn router(&self) -> &'a Router {
        self.router
    }

    /// State at the depot at the start of the horizon.
    pub fn start(&self) -> RouteState {
        let depot = self.query.depot();
        RouteState {
            node: depot.node(),
            arrival: self.query.start(),
            time: depot.window().service_start(self.query.start()),
            distance: 0.0,
            load: 0,
            lu_cost: 0,
            served: 0,
            stack: LoadStack::new(),
            picked: Set::default(),
            delivered: Set::default(),
            position: 0,
        }
    }

    /// Drives from the current stop to `point` and serves it.
    pub fn advance(&self, state: &RouteState, point: &Point) -> Result<RouteState, Violation> {
        let position = state.position + 1;
        let fail = |kind| Err(Violation::new(position, kind));

        let Some(leg) = self
            .router
            .shortest_leg(state.node, point.node(), state.time)
        else {
            return fail(ViolationType::Unreachable {
                from: state.node,
                to: point.node(),
            });
        };

        let time = point.window().service_start(leg.arrival);
        if time > self.query.end() {
            return fail(ViolationType::HorizonExceeded {
                time,
                end: self.query.end(),
            });
        }
        if point.window().is_violated(time) {
            return fail(ViolationType::TimeWindowViolated {
                time,
                end: point.window().end(),
            });
        }

        let mut next = state.clone();
        next.node = point.node();
        next.arrival = leg.arrival;
        next.time = time;
        next.distance += leg.distance;
        next.position = position;

        match point.kind() {
            PointKind::Depot => {}
            PointKind::Pickup(request) => {
                let Some(service) = self.query.service(request) else {
                    return fail(ViolationType::UnknownRequest { request });
                };
                if !next.picked.insert(request) {
                    return fail(ViolationType::DuplicateVisit { request });
                }
                let quantity = service.quantity();
                // `load` never exceeds capacity here, so the difference cannot
                // overflow.
                if quantity > self.query.capacity() - next.load {
                    return fail(ViolationType::CapacityExceeded {
                        load: i64::from(next.load) + i64::from(quantity),
                        capacity: self.query.capacity(),
                    });
                }
                next.load += quantity;
                next.lu_cost += pickup_lu(quantity);
                next.stack.push(request, quantity);
            }
            PointKind::Delivery(request) => {
                let Some(service) = self.query.service(request) else {
                    return fail(ViolationType::UnknownRequest { request });
                };
                if next.delivered.contains(&request) {
                    return fail(ViolationType::DuplicateVisit { request });
                }
                if !next.picked.contains(&request) {
                    return fail(ViolationType::PrecedenceViolated { request });
                }
                if self.lifo {
                    if let Some(blocking) = next.stack.top().filter(|&t| t != request) {
                        return fail(ViolationType::CrossingIntervals { request, blocking });
                    }
                }
                next.stack.remove(request);
                let quantity = service.quantity();
                next.load -= quantity;
                if next.load < 0 {
                    return fail(ViolationType::NegativeLoad { load: next.load });
                }
                next.lu_cost += delivery_lu(quantity, i64::from(next.load));
                next.served += i64::from(quantity);
                next.delivered.insert(request);
            }
        }
        Ok(next)
    }

    /// Returns `true` if the depot can still be reached in time from `state`.
    pub fn can_close(&self, state: &RouteState) -> bool {
        self.advance(state, self.query.depot()).is_ok()
    }

    /// Evaluates a full sequence that must start and end at the depot.
    pub fn evaluate(&self, stops: &[Point]) -> RouteEvaluation {
        let infeasible = |state: &RouteState, violation: Violation| {
            trace!(query = self.query.id(), %violation, "route rejected");
            RouteEvaluation {
                distance: f64::INFINITY,
                lu_cost: state.lu_cost,
                served: state.served,
                end_time: state.time,
                violation: Some(violation),
            }
        };

        let mut state = self.start();
        let anchored = stops.len() >= 2
            && stops
                .first()
                .is_some_and(|p| p.is_depot() && p.node() == state.node)
            && stops.last().is_some_and(Point::is_depot);
        if !anchored {
            return infeasible(&state, Violation::new(0, ViolationType::NotAnchoredAtDepot));
        }

        for point in &stops[1..] {
            match self.advance(&state, point) {
                Ok(next) => state = next,
                Err(violation) => return infeasible(&state, violation),
            }
        }

        RouteEvaluation {
            distance: state.distance,
            lu_cost: state.lu_cost,
            served: state.served,
            end_time: state.time,
            violation: None,
        }
    }

    /// Evaluates `stops` and wraps them into a plan if feasible.
    pub fn plan(&self, stops: Vec<Point>) -> Option<RoutePlan> {
        let eval = self.evaluate(&stops);
        eval.is_feasible()
            .then(|| RoutePlan::new(stops, eval.served, eval.lu_cost, eval.distance))
    }
}
