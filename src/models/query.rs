//! Problem instances: requests and the query that groups them.

use std::collections::BTreeMap;

use tracing::debug;

use super::{Point, TimeWindow};
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};

/// Identifier of a pickup-delivery request, unique within a query.
pub type RequestId = usize;

/// One pickup-delivery request.
///
/// Both endpoints carry the request's id, so a [`Point`] always leads back to
/// the service that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    id: RequestId,
    pickup: Point,
    delivery: Point,
    quantity: i32,
}

impl Service {
    /// Request id.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Loading stop.
    pub fn pickup(&self) -> &Point {
        &self.pickup
    }

    /// Unloading stop.
    pub fn delivery(&self) -> &Point {
        &self.delivery
    }

    /// Load occupied between pickup and delivery.
    pub fn quantity(&self) -> i32 {
        self.quantity
    }
}

/// A single-vehicle problem instance.
///
/// Built through [`QueryBuilder`], which validates every field against the
/// graph and assigns request ids `1, 2, ...` in insertion order.
///
/// # Examples
///
/// ```
/// use optload::graph::Graph;
/// use optload::models::Query;
///
/// let mut g = Graph::builder();
/// for id in 0..3 {
///     g.add_node(id, id as f64, 0.0).unwrap();
/// }
/// let graph = g.build();
///
/// let mut b = Query::builder(7);
/// b.depot(0).capacity(10).horizon(0.0, 500.0);
/// b.request(1, (0.0, 100.0), 2, (0.0, 200.0), 4);
/// let query = b.build(&graph).unwrap();
///
/// assert_eq!(query.id(), 7);
/// assert_eq!(query.num_requests(), 1);
/// let s = query.service(1).unwrap();
/// assert_eq!(s.pickup().request(), Some(1));
/// assert_eq!(s.delivery().node(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    id: usize,
    depot: Point,
    capacity: i32,
    horizon: TimeWindow,
    services: BTreeMap<RequestId, Service>,
}

impl Query {
    /// Starts building a query.
    pub fn builder(id: usize) -> QueryBuilder {
        QueryBuilder::new(id)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Depot point; its window is the query horizon.
    pub fn depot(&self) -> &Point {
        &self.depot
    }

    /// Vehicle capacity.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn horizon(&self) -> &TimeWindow {
        &self.horizon
    }

    /// Start of the horizon.
    pub fn start(&self) -> f64 {
        self.horizon.start()
    }

    /// End of the horizon.
    pub fn end(&self) -> f64 {
        self.horizon.end()
    }

    /// Looks up a request.
    pub fn service(&self, id: RequestId) -> Option<&Service> {
        self.services.get(&id)
    }

    /// Requests in id order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// Quantity of a request, `0` if unknown.
    pub fn quantity(&self, id: RequestId) -> i32 {
        self.services.get(&id).map_or(0, |s| s.quantity)
    }

    pub fn num_requests(&self) -> usize {
        self.services.len()
    }

    /// Sum of all request quantities.
    pub fn total_quantity(&self) -> i64 {
        self.services.values().map(|s| i64::from(s.quantity)).sum()
    }
}

#[derive(Debug, Clone)]
struct RawRequest {
    pickup_node: NodeId,
    pickup_window: (f64, f64),
    delivery_node: NodeId,
    delivery_window: (f64, f64),
    quantity: i32,
}

/// Collects the raw fields of a query and validates them in
/// [`build`](QueryBuilder::build).
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    id: usize,
    depot: Option<NodeId>,
    capacity: i32,
    horizon: (f64, f64),
    requests: Vec<RawRequest>,
}

impl QueryBuilder {
    /// New builder with zero capacity and horizon `[0, f64::MAX]`.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            depot: None,
            capacity: 0,
            horizon: (0.0, f64::MAX),
            requests: Vec::new(),
        }
    }

    pub fn depot(&mut self, node: NodeId) -> &mut Self {
        self.depot = Some(node);
        self
    }

    pub fn capacity(&mut self, capacity: i32) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn horizon(&mut self, start: f64, end: f64) -> &mut Self {
        self.horizon = (start, end);
        self
    }

    /// Adds a request. Ids are assigned sequentially from 1.
    pub fn request(
        &mut self,
        pickup_node: NodeId,
        pickup_window: (f64, f64),
        delivery_node: NodeId,
        delivery_window: (f64, f64),
        quantity: i32,
    ) -> &mut Self {
        self.requests.push(RawRequest {
            pickup_node,
            pickup_window,
            delivery_node,
            delivery_window,
            quantity,
        });
        self
    }

    /// Validates the collected fields against `graph`.
    ///
    /// Fails on a missing depot, a negative capacity, an empty or non-finite
    /// window, a non-positive quantity, or a node the graph does not know.
    pub fn build(&self, graph: &Graph) -> Result<Query> {
        let depot_node = self.depot.ok_or(Error::MissingDepot { query: self.id })?;
        if self.capacity < 0 {
            return Err(Error::NegativeCapacity {
                query: self.id,
                capacity: self.capacity,
            });
        }
        let horizon = window(self.horizon)?;
        let depot = Point::depot(known(graph, depot_node)?, horizon);

        let mut services = BTreeMap::new();
        for (index, raw) in self.requests.iter().enumerate() {
            let id = index + 1;
            if raw.quantity <= 0 {
                return Err(Error::InvalidQuantity {
                    quantity: raw.quantity,
                });
            }
            let pickup = Point::pickup(
                id,
                known(graph, raw.pickup_node)?,
                window(raw.pickup_window)?,
            );
            let delivery = Point::delivery(
                id,
                known(graph, raw.delivery_node)?,
                window(raw.delivery_window)?,
            );
            services.insert(
                id,
                Service {
                    id,
                    pickup,
                    delivery,
                    quantity: raw.quantity,
                },
            );
        }

        debug!(
            query = self.id,
            requests = services.len(),
            capacity = self.capacity,
            "query built"
        );
        Ok(Query {
            id: self.id,
            depot,
            capacity: self.capacity,
            horizon,
            services,
        })
    }
}

fn window((start, end): (f64, f64)) -> Result<TimeWindow> {
    TimeWindow::new(start, end).ok_or(Error::InvalidTimeWindow { start, end })
}

fn known(graph: &Graph, node: NodeId) -> Result<NodeId> {
    if graph.contains(node) {
        Ok(node)
    } else {
        Err(Error::UnknownNode(node))
    }
}
