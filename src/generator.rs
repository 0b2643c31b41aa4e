//! Seeded synthetic instances.
//!
//! Builds a grid road network with bidirectional edges and random queries on
//! it. The same seed always yields the same instance.
//!
//! ```
//! use optload::generator::InstanceGenerator;
//!
//! let instance = InstanceGenerator::new(42)
//!     .with_grid(3, 3)
//!     .with_queries(2)
//!     .with_requests(3)
//!     .generate()
//!     .unwrap();
//! assert_eq!(instance.graph.num_nodes(), 9);
//! assert_eq!(instance.queries.len(), 2);
//! assert!(instance.queries.iter().all(|q| q.num_requests() == 3));
//! ```

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::Result;
use crate::graph::{ArrivalFn, Graph, NodeId};
use crate::models::Query;

/// A road network and queries on it.
#[derive(Debug, Clone)]
pub struct Instance {
    pub graph: Arc<Graph>,
    pub queries: Vec<Query>,
}

/// Builder-style generator of grid instances.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    seed: u64,
    rows: usize,
    cols: usize,
    spacing: f64,
    speed: f64,
    rush_hour: bool,
    queries: usize,
    requests: usize,
    capacity: i32,
    max_quantity: i32,
    horizon: f64,
    window_width: f64,
}

impl InstanceGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rows: 4,
            cols: 4,
            spacing: 10.0,
            speed: 1.0,
            rush_hour: false,
            queries: 1,
            requests: 4,
            capacity: 10,
            max_quantity: 4,
            horizon: 1_000.0,
            window_width: 200.0,
        }
    }

    pub fn with_grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
        self
    }

    /// Edge length between neighbouring grid nodes.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Distance covered per time unit outside rush hour.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Slows every edge down by half during a rush hour in the first
    /// quarter of the horizon.
    pub fn with_rush_hour(mut self, rush_hour: bool) -> Self {
        self.rush_hour = rush_hour;
        self
    }

    pub fn with_queries(mut self, queries: usize) -> Self {
        self.queries = queries;
        self
    }

    /// Requests per query.
    pub fn with_requests(mut self, requests: usize) -> Self {
        self.requests = requests;
        self
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Quantities are drawn uniformly from `1..=max_quantity`.
    pub fn with_max_quantity(mut self, max_quantity: i32) -> Self {
        self.max_quantity = max_quantity.max(1);
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Width of every pickup window. Delivery windows are twice as wide.
    pub fn with_window_width(mut self, width: f64) -> Self {
        self.window_width = width;
        self
    }

    pub fn generate(&self) -> Result<Instance> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let graph = self.grid()?;
        let queries = (1..=self.queries)
            .map(|id| self.query(id, &graph, &mut rng))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            seed = self.seed,
            nodes = graph.num_nodes(),
            queries = queries.len(),
            "instance generated"
        );
        Ok(Instance { graph, queries })
    }

    fn node_id(&self, row: usize, col: usize) -> NodeId {
        row * self.cols + col
    }

    fn arrival_fn(&self) -> ArrivalFn {
        let base = self.spacing / self.speed;
        if !self.rush_hour {
            return ArrivalFn::Constant(base);
        }
        // The ramp down is kept longer than the extra delay so the profile
        // stays FIFO.
        let extra = base * 0.5;
        let start = self.horizon * 0.1;
        let peak = start + (self.horizon * 0.1).max(extra);
        let end = peak + (self.horizon * 0.1).max(2.0 * extra);
        ArrivalFn::piecewise(vec![(start, base), (peak, base + extra), (end, base)])
    }

    fn grid(&self) -> Result<Arc<Graph>> {
        let mut b = Graph::builder();
        for row in 0..self.rows {
            for col in 0..self.cols {
                b.add_node(
                    self.node_id(row, col),
                    col as f64 * self.spacing,
                    row as f64 * self.spacing,
                )?;
            }
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let from = self.node_id(row, col);
                if col + 1 < self.cols {
                    b.add_bidirectional_edge(
                        from,
                        self.node_id(row, col + 1),
                        self.spacing,
                        self.arrival_fn(),
                    )?;
                }
                if row + 1 < self.rows {
                    b.add_bidirectional_edge(
                        from,
                        self.node_id(row + 1, col),
                        self.spacing,
                        self.arrival_fn(),
                    )?;
                }
            }
        }
        Ok(b.build_shared())
    }

    fn query(&self, id: usize, graph: &Graph, rng: &mut StdRng) -> Result<Query> {
        let nodes = graph.num_nodes();
        let mut b = Query::builder(id);
        b.depot(rng.random_range(0..nodes))
            .capacity(self.capacity)
            .horizon(0.0, self.horizon);

        let latest_start = (self.horizon * 0.5).max(0.0);
        for _ in 0..self.requests {
            let pickup = rng.random_range(0..nodes);
            let mut delivery = rng.random_range(0..nodes);
            if nodes > 1 && delivery == pickup {
                delivery = (delivery + 1) % nodes;
            }
            let start = rng.random_range(0.0..=latest_start);
            let pickup_end = (start + self.window_width).min(self.horizon);
            let delivery_end = (start + 2.0 * self.window_width).min(self.horizon);
            let quantity = rng.random_range(1..=self.max_quantity);
            b.request(
                pickup,
                (start, pickup_end),
                delivery,
                (start, delivery_end),
                quantity,
            );
        }
        b.build(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_shape() {
        let inst = InstanceGenerator::new(1)
            .with_grid(2, 3)
            .with_queries(0)
            .generate()
            .expect("valid");
        assert_eq!(inst.graph.num_nodes(), 6);
        // 2 rows × 2 horizontal + 3 vertical links, both directions.
        assert_eq!(inst.graph.num_edges(), 2 * (2 * 2 + 3));
    }

    #[test]
    fn test_same_seed_same_instance() {
        let a = InstanceGenerator::new(7).with_queries(3).generate().expect("valid");
        let b = InstanceGenerator::new(7).with_queries(3).generate().expect("valid");
        for (qa, qb) in a.queries.iter().zip(&b.queries) {
            assert_eq!(qa.depot(), qb.depot());
            for (sa, sb) in qa.services().zip(qb.services()) {
                assert_eq!(sa.pickup(), sb.pickup());
                assert_eq!(sa.delivery(), sb.delivery());
                assert_eq!(sa.quantity(), sb.quantity());
            }
        }
    }

    #[test]
    fn test_requests_within_bounds() {
        let inst = InstanceGenerator::new(3)
            .with_queries(5)
            .with_requests(6)
            .with_max_quantity(3)
            .generate()
            .expect("valid");
        for q in &inst.queries {
            assert_eq!(q.num_requests(), 6);
            for s in q.services() {
                assert!((1..=3).contains(&s.quantity()));
                assert_ne!(s.pickup().node(), s.delivery().node());
                assert!(s.delivery().window().end() <= 1_000.0);
                assert!(s.pickup().window().start() <= s.pickup().window().end());
            }
        }
    }

    #[test]
    fn test_rush_hour_profile_is_fifo() {
        let g = InstanceGenerator::new(0)
            .with_rush_hour(true)
            .with_spacing(500.0)
            .with_horizon(100.0);
        assert!(g.arrival_fn().is_fifo());
        assert!(g.generate().is_ok());
    }
}
