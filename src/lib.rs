//! # optload
//!
//! Single-vehicle pickup-and-delivery routing with loading/unloading (LU)
//! costs, time windows and a LIFO load compartment.
//!
//! ## Modules
//!
//! - [`graph`] — Time-dependent road graph and A* router
//! - [`models`] — Domain model types (TimeWindow, Point, Service, Query, RoutePlan)
//! - [`evaluation`] — Route feasibility checking, LU cost and load stack
//! - [`exact`] — Branch-and-bound with demand and MST distance bounds
//! - [`cluster`] — Cluster ordering enumerator and the clustering heuristic
//! - [`constructive`] — Insertion, greedy and LIFO multi-stack heuristics
//! - [`solver`] — Strategy selection and solve reports
//! - [`config`] — Serde-backed solver settings
//! - [`generator`] — Seeded synthetic instances
//! - [`logging`] — Tracing subscriber setup
//!
//! ## Example
//!
//! ```
//! use optload::config::SolverConfig;
//! use optload::graph::{ArrivalFn, Graph, Router};
//! use optload::models::Query;
//! use optload::solver::Strategy;
//!
//! let mut b = Graph::builder();
//! b.add_node(0, 0.0, 0.0).unwrap();
//! b.add_node(1, 3.0, 0.0).unwrap();
//! b.add_node(2, 3.0, 4.0).unwrap();
//! b.add_edge(0, 1, 3.0, ArrivalFn::Instant).unwrap();
//! b.add_edge(1, 2, 4.0, ArrivalFn::Instant).unwrap();
//! b.add_edge(2, 0, 5.0, ArrivalFn::Instant).unwrap();
//! let graph = b.build_shared();
//!
//! let mut q = Query::builder(1);
//! q.depot(0).capacity(10).horizon(0.0, 1000.0);
//! q.request(1, (0.0, 100.0), 2, (0.0, 200.0), 5);
//! let query = q.build(&graph).unwrap();
//!
//! let router = Router::new(graph);
//! let report = Strategy::Exact
//!     .run(&query, &router, &SolverConfig::default())
//!     .unwrap();
//! let best = report.best().unwrap();
//! assert_eq!(best.served(), 5);
//! assert_eq!(best.lu_cost(), 10);
//! assert!((best.distance() - 12.0).abs() < 1e-10);
//! ```

pub mod cluster;
pub mod config;
pub mod constructive;
pub mod error;
pub mod evaluation;
pub mod exact;
pub mod generator;
pub mod graph;
pub mod logging;
pub mod models;
pub mod solver;

pub use error::{Error, Result};

/// Hash map used for node- and request-keyed lookups.
pub type Map<K, V> = fnv::FnvHashMap<K, V>;
/// Hash set companion of [`Map`].
pub type Set<T> = fnv::FnvHashSet<T>;
