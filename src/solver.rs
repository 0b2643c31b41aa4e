//! Strategy selection and solve reports.
//!
//! A [`Strategy`] names one of the built-in search strategies, or wraps a
//! user-supplied [`Solver`]. [`Strategy::run`] solves one query and returns a
//! [`SolveReport`] with the plans found and the wall-clock time spent.
//!
//! ```
//! use optload::solver::Strategy;
//!
//! let s: Strategy = "greedy-nearest".parse().unwrap();
//! assert_eq!(s.name(), "greedy_nearest");
//! assert!("simplex".parse::<Strategy>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::cluster::ClusterHeuristic;
use crate::config::SolverConfig;
use crate::constructive::{greedy_global, greedy_nearest, insertion, lifo_stack};
use crate::error::{Error, Result};
use crate::exact::ExactSolver;
use crate::graph::Router;
use crate::models::{Query, RoutePlan};

/// A search strategy that can be plugged in from outside the crate, such as
/// a constraint-programming baseline.
pub trait Solver: fmt::Debug + Send + Sync {
    /// Short identifier used in reports and logs.
    fn name(&self) -> &str;

    /// Solves one query. An empty vector means no feasible route was found.
    fn solve(&self, query: &Query, router: &Router) -> Result<Vec<RoutePlan>>;
}

/// Search strategy for one query.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Branch-and-bound, optimal within its time limit.
    Exact,
    /// Cluster enumeration heuristic.
    Cluster,
    /// Cheapest insertion in pickup-window order.
    Insertion,
    /// Global best insertion with weighted LU cost.
    GreedyGlobal,
    /// Nearest next move under the LIFO rule.
    GreedyNearest,
    /// Nearest next move on a multi-compartment vehicle.
    LifoStack,
    /// A solver supplied by the caller.
    External(Arc<dyn Solver>),
}

impl Strategy {
    /// All built-in strategies.
    pub const BUILT_IN: [Strategy; 6] = [
        Strategy::Exact,
        Strategy::Cluster,
        Strategy::Insertion,
        Strategy::GreedyGlobal,
        Strategy::GreedyNearest,
        Strategy::LifoStack,
    ];

    pub fn name(&self) -> &str {
        match self {
            Strategy::Exact => "exact",
            Strategy::Cluster => "cluster",
            Strategy::Insertion => "insertion",
            Strategy::GreedyGlobal => "greedy_global",
            Strategy::GreedyNearest => "greedy_nearest",
            Strategy::LifoStack => "lifo_stack",
            Strategy::External(solver) => solver.name(),
        }
    }

    /// Solves `query` and reports the plans found.
    ///
    /// Infeasibility is not an error: a query with no feasible route yields
    /// a report with no plans.
    #[instrument(skip_all, fields(query = query.id(), strategy = self.name()))]
    pub fn run(&self, query: &Query, router: &Router, config: &SolverConfig) -> Result<SolveReport> {
        info!(requests = query.num_requests(), "solve started");
        let started = Instant::now();

        let plans = match self {
            Strategy::Exact => {
                let outcome = ExactSolver::new(config.exact.clone()).search(query, router);
                debug!(
                    nodes = outcome.statistics.nodes_explored,
                    timed_out = outcome.statistics.timed_out,
                    "search finished"
                );
                outcome.plan.into_iter().collect()
            }
            Strategy::Cluster => ClusterHeuristic::new(config.cluster.clone())
                .solve(query, router)?
                .into_iter()
                .collect(),
            Strategy::Insertion => insertion(query, router).into_iter().collect(),
            Strategy::GreedyGlobal => greedy_global(query, router, &config.greedy_global)
                .into_iter()
                .collect(),
            Strategy::GreedyNearest => greedy_nearest(query, router, &config.greedy_nearest)
                .into_iter()
                .collect(),
            Strategy::LifoStack => lifo_stack(query, router, &config.lifo_stack)
                .into_iter()
                .collect(),
            Strategy::External(solver) => solver.solve(query, router)?,
        };

        let report = SolveReport {
            strategy: self.name().to_string(),
            query_id: query.id(),
            plans,
            elapsed: started.elapsed(),
        };
        match report.best() {
            Some(best) => info!(
                served = best.served(),
                lu = best.lu_cost(),
                distance = best.distance(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "solve finished"
            ),
            None => info!(elapsed_ms = report.elapsed.as_millis() as u64, "no feasible route"),
        }
        Ok(report)
    }
}

impl FromStr for Strategy {
    type Err = Error;

    /// Accepts the names returned by [`Strategy::name`], with `-` or `_`
    /// as separator and in any case.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Strategy::BUILT_IN
            .into_iter()
            .find(|strategy| strategy.name() == normalized)
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one [`Strategy::run`].
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub strategy: String,
    pub query_id: usize,
    pub plans: Vec<RoutePlan>,
    pub elapsed: Duration,
}

impl SolveReport {
    /// The highest ranked plan: most served, then shortest, then cheapest LU.
    pub fn best(&self) -> Option<&RoutePlan> {
        self.plans.iter().min_by(|a, b| a.rank_cmp(b))
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl fmt::Display for SolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "query {} via {}: {} plan(s) in {:.3}s",
            self.query_id,
            self.strategy,
            self.plans.len(),
            self.elapsed.as_secs_f64()
        )?;
        for plan in &self.plans {
            writeln!(f, "{plan}")?;
        }
        Ok(())
    }
}
