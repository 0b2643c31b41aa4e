//! Solver configuration.
//!
//! Every strategy reads its tuning knobs from one [`SolverConfig`]. All fields
//! have defaults, so a JSON document only needs to name what it overrides:
//!
//! ```
//! use optload::config::{RepairPolicy, SolverConfig};
//!
//! let config = SolverConfig::from_json_str(
//!     r#"{ "cluster": { "max_cluster_size": 4, "repair_policy": "reject" } }"#,
//! ).unwrap();
//! assert_eq!(config.cluster.max_cluster_size, 4);
//! assert_eq!(config.cluster.repair_policy, RepairPolicy::Reject);
//! assert!(config.exact.time_limit_secs.is_none());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for all strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Branch-and-bound settings.
    pub exact: ExactConfig,
    /// Clustering heuristic and enumerator settings.
    pub cluster: ClusterConfig,
    /// Greedy global best-insertion settings.
    pub greedy_global: GreedyGlobalConfig,
    /// Greedy nearest-move scoring weights.
    pub greedy_nearest: GreedyNearestConfig,
    /// LIFO multi-stack heuristic settings.
    pub lifo_stack: LifoStackConfig,
}

impl SolverConfig {
    /// Parses a configuration from JSON, filling unspecified fields with
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Branch-and-bound settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactConfig {
    /// Wall-clock budget in seconds. `None` searches to completion.
    pub time_limit_secs: Option<f64>,
    /// Number of explored nodes between two clock checks.
    pub check_interval: u64,
}

impl ExactConfig {
    /// The time limit as a [`Duration`], if one is set.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: None,
            check_interval: 1_000,
        }
    }
}

/// What capacity repair does when it must drop a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPolicy {
    /// Drop the smallest pickup and keep going; the lost demand only shows up
    /// as a lower served quantity.
    #[default]
    DropSmallest,
    /// Fail the query with [`Error::DemandDropped`](crate::Error::DemandDropped).
    Reject,
}

/// Clustering heuristic settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum number of points (pickups and deliveries) per cluster.
    pub max_cluster_size: usize,
    /// Abandon partial orderings whose LU lower bound already matches the
    /// best complete ordering of the cluster.
    pub lu_pruning: bool,
    /// Behaviour when capacity repair drops demand.
    pub repair_policy: RepairPolicy,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_cluster_size: 3,
            lu_pruning: true,
            repair_policy: RepairPolicy::DropSmallest,
        }
    }
}

/// Greedy global best-insertion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyGlobalConfig {
    /// Weight of the LU cost in `distance + loading_weight * lu`.
    pub loading_weight: f64,
}

impl Default for GreedyGlobalConfig {
    fn default() -> Self {
        Self { loading_weight: 0.1 }
    }
}

/// Greedy nearest-move scoring weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyNearestConfig {
    pub wait_weight: f64,
    pub size_weight: f64,
    pub slack_weight: f64,
}

impl Default for GreedyNearestConfig {
    fn default() -> Self {
        Self {
            wait_weight: 0.5,
            size_weight: 0.05,
            slack_weight: 1.0,
        }
    }
}

/// LIFO multi-stack heuristic settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifoStackConfig {
    pub wait_weight: f64,
    pub slack_weight: f64,
    /// Score and LU penalty per item moved out of the way on delivery.
    pub rehandling_penalty: i64,
    /// Bounds on the number of compartment stacks; the actual count is the
    /// vehicle capacity clamped into this range.
    pub min_stacks: usize,
    pub max_stacks: usize,
}

impl Default for LifoStackConfig {
    fn default() -> Self {
        Self {
            wait_weight: 0.25,
            slack_weight: 0.1,
            rehandling_penalty: 20,
            min_stacks: 2,
            max_stacks: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SolverConfig::default();
        assert_eq!(c.cluster.max_cluster_size, 3);
        assert!(c.cluster.lu_pruning);
        assert_eq!(c.cluster.repair_policy, RepairPolicy::DropSmallest);
        assert_eq!(c.greedy_global.loading_weight, 0.1);
        assert_eq!(c.lifo_stack.rehandling_penalty, 20);
        assert!(c.exact.time_limit().is_none());
    }

    #[test]
    fn test_empty_json_is_default() {
        let c = SolverConfig::from_json_str("{}").expect("valid");
        assert_eq!(c, SolverConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let c = SolverConfig::from_json_str(
            r#"{ "exact": { "time_limit_secs": 2.5 }, "greedy_nearest": { "wait_weight": 1.0 } }"#,
        )
        .expect("valid");
        assert_eq!(c.exact.time_limit(), Some(Duration::from_millis(2500)));
        assert_eq!(c.exact.check_interval, 1_000);
        assert_eq!(c.greedy_nearest.wait_weight, 1.0);
        assert_eq!(c.greedy_nearest.size_weight, 0.05);
    }

    #[test]
    fn test_invalid_json() {
        assert!(SolverConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_negative_time_limit_ignored() {
        let c = ExactConfig {
            time_limit_secs: Some(-1.0),
            ..ExactConfig::default()
        };
        assert!(c.time_limit().is_none());
    }
}
