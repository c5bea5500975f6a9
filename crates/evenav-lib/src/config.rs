//! Engine configuration.
//!
//! Every section has defaults, so an empty JSON object is a valid config and
//! partial files only override what they name.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cost::RiskWeights;
use crate::error::{Error, Result};
use crate::neighbors::DEFAULT_MAX_NEIGHBORS;
use crate::path::SearchBudget;

/// Top-level configuration for [`crate::engine::NavigationEngine`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub risk: RiskWeights,
    pub search: SearchConfig,
    pub precompute: PrecomputeConfig,
    pub avoidance: AvoidanceConfig,
    /// Build missing jump-neighbor tables in memory instead of reporting the
    /// jump mode as infeasible.
    pub online_neighbor_fallback: bool,
}

/// Budgets and corridor shape for route searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub astar_max_nodes: usize,
    pub astar_max_millis: u64,
    pub dijkstra_max_nodes: usize,
    pub dijkstra_max_millis: u64,
    /// Ellipse factor of the geometric jump corridor.
    pub corridor_factor: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            astar_max_nodes: 200_000,
            astar_max_millis: 2_000,
            dijkstra_max_nodes: 500_000,
            dijkstra_max_millis: 3_000,
            corridor_factor: 3.0,
        }
    }
}

impl SearchConfig {
    pub fn astar_budget(&self) -> SearchBudget {
        SearchBudget::new(
            self.astar_max_nodes,
            Duration::from_millis(self.astar_max_millis),
        )
    }

    pub fn dijkstra_budget(&self) -> SearchBudget {
        SearchBudget::new(
            self.dijkstra_max_nodes,
            Duration::from_millis(self.dijkstra_max_millis),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecomputeConfig {
    pub max_neighbors_per_node: usize,
}

impl Default for PrecomputeConfig {
    fn default() -> Self {
        Self {
            max_neighbors_per_node: DEFAULT_MAX_NEIGHBORS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceConfig {
    /// Cost added per avoided system entered under soft avoidance.
    pub soft_penalty: f64,
    /// Longest run of avoided systems an exception corridor may admit.
    pub max_exception_corridor_hops: usize,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            soft_penalty: 25.0,
            max_exception_corridor_hops: 8,
        }
    }
}

impl EngineConfig {
    /// Read and validate a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let weights = [
            (self.risk.ship_kill, "risk.ship_kill"),
            (self.risk.pod_kill, "risk.pod_kill"),
            (self.risk.npc_kill, "risk.npc_kill"),
            (self.risk.scale, "risk.scale"),
            (self.risk.cap, "risk.cap"),
            (self.avoidance.soft_penalty, "avoidance.soft_penalty"),
        ];
        for (value, field) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{field} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if !self.search.corridor_factor.is_finite() || self.search.corridor_factor < 1.0 {
            return Err(invalid(format!(
                "search.corridor_factor must be at least 1.0, got {}",
                self.search.corridor_factor
            )));
        }
        if self.search.astar_max_nodes == 0 || self.search.dijkstra_max_nodes == 0 {
            return Err(invalid("search node budgets must be at least 1".to_string()));
        }
        if self.precompute.max_neighbors_per_node == 0 {
            return Err(invalid(
                "precompute.max_neighbors_per_node must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, EngineConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"risk": {"cap": 10.0}, "online_neighbor_fallback": true}"#)
                .expect("parse");
        assert_eq!(config.risk.cap, 10.0);
        assert_eq!(config.risk.ship_kill, RiskWeights::default().ship_kill);
        assert!(config.online_neighbor_fallback);
    }

    #[test]
    fn negative_weights_are_rejected() {
        let mut config = EngineConfig::default();
        config.risk.pod_kill = -1.0;
        let err = config.validate().expect_err("invalid");
        assert!(err.to_string().contains("risk.pod_kill"));
    }

    #[test]
    fn narrow_corridor_is_rejected() {
        let mut config = EngineConfig::default();
        config.search.corridor_factor = 0.5;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn from_path_reads_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("evenav.json");
        std::fs::write(&path, r#"{"precompute": {"max_neighbors_per_node": 40}}"#)
            .expect("write");
        let config = EngineConfig::from_path(&path).expect("load");
        assert_eq!(config.precompute.max_neighbors_per_node, 40);
    }
}
