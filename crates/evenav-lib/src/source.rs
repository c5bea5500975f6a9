//! Interfaces to the collaborators that feed the engine.
//!
//! The engine never performs network I/O and owns no refresh cadence. Graph
//! data, risk heatmaps, and precomputed jump-neighbor tables arrive through
//! these traits; simple in-memory and file-backed implementations live here
//! for embedding and tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cost::RiskAggregate;
use crate::db::{GateEdge, System, SystemId};
use crate::error::Result;
use crate::neighbors::{JumpNeighborTable, RangeBucket};

/// Supplies the nodes and gate edges for a snapshot refresh.
pub trait GraphSource: Send + Sync {
    fn list_systems(&self) -> Result<Vec<System>>;
    fn list_edges(&self) -> Result<Vec<GateEdge>>;
}

/// Supplies recent activity aggregates per system.
pub trait RiskSource: Send + Sync {
    fn heatmap(&self) -> Result<HashMap<SystemId, RiskAggregate>>;
}

/// Supplies precomputed jump-neighbor tables.
pub trait NeighborSource: Send + Sync {
    /// Load the table for `bucket`.
    ///
    /// Returns `Ok(None)` when the table is not ready: never built, still
    /// incomplete, or built against a different node count than
    /// `expected_node_count`.
    fn load_range_bucket(
        &self,
        bucket: RangeBucket,
        expected_node_count: usize,
    ) -> Result<Option<JumpNeighborTable>>;
}

/// Answers whether a system offers a dockable amenity station.
pub trait AmenitySource: Send + Sync {
    fn has_amenity(&self, system: SystemId) -> bool;
}

/// Graph source over already-loaded vectors.
#[derive(Debug, Clone, Default)]
pub struct StaticGraphSource {
    pub systems: Vec<System>,
    pub edges: Vec<GateEdge>,
}

impl StaticGraphSource {
    pub fn new(systems: Vec<System>, edges: Vec<GateEdge>) -> Self {
        Self { systems, edges }
    }
}

impl GraphSource for StaticGraphSource {
    fn list_systems(&self) -> Result<Vec<System>> {
        Ok(self.systems.clone())
    }

    fn list_edges(&self) -> Result<Vec<GateEdge>> {
        Ok(self.edges.clone())
    }
}

/// Risk source over an in-memory heatmap.
#[derive(Debug, Clone, Default)]
pub struct StaticRiskSource {
    pub heatmap: HashMap<SystemId, RiskAggregate>,
}

impl StaticRiskSource {
    pub fn new(heatmap: HashMap<SystemId, RiskAggregate>) -> Self {
        Self { heatmap }
    }
}

impl RiskSource for StaticRiskSource {
    fn heatmap(&self) -> Result<HashMap<SystemId, RiskAggregate>> {
        Ok(self.heatmap.clone())
    }
}

/// Risk source reading a JSON object keyed by system id.
///
/// ```json
/// { "30000142": { "ship_kills": 4, "pod_kills": 1, "npc_kills": 120 } }
/// ```
///
/// The file is re-read on every call; caching is the caller's concern.
#[derive(Debug, Clone)]
pub struct JsonRiskSource {
    path: PathBuf,
}

impl JsonRiskSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RiskSource for JsonRiskSource {
    fn heatmap(&self) -> Result<HashMap<SystemId, RiskAggregate>> {
        let contents = fs::read_to_string(&self.path)?;
        let raw: HashMap<String, RiskAggregate> = serde_json::from_str(&contents)?;
        let mut heatmap = HashMap::with_capacity(raw.len());
        let mut skipped = 0usize;
        for (key, aggregate) in raw {
            match key.trim().parse::<SystemId>() {
                Ok(id) => {
                    heatmap.insert(id, aggregate);
                }
                Err(_) => skipped += 1,
            }
        }
        debug!(
            path = %self.path.display(),
            systems = heatmap.len(),
            skipped,
            "loaded risk heatmap"
        );
        Ok(heatmap)
    }
}
