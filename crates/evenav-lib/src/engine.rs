//! Navigation engine facade.
//!
//! Owns the published [`GraphSnapshot`] and the collaborators that feed it.
//! Requests run against whichever snapshot was current when they started;
//! [`NavigationEngine::refresh`] swaps in a new one without blocking them.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::{GraphSnapshot, SnapshotStore};
use crate::routing::{plan_routes, PlanContext, RouteBundle, RouteRequest};
use crate::source::{GraphSource, NeighborSource, RiskSource};

pub struct NavigationEngine {
    snapshots: SnapshotStore,
    config: EngineConfig,
    graph: Arc<dyn GraphSource>,
    risk: Arc<dyn RiskSource>,
    neighbors: Arc<dyn NeighborSource>,
}

impl NavigationEngine {
    /// Build the first snapshot from `graph` and return a ready engine.
    pub fn new(
        graph: Arc<dyn GraphSource>,
        risk: Arc<dyn RiskSource>,
        neighbors: Arc<dyn NeighborSource>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let snapshot = GraphSnapshot::build(graph.list_systems()?, graph.list_edges()?, 1)?;
        info!(
            systems = snapshot.len(),
            edges = snapshot.edges().len(),
            "navigation engine ready"
        );
        Ok(Self {
            snapshots: SnapshotStore::new(snapshot),
            config,
            graph,
            risk,
            neighbors,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.snapshots.current()
    }

    /// Reload the graph source and publish a new snapshot.
    ///
    /// Returns the new generation. In-flight requests keep the snapshot they
    /// started with; on error the current snapshot stays published.
    pub fn refresh(&self) -> Result<u64> {
        let snapshot = self.snapshots.refresh(self.graph.as_ref())?;
        Ok(snapshot.generation())
    }

    /// Plan gate, jump, and hybrid candidates for `request`.
    pub fn compute_routes(&self, request: &RouteRequest) -> Result<RouteBundle> {
        let started = Instant::now();
        debug!(
            origin = %request.origin,
            destination = %request.destination,
            "computing routes"
        );
        let snapshot = self.snapshots.current();
        let heatmap = self.risk.heatmap()?;
        let ctx = PlanContext {
            snapshot: &snapshot,
            risk: &heatmap,
            neighbors: self.neighbors.as_ref(),
            amenities: &*snapshot,
            config: &self.config,
        };
        let bundle = plan_routes(&ctx, request)?;
        info!(
            generation = bundle.snapshot_generation,
            selected = ?bundle.best.mode,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "routes computed"
        );
        Ok(bundle)
    }
}
