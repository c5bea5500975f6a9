//! Risk-aware navigation library entry points.
//!
//! This crate loads a star map into an immutable [`GraphSnapshot`], keeps
//! precomputed jump-neighbor tables per range bucket, and plans gate, jump,
//! and hybrid routes that trade travel time against risk. Higher-level
//! consumers (the CLI) should only depend on the items exported here instead
//! of reimplementing behavior.
//!

#![deny(warnings)]

pub mod config;
pub mod cost;
pub mod db;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod neighbors;
pub mod path;
pub mod routing;
pub mod ship;
pub mod source;
pub mod spatial;

pub use config::EngineConfig;
pub use cost::{CostComponents, CostOptions, RiskAggregate, RiskWeights};
pub use db::{GateEdge, SecurityBand, SqliteGraphSource, System, SystemId, SystemMetadata, SystemRef};
pub use engine::NavigationEngine;
pub use error::{Error, Result};
pub use geometry::SystemPosition;
pub use graph::{GraphSnapshot, SnapshotStore};
pub use neighbors::{
    build_range_bucket, JumpNeighborTable, MemoryNeighborStore, NeighborStore, RangeBucket,
    SqliteNeighborStore,
};
pub use path::{SearchBudget, SearchOutcome, SearchStatus};
pub use routing::{
    plan_routes, AvoidanceStrictness, CandidateRoute, PreferenceProfile, Route, RouteBundle,
    RouteMode, RouteOutcome, RouteRequest, TravelMode,
};
pub use ship::{JumpShipType, ShipClass};
pub use source::{
    AmenitySource, GraphSource, JsonRiskSource, NeighborSource, RiskSource, StaticGraphSource,
    StaticRiskSource,
};
pub use spatial::BucketIndex;
