//! Common test utilities and fixture helpers.
//!
//! Fixtures are built in code: small star maps with positions in light-years,
//! optional SQLite exports written to temporary directories, and a helper that
//! plans routes against a snapshot without going through the engine.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use evenav_lib::config::EngineConfig;
use evenav_lib::cost::RiskAggregate;
use evenav_lib::routing::{plan_routes, PlanContext, RouteBundle, RouteRequest};
use evenav_lib::source::NeighborSource;
use evenav_lib::{
    GateEdge, GraphSnapshot, JumpNeighborTable, MemoryNeighborStore, RangeBucket, System,
    SystemId, SystemMetadata, SystemPosition,
};
use rusqlite::{params, Connection};

/// A system at light-year coordinates with the given security status.
pub fn system(id: SystemId, name: &str, ly: [f64; 3], security: f64) -> System {
    System {
        id,
        name: name.to_string(),
        position: SystemPosition::from_light_years(ly[0], ly[1], ly[2]),
        metadata: SystemMetadata {
            security_status: security,
            region_id: Some(1),
            ..SystemMetadata::default()
        },
    }
}

pub fn with_station(mut system: System) -> System {
    system.metadata.has_station = true;
    system
}

pub fn in_region(mut system: System, region: i64) -> System {
    system.metadata.region_id = Some(region);
    system
}

/// Both directions of a stargate.
pub fn gate(from: SystemId, to: SystemId) -> [GateEdge; 2] {
    [
        GateEdge {
            from,
            to,
            crosses_boundary: false,
        },
        GateEdge {
            from: to,
            to: from,
            crosses_boundary: false,
        },
    ]
}

pub fn gates(pairs: &[(SystemId, SystemId)]) -> Vec<GateEdge> {
    pairs.iter().flat_map(|&(a, b)| gate(a, b)).collect()
}

pub fn snapshot(systems: Vec<System>, edges: Vec<GateEdge>) -> GraphSnapshot {
    GraphSnapshot::build(systems, edges, 1).expect("fixture snapshot builds")
}

/// Three low-sec systems 6 LY apart on a line: A(0), B(6), C(12), no gates.
pub fn carrier_line() -> GraphSnapshot {
    snapshot(
        vec![
            system(1, "A", [0.0, 0.0, 0.0], 0.3),
            system(2, "B", [6.0, 0.0, 0.0], 0.3),
            system(3, "C", [12.0, 0.0, 0.0], 0.3),
        ],
        Vec::new(),
    )
}

/// Seven high-sec systems chained by gates, 1 LY apart.
///
/// ```text
/// Alpha - Bravo - Charlie - Delta - Echo - Foxtrot - Golf
/// ```
pub fn gate_chain() -> GraphSnapshot {
    let names = ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf"];
    let systems = names
        .iter()
        .enumerate()
        .map(|(index, name)| system(index as SystemId + 1, name, [index as f64, 0.0, 0.0], 0.9))
        .collect();
    let pairs: Vec<(SystemId, SystemId)> = (1..names.len() as SystemId)
        .map(|id| (id, id + 1))
        .collect();
    snapshot(systems, gates(&pairs))
}

/// Neighbor store with every bucket fully built for `snapshot`.
pub fn full_neighbor_store(snapshot: &GraphSnapshot) -> MemoryNeighborStore {
    let store = MemoryNeighborStore::new();
    for bucket in RangeBucket::all() {
        store.insert_table(&JumpNeighborTable::build(snapshot, bucket, 250));
    }
    store
}

/// Plan routes against `snapshot` with an empty risk heatmap.
pub fn plan(
    snapshot: &GraphSnapshot,
    neighbors: &dyn NeighborSource,
    request: &RouteRequest,
) -> RouteBundle {
    plan_with(snapshot, neighbors, &HashMap::new(), &EngineConfig::default(), request)
}

pub fn plan_with(
    snapshot: &GraphSnapshot,
    neighbors: &dyn NeighborSource,
    risk: &HashMap<SystemId, RiskAggregate>,
    config: &EngineConfig,
    request: &RouteRequest,
) -> RouteBundle {
    let ctx = PlanContext {
        snapshot,
        risk,
        neighbors,
        amenities: snapshot,
        config,
    };
    plan_routes(&ctx, request).expect("planning succeeds")
}

/// Write a `SolarSystems`/`Jumps` static-data export for `systems` and `edges`.
///
/// Each undirected gate is written once; the loader mirrors it.
pub fn write_static_data_db(path: &Path, systems: &[System], edges: &[GateEdge]) {
    let connection = Connection::open(path).expect("open fixture db");
    connection
        .execute_batch(
            "CREATE TABLE SolarSystems (
                solarSystemId INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                constellationID INTEGER,
                regionID INTEGER,
                security REAL,
                centerX REAL,
                centerY REAL,
                centerZ REAL,
                hasStation INTEGER
            );
            CREATE TABLE Jumps (
                fromSystemId INTEGER NOT NULL,
                toSystemId INTEGER NOT NULL
            );",
        )
        .expect("create fixture schema");

    for system in systems {
        connection
            .execute(
                "INSERT INTO SolarSystems VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    system.id,
                    system.name,
                    system.metadata.constellation_id,
                    system.metadata.region_id,
                    system.metadata.security_status,
                    system.position.x,
                    system.position.y,
                    system.position.z,
                    system.metadata.has_station,
                ],
            )
            .expect("insert system");
    }

    for edge in edges.iter().filter(|edge| edge.from < edge.to) {
        connection
            .execute(
                "INSERT INTO Jumps VALUES (?1, ?2)",
                params![edge.from, edge.to],
            )
            .expect("insert jump");
    }
}
