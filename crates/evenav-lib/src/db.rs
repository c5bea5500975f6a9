use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::SystemPosition;
use crate::source::GraphSource;

/// Numeric identifier for a solar system.
pub type SystemId = i64;

/// Meters in one astronomical unit, used to express system radius as a size scalar.
const METERS_PER_AU: f64 = 149_597_870_700.0;

/// Security status at or above this value is high-sec.
pub const HIGH_SEC_THRESHOLD: f64 = 0.45;

/// Security band derived from the continuous security status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityBand {
    High,
    Low,
    Null,
}

impl SecurityBand {
    /// Band a continuous security value.
    pub fn from_security(security: f64) -> Self {
        if security >= HIGH_SEC_THRESHOLD {
            SecurityBand::High
        } else if security > 0.0 {
            SecurityBand::Low
        } else {
            SecurityBand::Null
        }
    }
}

impl fmt::Display for SecurityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SecurityBand::High => "high",
            SecurityBand::Low => "low",
            SecurityBand::Null => "null",
        };
        f.write_str(value)
    }
}

/// Additional metadata tracked for each system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetadata {
    pub constellation_id: Option<i64>,
    pub region_id: Option<i64>,
    pub security_status: f64,
    /// Whether the system hosts at least one dockable station.
    pub has_station: bool,
    /// Size scalar used for exposure cost (system radius in AU when known).
    pub size: f64,
}

impl Default for SystemMetadata {
    fn default() -> Self {
        Self {
            constellation_id: None,
            region_id: None,
            security_status: 0.0,
            has_station: false,
            size: 1.0,
        }
    }
}

/// Representation of a solar system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub id: SystemId,
    pub name: String,
    pub position: SystemPosition,
    pub metadata: SystemMetadata,
}

impl System {
    pub fn security_band(&self) -> SecurityBand {
        SecurityBand::from_security(self.metadata.security_status)
    }
}

/// Directed gate connection between two systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateEdge {
    pub from: SystemId,
    pub to: SystemId,
    /// True when the gate crosses an administrative (region) boundary.
    pub crosses_boundary: bool,
}

/// Reference to a system by identifier or by (case-insensitive) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemRef {
    Id(SystemId),
    Name(String),
}

impl From<SystemId> for SystemRef {
    fn from(id: SystemId) -> Self {
        SystemRef::Id(id)
    }
}

impl From<&str> for SystemRef {
    fn from(name: &str) -> Self {
        SystemRef::Name(name.to_string())
    }
}

impl From<String> for SystemRef {
    fn from(name: String) -> Self {
        SystemRef::Name(name)
    }
}

impl fmt::Display for SystemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemRef::Id(id) => write!(f, "#{id}"),
            SystemRef::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaVariant {
    StaticData,
    Sde,
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SchemaVariant::StaticData => "static_data",
            SchemaVariant::Sde => "sde",
        };
        f.write_str(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PositionColumns {
    x: &'static str,
    y: &'static str,
    z: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SchemaDefinition {
    variant: SchemaVariant,
    systems_table: &'static str,
    system_id_column: &'static str,
    system_name_column: &'static str,
    jumps_table: &'static str,
    jump_from_column: &'static str,
    jump_to_column: &'static str,
    constellation_column: Option<&'static str>,
    region_column: Option<&'static str>,
    security_column: Option<&'static str>,
    position_columns: PositionColumns,
    size_column: Option<&'static str>,
    radius_column: Option<&'static str>,
    station_column: Option<&'static str>,
    stations_table: Option<&'static str>,
    boundary_column: Option<&'static str>,
}

impl SchemaVariant {
    fn definition(self) -> SchemaDefinition {
        match self {
            SchemaVariant::StaticData => SchemaDefinition {
                variant: SchemaVariant::StaticData,
                systems_table: "SolarSystems",
                system_id_column: "solarSystemId",
                system_name_column: "name",
                jumps_table: "Jumps",
                jump_from_column: "fromSystemId",
                jump_to_column: "toSystemId",
                constellation_column: Some("constellationID"),
                region_column: Some("regionID"),
                security_column: Some("security"),
                position_columns: PositionColumns {
                    x: "centerX",
                    y: "centerY",
                    z: "centerZ",
                },
                size_column: Some("size"),
                radius_column: Some("radius"),
                station_column: Some("hasStation"),
                stations_table: Some("staStations"),
                boundary_column: Some("crossesBoundary"),
            },
            SchemaVariant::Sde => SchemaDefinition {
                variant: SchemaVariant::Sde,
                systems_table: "mapSolarSystems",
                system_id_column: "solarSystemID",
                system_name_column: "solarSystemName",
                jumps_table: "mapSolarSystemJumps",
                jump_from_column: "fromSolarSystemID",
                jump_to_column: "toSolarSystemID",
                constellation_column: Some("constellationID"),
                region_column: Some("regionID"),
                security_column: Some("security"),
                position_columns: PositionColumns {
                    x: "x",
                    y: "y",
                    z: "z",
                },
                size_column: None,
                radius_column: Some("radius"),
                station_column: None,
                stations_table: Some("staStations"),
                boundary_column: None,
            },
        }
    }
}

/// Graph source backed by a SQLite static-data export.
///
/// The loader performs runtime schema detection so both the compact
/// `SolarSystems`/`Jumps` layout and the SDE `mapSolarSystems`/
/// `mapSolarSystemJumps` layout are supported. Optional columns (security,
/// radius, station flags, explicit boundary flags) are detected per table and
/// fall back to defaults when absent.
#[derive(Debug, Clone)]
pub struct SqliteGraphSource {
    path: PathBuf,
}

impl SqliteGraphSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<(Connection, SchemaDefinition)> {
        let connection = Connection::open(&self.path)?;
        let schema = detect_schema(&connection)?;
        debug!(schema = %schema.variant, path = %self.path.display(), "opened graph source");
        Ok((connection, schema))
    }
}

impl GraphSource for SqliteGraphSource {
    fn list_systems(&self) -> Result<Vec<System>> {
        let (connection, schema) = self.open()?;
        load_systems(&connection, &schema)
    }

    fn list_edges(&self) -> Result<Vec<GateEdge>> {
        let (connection, schema) = self.open()?;
        let systems = load_systems(&connection, &schema)?;
        let regions: HashMap<SystemId, Option<i64>> = systems
            .iter()
            .map(|system| (system.id, system.metadata.region_id))
            .collect();
        load_edges(&connection, &schema, &regions)
    }
}

fn detect_schema(connection: &Connection) -> Result<SchemaDefinition> {
    for variant in [SchemaVariant::StaticData, SchemaVariant::Sde] {
        if let Some(schema) = detect_variant(connection, variant)? {
            return Ok(schema);
        }
    }
    Err(Error::UnsupportedSchema)
}

fn detect_variant(
    connection: &Connection,
    variant: SchemaVariant,
) -> Result<Option<SchemaDefinition>> {
    let mut schema = variant.definition();

    if !table_exists(connection, schema.systems_table)?
        || !table_exists(connection, schema.jumps_table)?
    {
        return Ok(None);
    }

    let position = schema.position_columns;
    if !table_has_columns(
        connection,
        schema.systems_table,
        &[
            schema.system_id_column,
            schema.system_name_column,
            position.x,
            position.y,
            position.z,
        ],
    )? {
        return Ok(None);
    }

    if !table_has_columns(
        connection,
        schema.jumps_table,
        &[schema.jump_from_column, schema.jump_to_column],
    )? {
        return Ok(None);
    }

    let systems_table = schema.systems_table;
    for column in [
        &mut schema.constellation_column,
        &mut schema.region_column,
        &mut schema.security_column,
        &mut schema.size_column,
        &mut schema.radius_column,
        &mut schema.station_column,
    ] {
        if let Some(name) = *column {
            if !table_has_columns(connection, systems_table, &[name])? {
                *column = None;
            }
        }
    }

    if let Some(name) = schema.boundary_column {
        if !table_has_columns(connection, schema.jumps_table, &[name])? {
            schema.boundary_column = None;
        }
    }

    if let Some(table) = schema.stations_table {
        if !table_exists(connection, table)?
            || !table_has_columns(connection, table, &["solarSystemID"])?
        {
            schema.stations_table = None;
        }
    }

    Ok(Some(schema))
}

fn optional_column(column: Option<&str>, alias: &str) -> String {
    match column {
        Some(name) => format!("s.{name} AS {alias}"),
        None => format!("NULL AS {alias}"),
    }
}

fn load_systems(connection: &Connection, schema: &SchemaDefinition) -> Result<Vec<System>> {
    let position = schema.position_columns;
    let station_select = match (schema.station_column, schema.stations_table) {
        (Some(column), _) => format!("s.{column} AS has_station"),
        (None, Some(table)) => format!(
            "EXISTS(SELECT 1 FROM {table} st WHERE st.solarSystemID = s.{id}) AS has_station",
            id = schema.system_id_column
        ),
        (None, None) => "0 AS has_station".to_string(),
    };

    let selects = [
        format!("s.{id} AS system_id", id = schema.system_id_column),
        format!("s.{name} AS system_name", name = schema.system_name_column),
        optional_column(schema.constellation_column, "constellation_id"),
        optional_column(schema.region_column, "region_id"),
        optional_column(schema.security_column, "security_status"),
        format!("s.{x} AS position_x", x = position.x),
        format!("s.{y} AS position_y", y = position.y),
        format!("s.{z} AS position_z", z = position.z),
        optional_column(schema.size_column, "size"),
        optional_column(schema.radius_column, "radius"),
        station_select,
    ];

    let sql = format!(
        "SELECT {selects} FROM {table} s ORDER BY s.{id}",
        selects = selects.join(", "),
        table = schema.systems_table,
        id = schema.system_id_column
    );

    let mut stmt = connection.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_system)?;

    let mut systems = Vec::new();
    let mut skipped = 0usize;
    for entry in rows {
        match entry? {
            Some(system) => systems.push(system),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "ignored systems without coordinates");
    }

    Ok(systems)
}

/// Load gate connections as directed edges.
///
/// Every row is inserted in both directions, since stargates are
/// bidirectional. When the jumps table carries no explicit boundary column, a
/// gate crosses a boundary when its endpoints sit in different known regions.
fn load_edges(
    connection: &Connection,
    schema: &SchemaDefinition,
    regions: &HashMap<SystemId, Option<i64>>,
) -> Result<Vec<GateEdge>> {
    let boundary_select = schema
        .boundary_column
        .map(|column| format!("j.{column}"))
        .unwrap_or_else(|| "NULL".to_string());
    let sql = format!(
        "SELECT j.{from}, j.{to}, {boundary} FROM {table} j",
        from = schema.jump_from_column,
        to = schema.jump_to_column,
        boundary = boundary_select,
        table = schema.jumps_table
    );

    let mut stmt = connection.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, SystemId>(0)?,
            row.get::<_, SystemId>(1)?,
            row.get::<_, Option<bool>>(2)?,
        ))
    })?;

    let mut edges = Vec::new();
    let mut skipped_edges = 0usize;
    for row in rows {
        let (from, to, explicit_boundary) = row?;
        let (Some(from_region), Some(to_region)) = (regions.get(&from), regions.get(&to)) else {
            skipped_edges += 1;
            continue;
        };
        let crosses_boundary = explicit_boundary.unwrap_or_else(|| {
            matches!((from_region, to_region), (Some(a), Some(b)) if a != b)
        });
        edges.push(GateEdge {
            from,
            to,
            crosses_boundary,
        });
        edges.push(GateEdge {
            from: to,
            to: from,
            crosses_boundary,
        });
    }

    edges.sort_by_key(|edge| (edge.from, edge.to));
    edges.dedup_by_key(|edge| (edge.from, edge.to));

    if skipped_edges > 0 {
        warn!(
            skipped_edges,
            "ignored gate edges referencing unknown systems",
        );
    }

    Ok(edges)
}

fn row_to_system(row: &Row<'_>) -> rusqlite::Result<Option<System>> {
    let position = match (
        row.get::<_, Option<f64>>(5)?,
        row.get::<_, Option<f64>>(6)?,
        row.get::<_, Option<f64>>(7)?,
    ) {
        (Some(x), Some(y), Some(z)) => SystemPosition { x, y, z },
        _ => return Ok(None),
    };

    let size = match (row.get::<_, Option<f64>>(8)?, row.get::<_, Option<f64>>(9)?) {
        (Some(size), _) => size,
        (None, Some(radius)) if radius > 0.0 => radius / METERS_PER_AU,
        _ => 1.0,
    };

    Ok(Some(System {
        id: row.get(0)?,
        name: row.get(1)?,
        position,
        metadata: SystemMetadata {
            constellation_id: row.get(2)?,
            region_id: row.get(3)?,
            security_status: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
            has_station: row.get::<_, Option<bool>>(10)?.unwrap_or(false),
            size,
        },
    }))
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name);
    }

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_bands_split_at_thresholds() {
        assert_eq!(SecurityBand::from_security(1.0), SecurityBand::High);
        assert_eq!(SecurityBand::from_security(0.45), SecurityBand::High);
        assert_eq!(SecurityBand::from_security(0.44), SecurityBand::Low);
        assert_eq!(SecurityBand::from_security(0.01), SecurityBand::Low);
        assert_eq!(SecurityBand::from_security(0.0), SecurityBand::Null);
        assert_eq!(SecurityBand::from_security(-0.7), SecurityBand::Null);
    }

    #[test]
    fn system_ref_display() {
        assert_eq!(SystemRef::from(30000142).to_string(), "#30000142");
        assert_eq!(SystemRef::from("Jita").to_string(), "Jita");
    }

    #[test]
    fn unsupported_schema_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.db");
        let connection = Connection::open(&path).expect("open db");
        connection
            .execute_batch("CREATE TABLE Unrelated (id INTEGER);")
            .expect("create table");
        drop(connection);

        let source = SqliteGraphSource::new(&path);
        let err = source.list_systems().expect_err("schema unsupported");
        assert!(matches!(err, Error::UnsupportedSchema));
    }
}
