// Handlers for CLI subcommands.
//
// main.rs parses arguments and dispatches here; each module owns one subcommand.

pub mod export;
pub mod precompute;
pub mod route;
pub mod ships;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use evenav_lib::{EngineConfig, GraphSnapshot, GraphSource, SqliteGraphSource};

/// Environment variable naming the static-data database.
pub const DATA_ENV: &str = "EVENAV_DATA";
/// Environment variable naming the engine configuration file.
pub const CONFIG_ENV: &str = "EVENAV_CONFIG";
/// Neighbor store file name used when `--neighbors` is not given.
pub const DEFAULT_NEIGHBORS_FILE: &str = "jump_neighbors.db";

/// File locations shared by the data-backed subcommands.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub database: PathBuf,
    pub neighbors: PathBuf,
    pub risk: Option<PathBuf>,
}

impl DataPaths {
    /// Resolve paths from flags, falling back to `EVENAV_DATA` for the database
    /// and to a store next to the database for the neighbor tables.
    pub fn resolve(
        data: Option<&Path>,
        neighbors: Option<&Path>,
        risk: Option<&Path>,
    ) -> Result<Self> {
        let database = match data {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(DATA_ENV).map(PathBuf::from).ok_or_else(|| {
                anyhow::anyhow!("no static-data database given; pass --data or set {DATA_ENV}")
            })?,
        };
        if !database.exists() {
            anyhow::bail!("static-data database {} does not exist", database.display());
        }
        let neighbors = match neighbors {
            Some(path) => path.to_path_buf(),
            None => database
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_NEIGHBORS_FILE),
        };
        Ok(Self {
            database,
            neighbors,
            risk: risk.map(Path::to_path_buf),
        })
    }
}

/// Load the engine configuration from `--config`, then `EVENAV_CONFIG`, then defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => EngineConfig::from_path(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Build a snapshot directly from the static-data database.
pub fn load_snapshot(database: &Path) -> Result<GraphSnapshot> {
    let source = SqliteGraphSource::new(database);
    let systems = source
        .list_systems()
        .with_context(|| format!("failed to read systems from {}", database.display()))?;
    let edges = source
        .list_edges()
        .with_context(|| format!("failed to read gates from {}", database.display()))?;
    GraphSnapshot::build(systems, edges, 1).context("failed to build graph snapshot")
}
