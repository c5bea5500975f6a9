//! Export a completed neighbor table to a standalone snapshot file.

use std::path::PathBuf;

use anyhow::{Context, Result};

use evenav_lib::{NeighborSource, RangeBucket, SqliteNeighborStore};

use crate::commands::{load_snapshot, DataPaths};

#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub bucket: i64,
    pub output: PathBuf,
}

/// Handle the export-neighbors subcommand.
///
/// Only a bucket marked complete for the current snapshot can be exported.
pub fn handle_export_neighbors(paths: &DataPaths, args: &ExportArgs) -> Result<()> {
    let bucket = RangeBucket::try_from(args.bucket)?;
    let snapshot = load_snapshot(&paths.database)?;
    let store = SqliteNeighborStore::open(&paths.neighbors)
        .with_context(|| format!("failed to open neighbor store {}", paths.neighbors.display()))?;

    let table = store
        .load_range_bucket(bucket, snapshot.len())
        .context("failed to read neighbor store")?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "range bucket {bucket} is not complete for {} systems; run `evenav precompute --bucket {bucket}` first",
                snapshot.len()
            )
        })?;

    table
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let file_size = std::fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
    println!("Exported range bucket {bucket}:");
    println!("  Path: {}", args.output.display());
    println!("  Rows: {}", table.len());
    println!("  File size: {file_size} bytes");
    Ok(())
}
