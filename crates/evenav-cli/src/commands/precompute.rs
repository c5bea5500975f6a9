//! Batch precompute of jump-neighbor tables.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use evenav_lib::neighbors::{PrecomputeOptions, PrecomputeProgress};
use evenav_lib::{
    build_range_bucket, EngineConfig, GraphSnapshot, RangeBucket, SearchBudget,
    SqliteNeighborStore,
};

use crate::commands::{load_snapshot, DataPaths};
use crate::terminal::group_digits;

/// Arguments for the precompute command.
#[derive(Debug, Clone, Default)]
pub struct PrecomputeArgs {
    /// Buckets to build; empty means every bucket.
    pub buckets: Vec<i64>,
    /// Continue from the stored cursor instead of rebuilding.
    pub resume: bool,
    /// Wall-clock budget per bucket, in seconds.
    pub budget_secs: Option<u64>,
    /// Override of the configured per-node neighbor cap.
    pub max_neighbors: Option<usize>,
}

impl PrecomputeArgs {
    pub fn selected_buckets(&self) -> Result<Vec<RangeBucket>> {
        if self.buckets.is_empty() {
            return Ok(RangeBucket::all().collect());
        }
        let mut buckets = self
            .buckets
            .iter()
            .map(|&value| RangeBucket::try_from(value).map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?;
        buckets.sort_unstable();
        buckets.dedup();
        Ok(buckets)
    }

    fn options(&self, config: &EngineConfig) -> PrecomputeOptions {
        let budget = match self.budget_secs {
            Some(secs) => SearchBudget::new(usize::MAX, Duration::from_secs(secs)),
            None => SearchBudget::unlimited(),
        };
        PrecomputeOptions {
            resume: self.resume,
            budget,
            max_neighbors: self
                .max_neighbors
                .unwrap_or(config.precompute.max_neighbors_per_node),
        }
    }
}

/// Handle the precompute subcommand.
///
/// Buckets are independent, so each one is built on its own rayon worker
/// with its own store connection to the shared SQLite file.
pub fn handle_precompute(
    paths: &DataPaths,
    config: &EngineConfig,
    args: &PrecomputeArgs,
) -> Result<()> {
    let buckets = args.selected_buckets()?;
    let options = args.options(config);
    if options.max_neighbors == 0 {
        anyhow::bail!("--max-neighbors must be at least 1");
    }
    let snapshot = load_snapshot(&paths.database)?;
    info!(
        systems = snapshot.len(),
        buckets = buckets.len(),
        resume = options.resume,
        "starting jump neighbor precompute"
    );

    let results: Vec<Result<PrecomputeProgress>> = buckets
        .par_iter()
        .map(|&bucket| build_bucket(&snapshot, &paths.neighbors, bucket, &options))
        .collect();

    let mut incomplete = 0usize;
    for result in results {
        let progress = result?;
        if !progress.completed {
            incomplete += 1;
            warn!(
                bucket = progress.bucket.get(),
                remaining = progress.remaining(),
                "bucket budget exhausted; rerun with --resume"
            );
        }
        print_progress(&progress);
    }

    if incomplete > 0 {
        println!("{incomplete} bucket(s) incomplete; rerun with --resume to continue.");
    }
    Ok(())
}

fn build_bucket(
    snapshot: &GraphSnapshot,
    store_path: &Path,
    bucket: RangeBucket,
    options: &PrecomputeOptions,
) -> Result<PrecomputeProgress> {
    let store = SqliteNeighborStore::open(store_path)
        .with_context(|| format!("failed to open neighbor store {}", store_path.display()))?;
    build_range_bucket(snapshot, &store, bucket, options)
        .with_context(|| format!("failed to precompute range bucket {bucket}"))
}

fn print_progress(progress: &PrecomputeProgress) {
    let state = if progress.completed {
        "complete"
    } else {
        "incomplete"
    };
    println!(
        "bucket {:>2}: {} written, {} skipped, {} capped, {} ({} ms)",
        progress.bucket.get(),
        group_digits(progress.written),
        group_digits(progress.skipped),
        group_digits(progress.truncated),
        state,
        progress.elapsed.as_millis()
    );
}
