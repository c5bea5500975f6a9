//! Offline construction of jump-neighbor tables.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::graph::GraphSnapshot;
use crate::neighbors::{NeighborRow, NeighborStore, RangeBucket, DEFAULT_MAX_NEIGHBORS};
use crate::path::SearchBudget;
use crate::spatial::BucketIndex;

const PROGRESS_LOG_INTERVAL: usize = 5_000;

/// Knobs for a single precompute pass.
#[derive(Debug, Clone, Copy)]
pub struct PrecomputeOptions {
    /// Continue after the stored cursor instead of rebuilding from scratch.
    pub resume: bool,
    /// Stop cooperatively once this many nodes were written or time elapsed.
    pub budget: SearchBudget,
    pub max_neighbors: usize,
}

impl Default for PrecomputeOptions {
    fn default() -> Self {
        Self {
            resume: false,
            budget: SearchBudget::unlimited(),
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
        }
    }
}

/// Outcome of a precompute pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecomputeProgress {
    pub bucket: RangeBucket,
    /// Systems in the snapshot.
    pub total: usize,
    /// Rows written during this pass.
    pub written: usize,
    /// Systems skipped because a resumed cursor already covered them.
    pub skipped: usize,
    /// Rows that hit the neighbor cap.
    pub truncated: usize,
    /// Whether the bucket is now marked complete.
    pub completed: bool,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl PrecomputeProgress {
    /// Systems that still need a row.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.skipped + self.written)
    }
}

/// Build (or continue building) the neighbor table for one range bucket.
///
/// Systems are processed in ascending id order and every row is committed
/// with the advanced cursor, so an interrupted pass can be resumed without
/// losing or duplicating work. A write failure is returned as an error;
/// rows committed before it remain in the store.
pub fn build_range_bucket(
    snapshot: &GraphSnapshot,
    store: &dyn NeighborStore,
    bucket: RangeBucket,
    options: &PrecomputeOptions,
) -> Result<PrecomputeProgress> {
    let started = Instant::now();

    let cursor = if options.resume {
        store.cursor(bucket)?
    } else {
        store.clear_bucket(bucket)?;
        None
    };

    let index = BucketIndex::from_snapshot(snapshot, bucket.radius_ly());
    info!(
        bucket = bucket.get(),
        systems = snapshot.len(),
        cells = index.cell_count(),
        largest_cell = index.largest_cell(),
        resume_after = ?cursor,
        "starting jump neighbor precompute"
    );

    let ids = snapshot.system_ids();
    let start_at = cursor.map_or(0, |cursor| ids.partition_point(|&id| id <= cursor));

    let mut progress = PrecomputeProgress {
        bucket,
        total: ids.len(),
        written: 0,
        skipped: start_at,
        truncated: 0,
        completed: false,
        elapsed: Duration::ZERO,
    };

    for &id in &ids[start_at..] {
        let (row, truncated) = NeighborRow::from_candidates(index.within(id), options.max_neighbors);
        store.write_row(bucket, id, &row)?;
        progress.written += 1;
        progress.truncated += usize::from(truncated);

        if progress.written % PROGRESS_LOG_INTERVAL == 0 {
            debug!(
                bucket = bucket.get(),
                written = progress.written,
                remaining = progress.remaining(),
                "precompute progress"
            );
        }

        if progress.remaining() > 0 && options.budget.exhausted(progress.written, started) {
            progress.elapsed = started.elapsed();
            info!(
                bucket = bucket.get(),
                written = progress.written,
                remaining = progress.remaining(),
                cursor = id,
                "precompute budget exhausted; resume to continue"
            );
            return Ok(progress);
        }
    }

    store.mark_complete(bucket, snapshot.len())?;
    progress.completed = true;
    progress.elapsed = started.elapsed();
    info!(
        bucket = bucket.get(),
        written = progress.written,
        skipped = progress.skipped,
        truncated = progress.truncated,
        elapsed_ms = progress.elapsed.as_millis() as u64,
        "jump neighbor precompute complete"
    );
    Ok(progress)
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
