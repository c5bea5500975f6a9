//! Precomputed jump-neighbor tables.
//!
//! For each integer range bucket (1..=10 light-years) every system gets a row
//! listing the systems reachable by a single jump of at most that radius,
//! nearest first. Rows are built offline by [`build_range_bucket`], persisted
//! through a [`NeighborStore`], and loaded read-only by the planner.

pub mod codec;
pub mod precompute;
pub mod store;
pub mod table;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use codec::Compression;
pub use precompute::{build_range_bucket, PrecomputeOptions, PrecomputeProgress};
pub use store::{MemoryNeighborStore, NeighborStore, SqliteNeighborStore};
pub use table::{JumpNeighborTable, NeighborRow, DEFAULT_MAX_NEIGHBORS};

/// Smallest supported bucket radius in light-years.
pub const MIN_RANGE_BUCKET: u8 = 1;
/// Largest supported bucket radius in light-years.
pub const MAX_RANGE_BUCKET: u8 = 10;

/// Integer light-year radius keying a neighbor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RangeBucket(u8);

impl RangeBucket {
    /// Bucket covering an effective jump range: `clamp(floor(range), 1, 10)`.
    ///
    /// Non-finite ranges fall back to the smallest bucket.
    pub fn for_range(range_ly: f64) -> Self {
        if !range_ly.is_finite() {
            return Self(MIN_RANGE_BUCKET);
        }
        let floored = range_ly.floor().clamp(MIN_RANGE_BUCKET as f64, MAX_RANGE_BUCKET as f64);
        Self(floored as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Query radius in light-years.
    pub fn radius_ly(self) -> f64 {
        f64::from(self.0)
    }

    /// Every supported bucket in ascending order.
    pub fn all() -> impl Iterator<Item = RangeBucket> {
        (MIN_RANGE_BUCKET..=MAX_RANGE_BUCKET).map(RangeBucket)
    }
}

impl TryFrom<i64> for RangeBucket {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        if (i64::from(MIN_RANGE_BUCKET)..=i64::from(MAX_RANGE_BUCKET)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidRangeBucket { value })
        }
    }
}

impl From<RangeBucket> for i64 {
    fn from(bucket: RangeBucket) -> Self {
        i64::from(bucket.0)
    }
}

impl fmt::Display for RangeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
