//! In-memory neighbor tables and their snapshot file format.
//!
//! # File format
//!
//! - Header (16 bytes): magic `b"EVJN"`, version (u8), range bucket (u8),
//!   node count (u32 LE), row count (u32 LE), 2 reserved bytes
//! - Body: postcard-serialized rows, zstd compressed
//! - Footer: SHA-256 of the compressed body (32 bytes)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::db::SystemId;
use crate::error::{Error, Result};
use crate::graph::GraphSnapshot;
use crate::neighbors::RangeBucket;
use crate::spatial::BucketIndex;

/// Default cap on neighbors stored per system.
pub const DEFAULT_MAX_NEIGHBORS: usize = 250;

const TABLE_MAGIC: &[u8; 4] = b"EVJN";
const TABLE_VERSION: u8 = 1;
const HEADER_SIZE: usize = 16;
const CHECKSUM_SIZE: usize = 32;
const COMPRESSION_LEVEL: i32 = 3;

/// Jump destinations of one system, nearest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborRow {
    ids: Vec<SystemId>,
    distances: Vec<f32>,
}

impl NeighborRow {
    /// Build a row from `(id, distance_ly)` candidates, keeping at most `cap`.
    ///
    /// Candidates are ordered by distance then id before truncation, so the
    /// kept prefix is always the nearest. Returns the row and whether any
    /// candidate was dropped.
    pub fn from_candidates(mut candidates: Vec<(SystemId, f64)>, cap: usize) -> (Self, bool) {
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        let truncated = candidates.len() > cap;
        candidates.truncate(cap);
        let (ids, distances) = candidates
            .into_iter()
            .map(|(id, distance)| (id, distance as f32))
            .unzip();
        (Self { ids, distances }, truncated)
    }

    /// Assemble a row from decoded columns.
    pub fn from_columns(ids: Vec<SystemId>, distances: Vec<f32>) -> Result<Self> {
        if ids.len() != distances.len() {
            return Err(Error::NeighborCodec {
                message: format!(
                    "row has {} ids but {} distances",
                    ids.len(),
                    distances.len()
                ),
            });
        }
        Ok(Self { ids, distances })
    }

    pub fn ids(&self) -> &[SystemId] {
        &self.ids
    }

    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(neighbor, distance_ly)` pairs in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (SystemId, f64)> + '_ {
        self.ids
            .iter()
            .zip(&self.distances)
            .map(|(&id, &distance)| (id, f64::from(distance)))
    }
}

/// Neighbor rows for every system at one range bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpNeighborTable {
    bucket: RangeBucket,
    node_count: usize,
    rows: HashMap<SystemId, NeighborRow>,
}

#[derive(Serialize, Deserialize)]
struct TableBody {
    rows: Vec<(SystemId, NeighborRow)>,
}

impl JumpNeighborTable {
    pub fn new(bucket: RangeBucket, node_count: usize) -> Self {
        Self {
            bucket,
            node_count,
            rows: HashMap::new(),
        }
    }

    /// Compute the table directly from a snapshot.
    ///
    /// This is the in-process equivalent of a full precompute pass and is used
    /// when online neighbor fallback is enabled.
    pub fn build(snapshot: &GraphSnapshot, bucket: RangeBucket, max_neighbors: usize) -> Self {
        let index = BucketIndex::from_snapshot(snapshot, bucket.radius_ly());
        let mut table = Self::new(bucket, snapshot.len());
        let mut truncated_rows = 0usize;
        for &id in snapshot.system_ids() {
            let (row, truncated) = NeighborRow::from_candidates(index.within(id), max_neighbors);
            truncated_rows += usize::from(truncated);
            table.insert_row(id, row);
        }
        debug!(
            bucket = bucket.get(),
            rows = table.len(),
            truncated_rows,
            "built jump neighbor table in memory"
        );
        table
    }

    pub fn bucket(&self) -> RangeBucket {
        self.bucket
    }

    /// Number of systems in the snapshot the table was built for.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn insert_row(&mut self, system: SystemId, row: NeighborRow) {
        self.rows.insert(system, row);
    }

    pub fn row(&self, system: SystemId) -> Option<&NeighborRow> {
        self.rows.get(&system)
    }

    /// Jump destinations of `system`; empty when the system has no row.
    pub fn neighbours(&self, system: SystemId) -> impl Iterator<Item = (SystemId, f64)> + '_ {
        self.rows.get(&system).into_iter().flat_map(NeighborRow::iter)
    }

    /// All rows in unspecified order.
    pub fn rows(&self) -> impl Iterator<Item = (SystemId, &NeighborRow)> + '_ {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table to a snapshot file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut rows: Vec<(SystemId, NeighborRow)> = self
            .rows
            .iter()
            .map(|(id, row)| (*id, row.clone()))
            .collect();
        rows.sort_unstable_by_key(|(id, _)| *id);
        let row_count = rows.len();

        let serialized = postcard::to_allocvec(&TableBody { rows }).map_err(|e| {
            Error::NeighborTableSerialize {
                message: format!("postcard serialization failed: {e}"),
            }
        })?;
        let compressed = zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(
            |e| Error::NeighborTableSerialize {
                message: format!("zstd compression failed: {e}"),
            },
        )?;
        let checksum = Sha256::digest(&compressed);

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(TABLE_MAGIC);
        header[4] = TABLE_VERSION;
        header[5] = self.bucket.get();
        header[6..10].copy_from_slice(&count_field(self.node_count)?.to_le_bytes());
        header[10..14].copy_from_slice(&count_field(row_count)?.to_le_bytes());

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&header)?;
        writer.write_all(&compressed)?;
        writer.write_all(&checksum)?;
        writer.flush()?;

        info!(
            path = %path.display(),
            bucket = self.bucket.get(),
            rows = row_count,
            file_size = HEADER_SIZE + compressed.len() + CHECKSUM_SIZE,
            "saved jump neighbor table"
        );
        Ok(())
    }

    /// Read a table written by [`JumpNeighborTable::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let load_error = |message: String| Error::NeighborTableLoad {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| load_error(format!("failed to open file: {e}")))?;
        let mut bytes = Vec::new();
        BufReader::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| load_error(format!("failed to read file: {e}")))?;

        if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(load_error("file is too short".to_string()));
        }
        let (header, rest) = bytes.split_at(HEADER_SIZE);
        if &header[0..4] != TABLE_MAGIC {
            return Err(load_error("invalid magic bytes".to_string()));
        }
        if header[4] != TABLE_VERSION {
            return Err(load_error(format!(
                "unsupported version {} (expected {TABLE_VERSION})",
                header[4]
            )));
        }
        let bucket = RangeBucket::try_from(i64::from(header[5]))
            .map_err(|e| load_error(e.to_string()))?;
        let node_count = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;
        let row_count =
            u32::from_le_bytes([header[10], header[11], header[12], header[13]]) as usize;

        let (compressed, stored_checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);
        if Sha256::digest(compressed).as_slice() != stored_checksum {
            return Err(load_error(
                "checksum mismatch - file may be corrupted".to_string(),
            ));
        }

        let decompressed = zstd::decode_all(compressed)
            .map_err(|e| load_error(format!("zstd decompression failed: {e}")))?;
        let body: TableBody = postcard::from_bytes(&decompressed)
            .map_err(|e| load_error(format!("postcard deserialization failed: {e}")))?;
        if body.rows.len() != row_count {
            return Err(load_error(format!(
                "header declares {row_count} rows but body holds {}",
                body.rows.len()
            )));
        }

        let table = Self {
            bucket,
            node_count,
            rows: body.rows.into_iter().collect(),
        };
        debug!(
            path = %path.display(),
            bucket = bucket.get(),
            rows = table.len(),
            "loaded jump neighbor table"
        );
        Ok(table)
    }
}

fn count_field(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::NeighborTableSerialize {
        message: format!("{value} does not fit the u32 header field"),
    })
}
