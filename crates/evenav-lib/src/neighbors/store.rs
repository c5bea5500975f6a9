//! Persistence for neighbor rows and precompute progress.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::db::SystemId;
use crate::error::Result;
use crate::neighbors::codec::{self, Compression};
use crate::neighbors::{JumpNeighborTable, NeighborRow, RangeBucket};
use crate::source::NeighborSource;

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Writable side of a neighbor table store.
///
/// Each `write_row` is one unit of work: the row and the advanced cursor
/// become visible together or not at all.
pub trait NeighborStore: NeighborSource {
    /// Remove every row and the progress record of `bucket`.
    fn clear_bucket(&self, bucket: RangeBucket) -> Result<()>;

    /// Highest system id written for `bucket`, if any.
    fn cursor(&self, bucket: RangeBucket) -> Result<Option<SystemId>>;

    /// Persist one row and advance the cursor to `system`.
    fn write_row(&self, bucket: RangeBucket, system: SystemId, row: &NeighborRow) -> Result<()>;

    /// Flag `bucket` as fully built for a snapshot of `node_count` systems.
    fn mark_complete(&self, bucket: RangeBucket, node_count: usize) -> Result<()>;
}

/// SQLite-backed store.
///
/// Safe to open once per bucket from parallel workers against the same file;
/// the busy timeout serializes their write transactions.
pub struct SqliteNeighborStore {
    path: Option<PathBuf>,
    compression: Compression,
    conn: Mutex<Connection>,
}

impl SqliteNeighborStore {
    /// Open (creating when needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS jump_neighbors (
                 range_bucket INTEGER NOT NULL,
                 system_id INTEGER NOT NULL,
                 neighbor_ids BLOB NOT NULL,
                 distances BLOB NOT NULL,
                 PRIMARY KEY (range_bucket, system_id)
             );
             CREATE TABLE IF NOT EXISTS jump_neighbor_progress (
                 range_bucket INTEGER PRIMARY KEY,
                 cursor INTEGER,
                 completed INTEGER NOT NULL DEFAULT 0,
                 node_count INTEGER NOT NULL DEFAULT 0
             );",
        )?;
        Ok(Self {
            path,
            compression: Compression::Zstd,
            conn: Mutex::new(conn),
        })
    }

    /// Select the compression applied to newly written rows.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Buckets flagged complete, with the node count they were built for.
    pub fn completed_buckets(&self) -> Result<Vec<(RangeBucket, usize)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT range_bucket, node_count FROM jump_neighbor_progress
             WHERE completed = 1 ORDER BY range_bucket",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;

        let mut buckets = Vec::new();
        for row in rows {
            let (bucket, node_count) = row?;
            match RangeBucket::try_from(bucket) {
                Ok(bucket) => buckets.push((bucket, node_count.max(0) as usize)),
                Err(err) => warn!(error = %err, "ignoring progress row with invalid bucket"),
            }
        }
        Ok(buckets)
    }
}

impl NeighborSource for SqliteNeighborStore {
    fn load_range_bucket(
        &self,
        bucket: RangeBucket,
        expected_node_count: usize,
    ) -> Result<Option<JumpNeighborTable>> {
        let conn = self.conn.lock();
        let progress: Option<(bool, i64)> = conn
            .query_row(
                "SELECT completed, node_count FROM jump_neighbor_progress WHERE range_bucket = ?1",
                params![i64::from(bucket)],
                |row| Ok((row.get::<_, bool>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        match progress {
            Some((true, node_count)) if node_count == expected_node_count as i64 => {}
            Some((completed, node_count)) => {
                debug!(
                    bucket = bucket.get(),
                    completed,
                    node_count,
                    expected_node_count,
                    "jump neighbor table not ready"
                );
                return Ok(None);
            }
            None => return Ok(None),
        }

        let mut stmt = conn.prepare(
            "SELECT system_id, neighbor_ids, distances FROM jump_neighbors
             WHERE range_bucket = ?1",
        )?;
        let rows = stmt.query_map(params![i64::from(bucket)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, Vec<u8>>(2)?,
            ))
        })?;

        let mut table = JumpNeighborTable::new(bucket, expected_node_count);
        for row in rows {
            let (system, ids, distances) = row?;
            let row = NeighborRow::from_columns(
                codec::decode_ids(&ids)?,
                codec::decode_distances(&distances)?,
            )?;
            table.insert_row(system, row);
        }
        debug!(bucket = bucket.get(), rows = table.len(), "loaded jump neighbor table");
        Ok(Some(table))
    }
}

impl NeighborStore for SqliteNeighborStore {
    fn clear_bucket(&self, bucket: RangeBucket) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM jump_neighbors WHERE range_bucket = ?1",
            params![i64::from(bucket)],
        )?;
        tx.execute(
            "DELETE FROM jump_neighbor_progress WHERE range_bucket = ?1",
            params![i64::from(bucket)],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn cursor(&self, bucket: RangeBucket) -> Result<Option<SystemId>> {
        let conn = self.conn.lock();
        let cursor: Option<Option<i64>> = conn
            .query_row(
                "SELECT cursor FROM jump_neighbor_progress WHERE range_bucket = ?1",
                params![i64::from(bucket)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(cursor.flatten())
    }

    fn write_row(&self, bucket: RangeBucket, system: SystemId, row: &NeighborRow) -> Result<()> {
        let ids = codec::encode_ids(row.ids(), self.compression)?;
        let distances = codec::encode_distances(row.distances(), self.compression)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO jump_neighbors (range_bucket, system_id, neighbor_ids, distances)
             VALUES (?1, ?2, ?3, ?4)",
            params![i64::from(bucket), system, ids, distances],
        )?;
        tx.execute(
            "INSERT INTO jump_neighbor_progress (range_bucket, cursor, completed, node_count)
             VALUES (?1, ?2, 0, 0)
             ON CONFLICT(range_bucket) DO UPDATE SET cursor = excluded.cursor, completed = 0",
            params![i64::from(bucket), system],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn mark_complete(&self, bucket: RangeBucket, node_count: usize) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO jump_neighbor_progress (range_bucket, cursor, completed, node_count)
             VALUES (?1, NULL, 1, ?2)
             ON CONFLICT(range_bucket) DO UPDATE SET completed = 1, node_count = excluded.node_count",
            params![i64::from(bucket), node_count as i64],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BucketState {
    rows: BTreeMap<SystemId, NeighborRow>,
    cursor: Option<SystemId>,
    completed: bool,
    node_count: usize,
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryNeighborStore {
    buckets: Mutex<HashMap<RangeBucket, BucketState>>,
}

impl MemoryNeighborStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored for `bucket`.
    pub fn row_count(&self, bucket: RangeBucket) -> usize {
        self.buckets
            .lock()
            .get(&bucket)
            .map_or(0, |state| state.rows.len())
    }

    /// Install a finished table directly, marking it complete.
    pub fn insert_table(&self, table: &JumpNeighborTable) {
        let rows: BTreeMap<SystemId, NeighborRow> = table
            .rows()
            .map(|(id, row)| (id, row.clone()))
            .collect();
        let state = BucketState {
            cursor: rows.keys().next_back().copied(),
            rows,
            completed: true,
            node_count: table.node_count(),
        };
        self.buckets.lock().insert(table.bucket(), state);
    }
}

impl NeighborSource for MemoryNeighborStore {
    fn load_range_bucket(
        &self,
        bucket: RangeBucket,
        expected_node_count: usize,
    ) -> Result<Option<JumpNeighborTable>> {
        let buckets = self.buckets.lock();
        let Some(state) = buckets.get(&bucket) else {
            return Ok(None);
        };
        if !state.completed || state.node_count != expected_node_count {
            return Ok(None);
        }
        let mut table = JumpNeighborTable::new(bucket, state.node_count);
        for (id, row) in &state.rows {
            table.insert_row(*id, row.clone());
        }
        Ok(Some(table))
    }
}

impl NeighborStore for MemoryNeighborStore {
    fn clear_bucket(&self, bucket: RangeBucket) -> Result<()> {
        self.buckets.lock().remove(&bucket);
        Ok(())
    }

    fn cursor(&self, bucket: RangeBucket) -> Result<Option<SystemId>> {
        Ok(self
            .buckets
            .lock()
            .get(&bucket)
            .and_then(|state| state.cursor))
    }

    fn write_row(&self, bucket: RangeBucket, system: SystemId, row: &NeighborRow) -> Result<()> {
        let mut buckets = self.buckets.lock();
        let state = buckets.entry(bucket).or_default();
        state.rows.insert(system, row.clone());
        state.cursor = Some(system);
        state.completed = false;
        Ok(())
    }

    fn mark_complete(&self, bucket: RangeBucket, node_count: usize) -> Result<()> {
        let mut buckets = self.buckets.lock();
        let state = buckets.entry(bucket).or_default();
        state.completed = true;
        state.node_count = node_count;
        Ok(())
    }
}
