//! Uniform-grid spatial index for fixed-radius neighbour queries.
//!
//! Space is partitioned into cubic cells whose side equals the query radius
//! `R`. A point within `R` of a node must lie in the node's cell or one of the
//! 26 cells around it, so a query scans exactly 27 cells and checks the true
//! distance of every candidate found there.
//!
//! The index is keyed to a single radius. Precompute builds one index per
//! range bucket and reuses it for every node queried in that pass; the
//! planner builds one on demand when online neighbour fallback is enabled.
//!
//! # Example
//!
//! ```
//! use evenav_lib::spatial::BucketIndex;
//!
//! let points = vec![(1, [0.0, 0.0, 0.0]), (2, [3.0, 0.0, 0.0]), (3, [9.0, 0.0, 0.0])];
//! let index = BucketIndex::build(points, 5.0);
//! let neighbours = index.within(1);
//! assert_eq!(neighbours, vec![(2, 3.0)]);
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::db::SystemId;
use crate::geometry::distance_ly_points;
use crate::graph::GraphSnapshot;

type CellKey = (i64, i64, i64);

/// Grid of cubic cells used to answer "everything within R" queries.
#[derive(Debug, Clone)]
pub struct BucketIndex {
    radius: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    points: Vec<(SystemId, [f64; 3])>,
    id_to_index: HashMap<SystemId, usize>,
}

impl BucketIndex {
    /// Build an index over `(id, coordinates in light-years)` pairs.
    ///
    /// A non-positive or non-finite radius yields an index that answers every
    /// query with an empty result.
    pub fn build<I>(points: I, radius_ly: f64) -> Self
    where
        I: IntoIterator<Item = (SystemId, [f64; 3])>,
    {
        let points: Vec<(SystemId, [f64; 3])> = points.into_iter().collect();
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        let mut id_to_index = HashMap::with_capacity(points.len());

        let usable = radius_ly.is_finite() && radius_ly > 0.0;
        if usable {
            for (index, (id, coords)) in points.iter().enumerate() {
                cells
                    .entry(cell_key(coords, radius_ly))
                    .or_default()
                    .push(index);
                id_to_index.insert(*id, index);
            }
        }

        let index = Self {
            radius: radius_ly,
            cells,
            points,
            id_to_index,
        };

        debug!(
            radius_ly,
            points = index.points.len(),
            cells = index.cells.len(),
            largest_cell = index.largest_cell(),
            "built bucket index"
        );

        index
    }

    /// Build an index over every system in a snapshot.
    pub fn from_snapshot(snapshot: &GraphSnapshot, radius_ly: f64) -> Self {
        Self::build(
            snapshot
                .systems()
                .map(|system| (system.id, system.position.to_light_years())),
            radius_ly,
        )
    }

    /// Radius this index was built for.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.id_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_index.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Occupancy of the most populated cell (worst-case scan cost).
    pub fn largest_cell(&self) -> usize {
        self.cells.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Coordinates of an indexed system.
    pub fn position(&self, id: SystemId) -> Option<[f64; 3]> {
        self.id_to_index.get(&id).map(|&idx| self.points[idx].1)
    }

    /// All indexed systems within the radius of `id`, excluding `id` itself.
    ///
    /// Returns `(id, distance_ly)` pairs sorted by distance, then id.
    pub fn within(&self, id: SystemId) -> Vec<(SystemId, f64)> {
        let Some(point) = self.position(id) else {
            return Vec::new();
        };
        let mut results = self.scan(point);
        results.retain(|(other, _)| *other != id);
        results
    }

    /// All indexed systems within the radius of an arbitrary point.
    pub fn within_point(&self, point: [f64; 3]) -> Vec<(SystemId, f64)> {
        self.scan(point)
    }

    fn scan(&self, point: [f64; 3]) -> Vec<(SystemId, f64)> {
        if self.cells.is_empty() {
            return Vec::new();
        }

        let (cx, cy, cz) = cell_key(&point, self.radius);
        let mut results = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(members) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &index in members {
                        let (candidate, coords) = self.points[index];
                        let distance = distance_ly_points(point, coords);
                        if distance <= self.radius {
                            results.push((candidate, distance));
                        }
                    }
                }
            }
        }

        results.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        results
    }
}

fn cell_key(coords: &[f64; 3], radius: f64) -> CellKey {
    (
        (coords[0] / radius).floor() as i64,
        (coords[1] / radius).floor() as i64,
        (coords[2] / radius).floor() as i64,
    )
}
