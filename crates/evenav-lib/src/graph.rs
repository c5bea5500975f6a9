//! Immutable graph snapshots and the store that publishes them.
//!
//! A [`GraphSnapshot`] is built once per refresh and never mutated. Route
//! computations hold an `Arc<GraphSnapshot>` for their whole lifetime, so a
//! concurrent refresh that publishes a new snapshot cannot disturb them.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::db::{GateEdge, System, SystemId, SystemRef};
use crate::error::{Error, Result};
use crate::source::{AmenitySource, GraphSource};

/// Read-only view of systems, gates, and derived labels.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    generation: u64,
    systems: HashMap<SystemId, System>,
    ordered_ids: Vec<SystemId>,
    name_to_id: HashMap<String, SystemId>,
    forward: HashMap<SystemId, Vec<SystemId>>,
    reverse: HashMap<SystemId, Vec<SystemId>>,
    edges: Vec<GateEdge>,
    boundary_distance: HashMap<SystemId, u32>,
}

impl GraphSnapshot {
    /// Build a snapshot from raw systems and directed gate edges.
    ///
    /// Edges referencing unknown systems are skipped with a warning. Duplicate
    /// system ids make the snapshot malformed. When two systems share a name
    /// (case-insensitively), name lookups resolve to the lower id and the
    /// collision is logged.
    pub fn build(systems: Vec<System>, edges: Vec<GateEdge>, generation: u64) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(systems.len());
        let mut name_to_id = HashMap::with_capacity(systems.len());
        for system in systems {
            let id = system.id;
            if !system.position.x.is_finite()
                || !system.position.y.is_finite()
                || !system.position.z.is_finite()
            {
                return Err(Error::MalformedSnapshot {
                    message: format!("system {id} has non-finite coordinates"),
                });
            }
            let name_key = system.name.to_lowercase();
            if by_id.insert(id, system).is_some() {
                return Err(Error::DuplicateSystem { id });
            }
            match name_to_id.entry(name_key) {
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
                Entry::Occupied(mut slot) => {
                    let existing = *slot.get();
                    warn!(
                        name = %slot.key(),
                        kept = existing.min(id),
                        ignored = existing.max(id),
                        "duplicate system name; name lookups use the lowest id"
                    );
                    slot.insert(existing.min(id));
                }
            }
        }

        let mut ordered_ids: Vec<SystemId> = by_id.keys().copied().collect();
        ordered_ids.sort_unstable();

        let mut forward: HashMap<SystemId, Vec<SystemId>> = HashMap::new();
        let mut reverse: HashMap<SystemId, Vec<SystemId>> = HashMap::new();
        let mut kept_edges = Vec::with_capacity(edges.len());
        let mut skipped_edges = 0usize;
        for edge in edges {
            if !by_id.contains_key(&edge.from) || !by_id.contains_key(&edge.to) {
                skipped_edges += 1;
                continue;
            }
            if edge.from == edge.to {
                continue;
            }
            forward.entry(edge.from).or_default().push(edge.to);
            reverse.entry(edge.to).or_default().push(edge.from);
            kept_edges.push(edge);
        }

        for neighbours in forward.values_mut().chain(reverse.values_mut()) {
            neighbours.sort_unstable();
            neighbours.dedup();
        }

        if skipped_edges > 0 {
            warn!(
                skipped_edges,
                "ignored gate edges referencing unknown systems"
            );
        }

        let boundary_distance = label_boundary_distance(&kept_edges, &forward, &reverse);

        Ok(Self {
            generation,
            systems: by_id,
            ordered_ids,
            name_to_id,
            forward,
            reverse,
            edges: kept_edges,
            boundary_distance,
        })
    }

    /// Refresh counter of the build that produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn system(&self, id: SystemId) -> Option<&System> {
        self.systems.get(&id)
    }

    /// Lookup a system by case-insensitive name.
    pub fn system_by_name(&self, name: &str) -> Option<&System> {
        self.name_to_id
            .get(&name.trim().to_lowercase())
            .and_then(|id| self.systems.get(id))
    }

    pub fn system_name(&self, id: SystemId) -> Option<&str> {
        self.systems.get(&id).map(|system| system.name.as_str())
    }

    /// Resolve a reference to a known system id.
    pub fn resolve(&self, reference: &SystemRef) -> Result<SystemId> {
        match reference {
            SystemRef::Id(id) if self.systems.contains_key(id) => Ok(*id),
            SystemRef::Id(id) => Err(Error::UnknownSystem {
                name: format!("#{id}"),
                suggestions: Vec::new(),
            }),
            SystemRef::Name(name) => {
                self.system_by_name(name)
                    .map(|system| system.id)
                    .ok_or_else(|| Error::UnknownSystem {
                        name: name.clone(),
                        suggestions: self.fuzzy_matches(name, 3),
                    })
            }
        }
    }

    /// Names most similar to `name`, best first (Jaro-Winkler >= 0.8).
    pub fn fuzzy_matches(&self, name: &str, limit: usize) -> Vec<String> {
        let needle = name.trim().to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .systems
            .values()
            .map(|system| {
                (
                    strsim::jaro_winkler(&needle, &system.name.to_lowercase()),
                    system.name.as_str(),
                )
            })
            .filter(|(score, _)| *score >= 0.8)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Systems in ascending id order.
    pub fn systems(&self) -> impl Iterator<Item = &System> + '_ {
        self.ordered_ids.iter().filter_map(|id| self.systems.get(id))
    }

    /// System ids in ascending order.
    pub fn system_ids(&self) -> &[SystemId] {
        &self.ordered_ids
    }

    pub fn edges(&self) -> &[GateEdge] {
        &self.edges
    }

    /// Outgoing gate neighbours.
    pub fn gate_neighbours(&self, id: SystemId) -> &[SystemId] {
        self.forward.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Systems with a gate leading into `id`.
    pub fn reverse_neighbours(&self, id: SystemId) -> &[SystemId] {
        self.reverse.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Gate hops to the nearest boundary-crossing gate endpoint.
    pub fn boundary_distance(&self, id: SystemId) -> Option<u32> {
        self.boundary_distance.get(&id).copied()
    }

    /// Systems sitting directly on a boundary-crossing gate.
    pub fn is_chokepoint(&self, id: SystemId) -> bool {
        self.boundary_distance(id) == Some(0)
    }

    /// Straight-line light-year distance between two known systems.
    pub fn distance_ly(&self, a: SystemId, b: SystemId) -> Option<f64> {
        let a = self.systems.get(&a)?;
        let b = self.systems.get(&b)?;
        Some(a.position.distance_ly(&b.position))
    }
}

impl AmenitySource for GraphSnapshot {
    fn has_amenity(&self, system: SystemId) -> bool {
        self.systems
            .get(&system)
            .is_some_and(|system| system.metadata.has_station)
    }
}

/// Multi-source BFS from every endpoint of a boundary-crossing gate.
///
/// Gates are treated as undirected for labelling, so one-way data still
/// yields a sensible hop count.
fn label_boundary_distance(
    edges: &[GateEdge],
    forward: &HashMap<SystemId, Vec<SystemId>>,
    reverse: &HashMap<SystemId, Vec<SystemId>>,
) -> HashMap<SystemId, u32> {
    let mut labels: HashMap<SystemId, u32> = HashMap::new();
    let mut queue = VecDeque::new();

    for edge in edges.iter().filter(|edge| edge.crosses_boundary) {
        for endpoint in [edge.from, edge.to] {
            if labels.insert(endpoint, 0).is_none() {
                queue.push_back(endpoint);
            }
        }
    }

    while let Some(current) = queue.pop_front() {
        let next_label = labels[&current] + 1;
        let outgoing = forward.get(&current).into_iter().flatten();
        let incoming = reverse.get(&current).into_iter().flatten();
        for &next in outgoing.chain(incoming) {
            if labels.contains_key(&next) {
                continue;
            }
            labels.insert(next, next_label);
            queue.push_back(next);
        }
    }

    labels
}

/// Holder for the currently published snapshot.
///
/// `current()` hands out a clone of the `Arc`; `publish` swaps the pointer.
/// The lock is held only for the pointer copy, never across a search.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<GraphSnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: GraphSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The currently published snapshot.
    pub fn current(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: GraphSnapshot) -> Arc<GraphSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Arc::clone(&snapshot);
        snapshot
    }

    /// Rebuild from `source` and publish the result under the next generation.
    ///
    /// The generation is assigned under the write lock at swap time, so
    /// concurrent refreshes publish distinct, increasing generations. On error
    /// the previously published snapshot stays in place.
    pub fn refresh(&self, source: &dyn GraphSource) -> Result<Arc<GraphSnapshot>> {
        let systems = source.list_systems()?;
        let edges = source.list_edges()?;
        let mut snapshot = GraphSnapshot::build(systems, edges, 0)?;

        let published = {
            let mut current = self.current.write();
            snapshot.generation = current.generation() + 1;
            let published = Arc::new(snapshot);
            *current = Arc::clone(&published);
            published
        };
        info!(
            generation = published.generation(),
            systems = published.len(),
            edges = published.edges().len(),
            boundary_labelled = published.boundary_distance.len(),
            "published graph snapshot"
        );
        Ok(published)
    }
}
