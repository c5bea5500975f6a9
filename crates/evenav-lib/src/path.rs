//! Shortest-path search primitives.
//!
//! Both searches are generic over the neighbour enumeration and the edge cost
//! so that the gate, jump, and hybrid graphs share one implementation. Edge
//! metadata `E` travels with every relaxation and is returned alongside the
//! path, letting callers recover which kind of edge each leg used.
//!
//! Budgets are part of the contract: exhausting the node or wall-clock budget
//! yields a [`SearchStatus::Partial`] outcome, never a panic or an error.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::db::SystemId;
use crate::graph::GraphSnapshot;

/// Exploration limits for a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchBudget {
    /// Maximum number of nodes explored.
    pub max_nodes: Option<usize>,
    /// Maximum wall-clock time spent searching.
    pub max_duration: Option<Duration>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn nodes(max_nodes: usize) -> Self {
        Self {
            max_nodes: Some(max_nodes),
            max_duration: None,
        }
    }

    pub fn new(max_nodes: usize, max_duration: Duration) -> Self {
        Self {
            max_nodes: Some(max_nodes),
            max_duration: Some(max_duration),
        }
    }

    pub(crate) fn exhausted(&self, explored: usize, started: Instant) -> bool {
        if self.max_nodes.is_some_and(|limit| explored >= limit) {
            return true;
        }
        self.max_duration
            .is_some_and(|limit| started.elapsed() >= limit)
    }
}

/// Terminal state of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// The goal was reached.
    Success,
    /// The budget ran out; the path leads to the best node found so far.
    Partial,
    /// No path exists, or nothing beyond the start was reached in budget.
    Failed,
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<E> {
    pub status: SearchStatus,
    /// Visited systems from the start to the goal (or best partial node).
    pub path: Vec<SystemId>,
    /// Edge metadata for each leg; `edges.len() == path.len() - 1`.
    pub edges: Vec<E>,
    /// Accumulated edge cost of `path`; infinite when the path is empty.
    pub cost: f64,
    /// Number of nodes explored.
    pub explored: usize,
    /// Closest node to the goal that was reached, for explanations.
    pub nearest: Option<SystemId>,
}

impl<E> SearchOutcome<E> {
    fn success(path: Vec<SystemId>, edges: Vec<E>, cost: f64, explored: usize) -> Self {
        let nearest = path.last().copied();
        Self {
            status: SearchStatus::Success,
            path,
            edges,
            cost,
            explored,
            nearest,
        }
    }

    fn failed(explored: usize, nearest: Option<SystemId>) -> Self {
        Self {
            status: SearchStatus::Failed,
            path: Vec::new(),
            edges: Vec::new(),
            cost: f64::INFINITY,
            explored,
            nearest,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SearchStatus::Success
    }
}

/// Restrictions applied during an A* search.
#[derive(Default)]
pub struct AStarOptions<'a> {
    /// Nodes for which this returns `false` are never entered.
    pub allow: Option<&'a dyn Fn(SystemId) -> bool>,
    /// When set, nodes outside the set (other than start and goal) are pruned.
    pub corridor: Option<&'a HashSet<SystemId>>,
    pub budget: SearchBudget,
}

/// Uniform-cost search from `start` to `goal`.
///
/// `cost` returns `None` for edges that must not be taken; returned costs must
/// be finite and non-negative. On budget exhaustion the path leads to the
/// most recently settled node.
pub fn dijkstra<E, N, I, C>(
    start: SystemId,
    goal: SystemId,
    neighbours: N,
    cost: C,
    budget: &SearchBudget,
) -> SearchOutcome<E>
where
    E: Clone,
    N: Fn(SystemId) -> I,
    I: IntoIterator<Item = (SystemId, E)>,
    C: Fn(SystemId, SystemId, &E) -> Option<f64>,
{
    if start == goal {
        return SearchOutcome::success(vec![start], Vec::new(), 0.0, 0);
    }

    let started = Instant::now();
    let mut distances: HashMap<SystemId, f64> = HashMap::new();
    let mut parents: HashMap<SystemId, (SystemId, E)> = HashMap::new();
    let mut queue = BinaryHeap::new();
    let mut explored = 0usize;
    let mut last_settled = start;

    distances.insert(start, 0.0);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        let current_distance = match distances.get(&entry.node) {
            Some(distance) if *distance < entry.cost.0 => continue,
            Some(distance) => *distance,
            None => continue,
        };

        if entry.node == goal {
            let (path, edges) = reconstruct_path(&parents, start, goal);
            return SearchOutcome::success(path, edges, current_distance, explored);
        }

        if budget.exhausted(explored, started) {
            return partial_outcome(&parents, &distances, start, last_settled, explored);
        }

        explored += 1;
        last_settled = entry.node;

        for (next, metadata) in neighbours(entry.node) {
            let Some(step) = cost(entry.node, next, &metadata) else {
                continue;
            };
            if !step.is_finite() || step < 0.0 {
                continue;
            }

            let next_cost = current_distance + step;
            if next_cost < *distances.get(&next).unwrap_or(&f64::INFINITY) {
                distances.insert(next, next_cost);
                parents.insert(next, (entry.node, metadata));
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    let nearest = (last_settled != start).then_some(last_settled);
    SearchOutcome::failed(explored, nearest)
}

/// Heuristic best-first search with pruning and budgets.
///
/// `heuristic` must never overestimate the remaining cost. Exhausting the
/// budget returns the path to the discovered node with the strictly lowest
/// heuristic value; when no node improved on the start, the outcome is
/// `Failed` with an empty path.
pub fn a_star<E, N, I, C, H>(
    start: SystemId,
    goal: SystemId,
    neighbours: N,
    cost: C,
    heuristic: H,
    options: &AStarOptions<'_>,
) -> SearchOutcome<E>
where
    E: Clone,
    N: Fn(SystemId) -> I,
    I: IntoIterator<Item = (SystemId, E)>,
    C: Fn(SystemId, SystemId, &E) -> Option<f64>,
    H: Fn(SystemId) -> f64,
{
    if start == goal {
        return SearchOutcome::success(vec![start], Vec::new(), 0.0, 0);
    }

    let started = Instant::now();
    let mut g_score: HashMap<SystemId, f64> = HashMap::new();
    let mut parents: HashMap<SystemId, (SystemId, E)> = HashMap::new();
    let mut queue = BinaryHeap::new();
    let mut explored = 0usize;

    let mut best_node = start;
    let mut best_heuristic = heuristic(start);

    g_score.insert(start, 0.0);
    queue.push(AStarEntry::new(start, 0.0, best_heuristic));

    while let Some(entry) = queue.pop() {
        let current_score = match g_score.get(&entry.node) {
            Some(score) if *score < entry.cost.0 => continue,
            Some(score) => *score,
            None => continue,
        };

        if entry.node == goal {
            let (path, edges) = reconstruct_path(&parents, start, goal);
            return SearchOutcome::success(path, edges, current_score, explored);
        }

        if options.budget.exhausted(explored, started) {
            return partial_outcome(&parents, &g_score, start, best_node, explored);
        }
        explored += 1;

        for (next, metadata) in neighbours(entry.node) {
            if next == start {
                continue;
            }
            if let Some(allow) = options.allow {
                if !allow(next) {
                    continue;
                }
            }
            if let Some(corridor) = options.corridor {
                if next != goal && !corridor.contains(&next) {
                    continue;
                }
            }
            let Some(step) = cost(entry.node, next, &metadata) else {
                continue;
            };
            if !step.is_finite() || step < 0.0 {
                continue;
            }

            let tentative = current_score + step;
            if tentative < *g_score.get(&next).unwrap_or(&f64::INFINITY) {
                g_score.insert(next, tentative);
                parents.insert(next, (entry.node, metadata));
                let estimate = heuristic(next);
                if estimate < best_heuristic {
                    best_heuristic = estimate;
                    best_node = next;
                }
                queue.push(AStarEntry::new(next, tentative, estimate));
            }
        }
    }

    let nearest = (best_node != start).then_some(best_node);
    SearchOutcome::failed(explored, nearest)
}

/// Systems inside the ellipsoidal funnel between `origin` and `goal`.
///
/// A system `n` is kept when `d(o,n) + d(n,g) <= max(factor * d(o,g), d(o,g) + slack)`,
/// all distances in light-years. The slack keeps short trips from collapsing
/// the funnel onto the direct line.
pub fn corridor_nodes(
    snapshot: &GraphSnapshot,
    origin: SystemId,
    goal: SystemId,
    factor: f64,
    slack_ly: f64,
) -> HashSet<SystemId> {
    let (Some(o), Some(g)) = (snapshot.system(origin), snapshot.system(goal)) else {
        return HashSet::new();
    };
    let direct = o.position.distance_ly(&g.position);
    let bound = (factor * direct).max(direct + slack_ly.max(0.0));

    snapshot
        .systems()
        .filter(|system| {
            let via = o.position.distance_ly(&system.position)
                + system.position.distance_ly(&g.position);
            via <= bound
        })
        .map(|system| system.id)
        .collect()
}

fn partial_outcome<E: Clone>(
    parents: &HashMap<SystemId, (SystemId, E)>,
    scores: &HashMap<SystemId, f64>,
    start: SystemId,
    best: SystemId,
    explored: usize,
) -> SearchOutcome<E> {
    if best == start {
        return SearchOutcome::failed(explored, None);
    }
    let (path, edges) = reconstruct_path(parents, start, best);
    SearchOutcome {
        status: SearchStatus::Partial,
        path,
        edges,
        cost: scores.get(&best).copied().unwrap_or(f64::INFINITY),
        explored,
        nearest: Some(best),
    }
}

fn reconstruct_path<E: Clone>(
    parents: &HashMap<SystemId, (SystemId, E)>,
    start: SystemId,
    goal: SystemId,
) -> (Vec<SystemId>, Vec<E>) {
    let mut path = vec![goal];
    let mut edges = Vec::new();
    let mut current = goal;
    while current != start {
        let Some((parent, metadata)) = parents.get(&current) else {
            break;
        };
        edges.push(metadata.clone());
        path.push(*parent);
        current = *parent;
    }
    path.reverse();
    edges.reverse();
    (path, edges)
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: SystemId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: SystemId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry {
    node: SystemId,
    cost: FloatOrd,
    estimate: FloatOrd,
}

impl AStarEntry {
    fn new(node: SystemId, cost: f64, heuristic: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
