//! Avoidance ladder.
//!
//! A strict request first searches with every avoided system blocked. When
//! that fails, a bounded run of avoided systems adjacent to the origin or the
//! destination may be admitted (the exception corridor); if that still fails,
//! the search falls back to soft avoidance where avoided systems only cost
//! extra. Any relaxation is reported.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use super::planner::{Leg, RoutePlanner, SearchConstraints, SearchEnv};
use super::{AvoidanceStrictness, PreparedRequest};
use crate::db::SystemId;
use crate::path::SearchOutcome;

/// Which end of the route an exception corridor was admitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorSide {
    Entry,
    Exit,
    Both,
}

/// How avoidance was applied to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvoidanceReport {
    pub requested: AvoidanceStrictness,
    pub applied: AvoidanceStrictness,
    pub fallback_used: bool,
    /// Number of systems the request asked to avoid.
    pub avoided_systems: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corridor_side: Option<CorridorSide>,
    /// Avoided systems admitted by the exception corridor.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exception_corridor: Vec<SystemId>,
}

impl AvoidanceReport {
    pub(crate) fn untouched(requested: AvoidanceStrictness) -> Self {
        Self {
            requested,
            applied: requested,
            fallback_used: false,
            avoided_systems: 0,
            corridor_side: None,
            exception_corridor: Vec::new(),
        }
    }

    /// Blocked and penalized sets matching the constraints that produced the route.
    pub(crate) fn constraint_sets(
        &self,
        prepared: &PreparedRequest,
    ) -> (HashSet<SystemId>, HashSet<SystemId>) {
        let forbidden = &prepared.forbidden;
        match (self.applied, self.corridor_side) {
            (AvoidanceStrictness::Strict, _) => (forbidden.clone(), HashSet::new()),
            (AvoidanceStrictness::Soft, Some(_)) => {
                let corridor: HashSet<SystemId> = self.exception_corridor.iter().copied().collect();
                (forbidden - &corridor, HashSet::new())
            }
            (AvoidanceStrictness::Soft, None) => (HashSet::new(), forbidden.clone()),
        }
    }
}

pub(crate) struct LadderResult {
    pub outcome: SearchOutcome<Leg>,
    pub report: AvoidanceReport,
    pub notes: Vec<String>,
}

/// Run the planner under the request's avoidance policy.
pub(crate) fn run_ladder(env: &SearchEnv<'_>, planner: &dyn RoutePlanner) -> LadderResult {
    let prepared = env.prepared;
    let forbidden = &prepared.forbidden;
    let soft_penalty = env.ctx.config.avoidance.soft_penalty;
    let empty: HashSet<SystemId> = HashSet::new();
    let mut report = AvoidanceReport::untouched(prepared.strictness);
    report.avoided_systems = forbidden.len();
    let mut notes = Vec::new();

    if forbidden.is_empty() {
        let outcome = planner.search(&constraints(&empty, &empty, soft_penalty));
        return LadderResult {
            outcome,
            report,
            notes,
        };
    }

    if prepared.strictness == AvoidanceStrictness::Soft {
        notes.push(format!(
            "soft avoidance: {} systems penalized by {soft_penalty}",
            forbidden.len()
        ));
        let outcome = planner.search(&constraints(&empty, forbidden, soft_penalty));
        return LadderResult {
            outcome,
            report,
            notes,
        };
    }

    let strict = planner.search(&constraints(forbidden, &empty, soft_penalty));
    if strict.is_success() {
        return LadderResult {
            outcome: strict,
            report,
            notes,
        };
    }
    notes.push(format!(
        "strict avoidance of {} systems left no {} route",
        forbidden.len(),
        planner.mode()
    ));

    let max_hops = env.ctx.config.avoidance.max_exception_corridor_hops;
    if let Some((side, corridor)) = find_exception_corridor(env, planner, max_hops) {
        let admitted: HashSet<SystemId> = corridor.iter().copied().collect();
        let blocked = forbidden - &admitted;
        let relaxed = planner.search(&constraints(&blocked, &empty, soft_penalty));
        if relaxed.is_success() {
            debug!(
                mode = %planner.mode(),
                ?side,
                admitted = corridor.len(),
                "exception corridor admitted"
            );
            notes.push(format!(
                "admitted exception corridor of {} avoided systems at {}",
                corridor.len(),
                side_label(side)
            ));
            report.applied = AvoidanceStrictness::Soft;
            report.fallback_used = true;
            report.corridor_side = Some(side);
            report.exception_corridor = corridor;
            return LadderResult {
                outcome: relaxed,
                report,
                notes,
            };
        }
    }

    notes.push(format!("fell back to soft avoidance with penalty {soft_penalty}"));
    report.applied = AvoidanceStrictness::Soft;
    report.fallback_used = true;
    let outcome = planner.search(&constraints(&empty, forbidden, soft_penalty));
    LadderResult {
        outcome,
        report,
        notes,
    }
}

fn constraints<'c>(
    blocked: &'c HashSet<SystemId>,
    penalized: &'c HashSet<SystemId>,
    soft_penalty: f64,
) -> SearchConstraints<'c> {
    SearchConstraints {
        blocked,
        penalized,
        soft_penalty,
        stations_only: false,
    }
}

fn side_label(side: CorridorSide) -> &'static str {
    match side {
        CorridorSide::Entry => "the origin",
        CorridorSide::Exit => "the destination",
        CorridorSide::Both => "both ends",
    }
}

/// Runs of avoided systems reachable from one endpoint.
struct Frontier {
    /// First open system reached, keyed to the avoided run leading to it.
    runs: HashMap<SystemId, Vec<SystemId>>,
    /// Run reaching the opposite endpoint through avoided systems only.
    direct: Option<Vec<SystemId>>,
}

/// Find the shortest admissible run of avoided systems that reconnects the
/// origin and destination at one end of the route, or at both ends.
///
/// The origin is never part of the corridor; the destination is when it is
/// itself avoided.
pub(crate) fn find_exception_corridor(
    env: &SearchEnv<'_>,
    planner: &dyn RoutePlanner,
    max_hops: usize,
) -> Option<(CorridorSide, Vec<SystemId>)> {
    let prepared = env.prepared;
    let origin = prepared.origin;
    let destination = prepared.destination;
    let forbidden = &prepared.forbidden;
    let open = |id: SystemId| env.admissible(id) && !forbidden.contains(&id);
    let avoided = |id: SystemId| env.admissible(id) && forbidden.contains(&id);

    let from_origin = reach(
        std::iter::once(origin),
        |id| planner.successors(id),
        &open,
    );
    let to_destination = if open(destination) {
        reach(
            std::iter::once(destination),
            |id| planner.predecessors(id),
            &open,
        )
    } else {
        HashSet::new()
    };

    let entry_frontier = frontier(
        origin,
        Vec::new(),
        destination,
        forbidden.contains(&destination),
        |id| planner.successors(id),
        &open,
        &avoided,
        max_hops,
    );
    let exit_start = if forbidden.contains(&destination) {
        vec![destination]
    } else {
        Vec::new()
    };
    if exit_start.len() > max_hops {
        return None;
    }
    let exit_frontier = frontier(
        destination,
        exit_start,
        origin,
        false,
        |id| planner.predecessors(id),
        &open,
        &avoided,
        max_hops,
    );

    let entry = shortest_run(&entry_frontier, &to_destination);
    let exit = shortest_run(&exit_frontier, &from_origin);
    match (entry, exit) {
        (Some(entry), Some(exit)) if exit.len() < entry.len() => {
            return Some((CorridorSide::Exit, exit))
        }
        (Some(entry), _) => return Some((CorridorSide::Entry, entry)),
        (None, Some(exit)) => return Some((CorridorSide::Exit, exit)),
        (None, None) => {}
    }

    // Both ends: label every system reachable from an entry frontier system,
    // then look for an exit frontier system carrying a label.
    let mut labels: HashMap<SystemId, SystemId> = HashMap::new();
    let mut queue = VecDeque::new();
    let mut seeds: Vec<_> = entry_frontier.runs.keys().copied().collect();
    seeds.sort_by_key(|seed| (entry_frontier.runs[seed].len(), *seed));
    for seed in seeds {
        if labels.insert(seed, seed).is_none() {
            queue.push_back(seed);
        }
    }
    while let Some(current) = queue.pop_front() {
        let label = labels[&current];
        for next in planner.successors(current) {
            if open(next) && !labels.contains_key(&next) {
                labels.insert(next, label);
                queue.push_back(next);
            }
        }
    }

    exit_frontier
        .runs
        .iter()
        .filter_map(|(exit_node, exit_run)| {
            let entry_node = labels.get(exit_node)?;
            let mut combined = entry_frontier.runs[entry_node].clone();
            combined.extend(exit_run.iter().copied());
            Some(combined)
        })
        .filter(|combined| !combined.is_empty() && combined.len() <= max_hops)
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .map(|combined| (CorridorSide::Both, combined))
}

fn reach<I, S, O>(starts: I, step: S, open: &O) -> HashSet<SystemId>
where
    I: IntoIterator<Item = SystemId>,
    S: Fn(SystemId) -> Vec<SystemId>,
    O: Fn(SystemId) -> bool,
{
    let mut seen: HashSet<SystemId> = starts.into_iter().collect();
    let mut queue: VecDeque<SystemId> = seen.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        for next in step(current) {
            if open(next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

#[allow(clippy::too_many_arguments)]
fn frontier<S, O, A>(
    start: SystemId,
    start_run: Vec<SystemId>,
    terminal: SystemId,
    admit_terminal: bool,
    step: S,
    open: &O,
    avoided: &A,
    max_hops: usize,
) -> Frontier
where
    S: Fn(SystemId) -> Vec<SystemId>,
    O: Fn(SystemId) -> bool,
    A: Fn(SystemId) -> bool,
{
    let mut result = Frontier {
        runs: HashMap::new(),
        direct: None,
    };
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, start_run)]);

    while let Some((current, run)) = queue.pop_front() {
        for next in step(current) {
            if !visited.insert(next) {
                continue;
            }
            if next == terminal {
                let mut direct = run.clone();
                if admit_terminal {
                    direct.push(next);
                }
                if direct.len() <= max_hops && result.direct.is_none() {
                    result.direct = Some(direct);
                }
            } else if open(next) {
                result.runs.entry(next).or_insert_with(|| run.clone());
            } else if avoided(next) && run.len() < max_hops {
                let mut extended = run.clone();
                extended.push(next);
                queue.push_back((next, extended));
            }
        }
    }
    result
}

fn shortest_run(frontier: &Frontier, targets: &HashSet<SystemId>) -> Option<Vec<SystemId>> {
    frontier
        .runs
        .iter()
        .filter(|(node, run)| targets.contains(node) && !run.is_empty())
        .map(|(_, run)| run.clone())
        .chain(frontier.direct.clone().filter(|run| !run.is_empty()))
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
}
