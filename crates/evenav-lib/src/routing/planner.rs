use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::{LegKind, PlanContext, PreparedRequest, RouteMode};
use crate::cost::{node_cost, CostComponents, TRAVEL_COST};
use crate::db::SystemId;
use crate::error::Result;
use crate::graph::GraphSnapshot;
use crate::neighbors::{JumpNeighborTable, RangeBucket};
use crate::path::{a_star, corridor_nodes, dijkstra, AStarOptions, SearchOutcome};

/// Fixed spool-up cost charged for every jump.
const JUMP_SPOOL_COST: f64 = 5.0;
/// Fatigue proxy charged per light-year jumped.
const JUMP_FATIGUE_COST_PER_LY: f64 = 6.0;
/// Minimum fuel proxy charged for any jump.
const JUMP_MIN_FUEL_COST: f64 = 1.0;

/// Base cost of a jump of `distance_ly`: distance, fatigue, and fuel proxies.
pub fn jump_leg_cost(distance_ly: f64) -> f64 {
    distance_ly
        + (JUMP_SPOOL_COST + JUMP_FATIGUE_COST_PER_LY * distance_ly)
        + distance_ly.max(JUMP_MIN_FUEL_COST)
}

/// Edge metadata carried through the searches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub kind: LegKind,
    pub distance_ly: f64,
}

impl Leg {
    fn gate(distance_ly: f64) -> Self {
        Self {
            kind: LegKind::Gate,
            distance_ly,
        }
    }

    fn jump(distance_ly: f64) -> Self {
        Self {
            kind: LegKind::Jump,
            distance_ly,
        }
    }

    /// Cost of the leg before the destination system's entry cost.
    pub fn base_cost(&self) -> f64 {
        match self.kind {
            LegKind::Gate => TRAVEL_COST,
            LegKind::Jump => jump_leg_cost(self.distance_ly),
        }
    }
}

/// Which avoided systems are blocked or penalized for one search.
#[derive(Debug, Clone, Copy)]
pub struct SearchConstraints<'a> {
    pub blocked: &'a HashSet<SystemId>,
    pub penalized: &'a HashSet<SystemId>,
    /// Added to the entry cost of every penalized system.
    pub soft_penalty: f64,
    /// Only stop in systems with an amenity station (the destination excepted).
    pub stations_only: bool,
}

/// Request-scoped view shared by every planner.
pub struct SearchEnv<'a> {
    pub ctx: &'a PlanContext<'a>,
    pub prepared: &'a PreparedRequest,
}

impl<'a> SearchEnv<'a> {
    pub fn new(ctx: &'a PlanContext<'a>, prepared: &'a PreparedRequest) -> Self {
        Self { ctx, prepared }
    }

    /// Cost breakdown of entering `id`.
    pub fn node_cost(&self, id: SystemId) -> CostComponents {
        let snapshot = self.ctx.snapshot;
        match snapshot.system(id) {
            Some(system) => node_cost(
                system,
                self.ctx.risk.get(&id),
                snapshot.is_chokepoint(id),
                self.ctx.amenities.has_amenity(id),
                &self.prepared.cost_options,
            ),
            None => CostComponents::default(),
        }
    }

    /// Whether the ship's hull class may enter `id`. The origin is always admissible.
    pub fn admissible(&self, id: SystemId) -> bool {
        if id == self.prepared.origin {
            return true;
        }
        self.ctx
            .snapshot
            .system(id)
            .is_some_and(|system| self.prepared.ship_class.may_enter(system.security_band()))
    }

    pub fn allowed(&self, id: SystemId, constraints: &SearchConstraints<'_>) -> bool {
        if constraints.blocked.contains(&id) || !self.admissible(id) {
            return false;
        }
        !constraints.stations_only
            || id == self.prepared.destination
            || self.ctx.amenities.has_amenity(id)
    }

    /// Risk, infrastructure, and avoidance share of entering `id`.
    pub fn entry_cost(&self, id: SystemId, constraints: &SearchConstraints<'_>) -> f64 {
        let cost = self.node_cost(id);
        let penalty = if constraints.penalized.contains(&id) {
            constraints.soft_penalty
        } else {
            0.0
        };
        self.prepared.risk_weight * cost.risk + cost.infrastructure + penalty
    }
}

/// A jump-neighbor table resolved for the request's ship.
#[derive(Debug, Clone)]
pub struct JumpTable {
    pub table: JumpNeighborTable,
    pub bucket: RangeBucket,
    pub range_ly: f64,
    /// Built in memory because no precomputed table was ready.
    pub online: bool,
}

impl JumpTable {
    fn neighbours(&self, id: SystemId) -> impl Iterator<Item = (SystemId, Leg)> + '_ {
        let range = self.range_ly;
        self.table
            .neighbours(id)
            .filter(move |&(_, distance)| distance <= range)
            .map(|(next, distance)| (next, Leg::jump(distance)))
    }
}

/// Jump table availability for a request.
#[derive(Debug, Clone)]
pub enum JumpAccess {
    Ready(JumpTable),
    Unavailable { reason: String },
}

impl JumpAccess {
    /// Resolve the jump table once per request.
    pub fn load(ctx: &PlanContext<'_>, prepared: &PreparedRequest) -> Result<Self> {
        if let Some(name) = &prepared.unknown_jump_ship {
            return Ok(JumpAccess::Unavailable {
                reason: format!("unknown jump ship type '{name}'"),
            });
        }
        let (Some(ship), Some(range_ly)) = (prepared.jump_ship, prepared.jump_range_ly) else {
            return Ok(JumpAccess::Unavailable {
                reason: "no jump-capable ship specified".to_string(),
            });
        };

        let bucket = RangeBucket::for_range(range_ly);
        let node_count = ctx.snapshot.len();
        if let Some(table) = ctx.neighbors.load_range_bucket(bucket, node_count)? {
            debug!(%ship, range_ly, %bucket, rows = table.len(), "loaded jump neighbor table");
            return Ok(JumpAccess::Ready(JumpTable {
                table,
                bucket,
                range_ly,
                online: false,
            }));
        }

        if ctx.config.online_neighbor_fallback {
            warn!(%bucket, node_count, "jump neighbor table not ready; building online");
            let table = JumpNeighborTable::build(
                ctx.snapshot,
                bucket,
                ctx.config.precompute.max_neighbors_per_node,
            );
            return Ok(JumpAccess::Ready(JumpTable {
                table,
                bucket,
                range_ly,
                online: true,
            }));
        }

        Ok(JumpAccess::Unavailable {
            reason: format!("missing precomputed jump neighbors for range bucket {bucket}"),
        })
    }
}

/// Strategy for one travel mode.
///
/// `successors` and `predecessors` expose the mode's graph without any
/// request constraints so that the avoidance ladder can reason about
/// reachability; `search` applies the constraints.
pub trait RoutePlanner {
    fn mode(&self) -> RouteMode;

    fn successors(&self, id: SystemId) -> Vec<SystemId>;

    fn predecessors(&self, id: SystemId) -> Vec<SystemId>;

    fn search(&self, constraints: &SearchConstraints<'_>) -> SearchOutcome<Leg>;
}

/// Dijkstra over stargate adjacency.
pub struct GatePlanner<'a> {
    env: &'a SearchEnv<'a>,
}

impl<'a> GatePlanner<'a> {
    pub fn new(env: &'a SearchEnv<'a>) -> Self {
        Self { env }
    }
}

fn gate_legs<'s>(
    snapshot: &'s GraphSnapshot,
    id: SystemId,
) -> impl Iterator<Item = (SystemId, Leg)> + 's {
    snapshot.gate_neighbours(id).iter().map(move |&next| {
        let distance = snapshot.distance_ly(id, next).unwrap_or(0.0);
        (next, Leg::gate(distance))
    })
}

impl RoutePlanner for GatePlanner<'_> {
    fn mode(&self) -> RouteMode {
        RouteMode::Gate
    }

    fn successors(&self, id: SystemId) -> Vec<SystemId> {
        self.env.ctx.snapshot.gate_neighbours(id).to_vec()
    }

    fn predecessors(&self, id: SystemId) -> Vec<SystemId> {
        self.env.ctx.snapshot.reverse_neighbours(id).to_vec()
    }

    fn search(&self, constraints: &SearchConstraints<'_>) -> SearchOutcome<Leg> {
        let env = self.env;
        let snapshot = env.ctx.snapshot;
        dijkstra(
            env.prepared.origin,
            env.prepared.destination,
            |id| gate_legs(snapshot, id),
            |_, to, leg: &Leg| {
                env.allowed(to, constraints)
                    .then(|| leg.base_cost() + env.entry_cost(to, constraints))
            },
            &env.ctx.config.search.dijkstra_budget(),
        )
    }
}

/// A* over the jump-neighbor table, pruned to a geometric corridor.
pub struct JumpPlanner<'a> {
    env: &'a SearchEnv<'a>,
    table: &'a JumpTable,
}

impl<'a> JumpPlanner<'a> {
    pub fn new(env: &'a SearchEnv<'a>, table: &'a JumpTable) -> Self {
        Self { env, table }
    }
}

impl RoutePlanner for JumpPlanner<'_> {
    fn mode(&self) -> RouteMode {
        RouteMode::Jump
    }

    fn successors(&self, id: SystemId) -> Vec<SystemId> {
        self.table.neighbours(id).map(|(next, _)| next).collect()
    }

    // Jump reachability is symmetric.
    fn predecessors(&self, id: SystemId) -> Vec<SystemId> {
        self.successors(id)
    }

    fn search(&self, constraints: &SearchConstraints<'_>) -> SearchOutcome<Leg> {
        let env = self.env;
        let snapshot = env.ctx.snapshot;
        let prepared = env.prepared;
        let search = &env.ctx.config.search;
        let table = self.table;

        let corridor = corridor_nodes(
            snapshot,
            prepared.origin,
            prepared.destination,
            search.corridor_factor,
            2.0 * table.range_ly,
        );
        let allow = |id: SystemId| env.allowed(id, constraints);
        let options = AStarOptions {
            allow: Some(&allow),
            corridor: Some(&corridor),
            budget: search.astar_budget(),
        };

        a_star(
            prepared.origin,
            prepared.destination,
            |id| table.neighbours(id),
            |_, to, leg: &Leg| Some(leg.base_cost() + env.entry_cost(to, constraints)),
            |id| snapshot.distance_ly(id, prepared.destination).unwrap_or(0.0),
            &options,
        )
    }
}

/// Dijkstra over gate and jump edges together.
///
/// Without a jump table the planner degrades to gate edges only.
pub struct HybridPlanner<'a> {
    env: &'a SearchEnv<'a>,
    table: Option<&'a JumpTable>,
}

impl<'a> HybridPlanner<'a> {
    pub fn new(env: &'a SearchEnv<'a>, table: Option<&'a JumpTable>) -> Self {
        Self { env, table }
    }
}

impl RoutePlanner for HybridPlanner<'_> {
    fn mode(&self) -> RouteMode {
        RouteMode::Hybrid
    }

    fn successors(&self, id: SystemId) -> Vec<SystemId> {
        let mut out = self.env.ctx.snapshot.gate_neighbours(id).to_vec();
        if let Some(table) = self.table {
            out.extend(table.neighbours(id).map(|(next, _)| next));
        }
        out
    }

    fn predecessors(&self, id: SystemId) -> Vec<SystemId> {
        let mut out = self.env.ctx.snapshot.reverse_neighbours(id).to_vec();
        if let Some(table) = self.table {
            out.extend(table.neighbours(id).map(|(next, _)| next));
        }
        out
    }

    fn search(&self, constraints: &SearchConstraints<'_>) -> SearchOutcome<Leg> {
        let env = self.env;
        let snapshot = env.ctx.snapshot;
        let table = self.table;
        dijkstra(
            env.prepared.origin,
            env.prepared.destination,
            |id| {
                let jumps = table
                    .into_iter()
                    .flat_map(move |table| table.neighbours(id));
                gate_legs(snapshot, id).chain(jumps)
            },
            |_, to, leg: &Leg| {
                env.allowed(to, constraints)
                    .then(|| leg.base_cost() + env.entry_cost(to, constraints))
            },
            &env.ctx.config.search.dijkstra_budget(),
        )
    }
}
