//! Multi-modal route planning.
//!
//! This module provides:
//! - [`RouteRequest`] - what the caller wants (endpoints, ship, preferences, avoidance)
//! - [`RouteBundle`] - one [`CandidateRoute`] per travel mode plus the [`Selection`]
//! - [`plan_routes`] - the entry point tying planners, avoidance, and selection together
//!
//! # Strategy Pattern
//!
//! Each travel mode is a [`RoutePlanner`]: the gate planner runs Dijkstra over
//! gate adjacency, the jump planner runs A* over a precomputed neighbor table,
//! and the hybrid planner runs Dijkstra over both edge sets. The avoidance
//! ladder and route assembly are shared and only talk to the trait.
//!
//! Infeasibility is data, not an error: every candidate carries a
//! [`RouteOutcome`] with a human-readable reason when no route was produced.

mod avoidance;
mod planner;
mod profile;
mod selection;

pub use avoidance::{AvoidanceReport, CorridorSide};
pub use planner::{
    jump_leg_cost, GatePlanner, HybridPlanner, JumpAccess, JumpPlanner, JumpTable, Leg,
    RoutePlanner, SearchConstraints, SearchEnv,
};
pub use profile::{PreferenceProfile, ProfileWeights};
pub use selection::{
    normalized_minutes, select_best, NormalizedCost, Selection, SelectionReason,
    DOMINANCE_MINUTES, DOMINANCE_RATIO, EXTRA_GATE_HOP_MARGIN, EXTRA_GATE_PENALTY_PER_HOP,
    FUEL_MINUTES_PER_LY, GATE_MINUTES, JUMP_MINUTES, NEGLIGIBLE_SAVING_MINUTES,
};

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::cost::{CostComponents, CostOptions, RiskAggregate};
use crate::db::{SecurityBand, SystemId, SystemRef};
use crate::error::{Error, Result};
use crate::graph::GraphSnapshot;
use crate::path::{SearchOutcome, SearchStatus};
use crate::ship::{
    effective_range, project_fatigue, FatigueProfile, FatigueRisk, FatigueSummary, JumpShipType,
    ShipClass, MAX_SKILL_LEVEL,
};
use crate::source::{AmenitySource, NeighborSource};

/// Requested travel mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    /// Compute every mode and let the selector choose.
    #[default]
    Auto,
    Gate,
    Jump,
    Hybrid,
}

impl TravelMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "auto" => Some(TravelMode::Auto),
            "gate" | "gates" => Some(TravelMode::Gate),
            "jump" | "jumps" => Some(TravelMode::Jump),
            "hybrid" => Some(TravelMode::Hybrid),
            _ => None,
        }
    }

    /// The concrete candidate forced by this mode, if any.
    pub fn route_mode(self) -> Option<RouteMode> {
        match self {
            TravelMode::Auto => None,
            TravelMode::Gate => Some(RouteMode::Gate),
            TravelMode::Jump => Some(RouteMode::Jump),
            TravelMode::Hybrid => Some(RouteMode::Hybrid),
        }
    }
}

/// Travel mode of a computed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    Gate,
    Jump,
    Hybrid,
}

impl RouteMode {
    pub const ALL: [RouteMode; 3] = [RouteMode::Gate, RouteMode::Jump, RouteMode::Hybrid];
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteMode::Gate => "gate",
            RouteMode::Jump => "jump",
            RouteMode::Hybrid => "hybrid",
        };
        f.write_str(value)
    }
}

/// How avoided systems are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvoidanceStrictness {
    /// Never enter avoided systems unless no route exists otherwise.
    #[default]
    Strict,
    /// Enter avoided systems at a cost penalty.
    Soft,
}

impl fmt::Display for AvoidanceStrictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvoidanceStrictness::Strict => f.write_str("strict"),
            AvoidanceStrictness::Soft => f.write_str("soft"),
        }
    }
}

fn default_safety_vs_speed() -> f64 {
    50.0
}

/// High-level route planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: SystemRef,
    pub destination: SystemRef,
    #[serde(default)]
    pub mode: TravelMode,
    /// Hull size class; defaults to the jump ship's class, then cruiser.
    #[serde(default)]
    pub ship_class: Option<ShipClass>,
    /// Jump-capable ship type name. Unknown names make jump travel infeasible.
    #[serde(default)]
    pub jump_ship: Option<String>,
    /// Jump skill level, clamped to 0..=5.
    #[serde(default)]
    pub skill_level: i32,
    /// Travel through a covert jump bridge (reduced fatigue).
    #[serde(default)]
    pub covert_bridge: bool,
    /// 0 = fastest, 100 = safest; clamped to 0..=100.
    #[serde(default = "default_safety_vs_speed")]
    pub safety_vs_speed: f64,
    /// Explicit profile overriding the one implied by `safety_vs_speed`.
    #[serde(default)]
    pub preference: Option<PreferenceProfile>,
    #[serde(default)]
    pub avoid_lowsec: bool,
    #[serde(default)]
    pub avoid_nullsec: bool,
    #[serde(default)]
    pub avoid_systems: Vec<SystemRef>,
    #[serde(default)]
    pub strictness: AvoidanceStrictness,
    /// Favour stops with a dockable station.
    #[serde(default)]
    pub prefer_stations: bool,
}

impl RouteRequest {
    pub fn new(origin: impl Into<SystemRef>, destination: impl Into<SystemRef>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            mode: TravelMode::Auto,
            ship_class: None,
            jump_ship: None,
            skill_level: 0,
            covert_bridge: false,
            safety_vs_speed: default_safety_vs_speed(),
            preference: None,
            avoid_lowsec: false,
            avoid_nullsec: false,
            avoid_systems: Vec::new(),
            strictness: AvoidanceStrictness::Strict,
            prefer_stations: false,
        }
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_jump_ship(mut self, ship: impl Into<String>, skill_level: i32) -> Self {
        self.jump_ship = Some(ship.into());
        self.skill_level = skill_level;
        self
    }

    pub fn with_safety_vs_speed(mut self, value: f64) -> Self {
        self.safety_vs_speed = value;
        self
    }
}

/// Kind of connection used by a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Gate,
    Jump,
}

/// A visited system with its annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteNode {
    pub id: SystemId,
    pub name: String,
    pub security_status: f64,
    pub security_band: SecurityBand,
    pub has_station: bool,
    pub chokepoint: bool,
    /// Cost of entering this system.
    pub cost: CostComponents,
}

/// One hop of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteLeg {
    pub from: SystemId,
    pub to: SystemId,
    pub kind: LegKind,
    /// Straight-line distance between the endpoints.
    pub distance_ly: f64,
}

/// Aggregates used for selection and display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMetrics {
    pub gate_hops: usize,
    pub jump_hops: usize,
    /// Light-years covered by jump legs.
    pub total_ly: f64,
    pub risk_score: f64,
    pub security_penalty: f64,
    pub exposure_score: f64,
    pub infrastructure_penalty: f64,
    pub total_cooldown_minutes: f64,
    pub final_fatigue_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatigue_risk: Option<FatigueRisk>,
    /// Raw accumulated search cost.
    pub search_cost: f64,
    /// Systems expanded by the search that produced the route.
    pub explored: usize,
}

/// A route with per-node annotations, typed legs, and metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub nodes: Vec<RouteNode>,
    pub legs: Vec<RouteLeg>,
    pub metrics: RouteMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatigue: Option<FatigueSummary>,
}

impl Route {
    pub fn system_ids(&self) -> Vec<SystemId> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    pub fn hop_count(&self) -> usize {
        self.legs.len()
    }
}

/// Result of planning one travel mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteOutcome {
    Found(Route),
    /// The search budget ran out; the route ends at the nearest approach.
    Partial { route: Route, reason: String },
    Infeasible { reason: String },
}

impl RouteOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            RouteOutcome::Found(route) | RouteOutcome::Partial { route, .. } => Some(route),
            RouteOutcome::Infeasible { .. } => None,
        }
    }

    /// The route when the destination was reached.
    pub fn found(&self) -> Option<&Route> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RouteOutcome::Found(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            RouteOutcome::Found(_) => None,
            RouteOutcome::Partial { reason, .. } | RouteOutcome::Infeasible { reason } => {
                Some(reason)
            }
        }
    }
}

/// Outcome of one travel mode with its avoidance report and explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRoute {
    pub mode: RouteMode,
    pub outcome: RouteOutcome,
    pub avoidance: AvoidanceReport,
    pub amenity_detour_applied: bool,
    pub explanation: Vec<String>,
}

impl CandidateRoute {
    fn infeasible(mode: RouteMode, strictness: AvoidanceStrictness, reason: String) -> Self {
        Self {
            mode,
            explanation: vec![reason.clone()],
            outcome: RouteOutcome::Infeasible { reason },
            avoidance: AvoidanceReport::untouched(strictness),
            amenity_detour_applied: false,
        }
    }
}

/// Every candidate of a request and the selected one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteBundle {
    pub snapshot_generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<SystemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<SystemId>,
    pub profile: PreferenceProfile,
    pub gate: CandidateRoute,
    pub jump: CandidateRoute,
    pub hybrid: CandidateRoute,
    pub best: Selection,
    pub explanation: Vec<String>,
}

impl RouteBundle {
    pub fn candidate(&self, mode: RouteMode) -> &CandidateRoute {
        match mode {
            RouteMode::Gate => &self.gate,
            RouteMode::Jump => &self.jump,
            RouteMode::Hybrid => &self.hybrid,
        }
    }

    /// The selected route, if any candidate was feasible.
    pub fn best_route(&self) -> Option<&Route> {
        self.best
            .mode
            .and_then(|mode| self.candidate(mode).outcome.found())
    }

    fn all_infeasible(
        snapshot_generation: u64,
        profile: PreferenceProfile,
        strictness: AvoidanceStrictness,
        reason: String,
    ) -> Self {
        let candidate =
            |mode| CandidateRoute::infeasible(mode, strictness, reason.clone());
        Self {
            snapshot_generation,
            origin: None,
            destination: None,
            profile,
            gate: candidate(RouteMode::Gate),
            jump: candidate(RouteMode::Jump),
            hybrid: candidate(RouteMode::Hybrid),
            best: Selection::none(),
            explanation: vec![reason.clone()],
        }
    }
}

/// Read-only inputs shared by every planner of a request.
#[derive(Clone, Copy)]
pub struct PlanContext<'a> {
    pub snapshot: &'a GraphSnapshot,
    pub risk: &'a HashMap<SystemId, RiskAggregate>,
    pub neighbors: &'a dyn NeighborSource,
    pub amenities: &'a dyn AmenitySource,
    pub config: &'a EngineConfig,
}

/// A request with endpoints resolved and inputs clamped.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub origin: SystemId,
    pub destination: SystemId,
    pub requested_mode: TravelMode,
    pub ship_class: ShipClass,
    pub jump_ship: Option<JumpShipType>,
    /// Raw ship name when it failed to parse.
    pub unknown_jump_ship: Option<String>,
    pub skill_level: i32,
    pub jump_range_ly: Option<f64>,
    pub fatigue_profile: FatigueProfile,
    pub safety_vs_speed: f64,
    /// `0.2 + 0.8 * safety / 100`.
    pub risk_weight: f64,
    pub profile: PreferenceProfile,
    pub cost_options: CostOptions,
    pub forbidden: HashSet<SystemId>,
    pub strictness: AvoidanceStrictness,
    pub prefer_stations: bool,
}

/// Compute gate, jump, and hybrid candidates and select the best one.
///
/// Errors are reserved for collaborator failures (for example a neighbor
/// store that cannot be read). Unknown endpoints, missing tables, and
/// exhausted budgets are reported inside the bundle.
pub fn plan_routes(ctx: &PlanContext<'_>, request: &RouteRequest) -> Result<RouteBundle> {
    let snapshot = ctx.snapshot;
    let fallback_profile = request.preference.unwrap_or_else(|| {
        PreferenceProfile::from_safety_vs_speed(request.safety_vs_speed.clamp(0.0, 100.0))
    });

    let endpoints = snapshot
        .resolve(&request.origin)
        .and_then(|origin| Ok((origin, snapshot.resolve(&request.destination)?)));
    let (origin, destination) = match endpoints {
        Ok(pair) => pair,
        Err(err @ Error::UnknownSystem { .. }) => {
            info!(error = %err, "route endpoints did not resolve");
            return Ok(RouteBundle::all_infeasible(
                snapshot.generation(),
                fallback_profile,
                request.strictness,
                err.to_string(),
            ));
        }
        Err(err) => return Err(err),
    };

    let mut explanation = Vec::new();
    let prepared = prepare_request(ctx, request, origin, destination, &mut explanation);

    info!(
        origin,
        destination,
        mode = ?prepared.requested_mode,
        profile = %prepared.profile,
        risk_weight = prepared.risk_weight,
        forbidden = prepared.forbidden.len(),
        generation = snapshot.generation(),
        "planning routes"
    );

    if let Some(reason) = destination_block(ctx, &prepared) {
        let mut bundle = RouteBundle::all_infeasible(
            snapshot.generation(),
            prepared.profile,
            prepared.strictness,
            reason,
        );
        bundle.origin = Some(origin);
        bundle.destination = Some(destination);
        return Ok(bundle);
    }

    let env = SearchEnv::new(ctx, &prepared);
    let access = JumpAccess::load(ctx, &prepared)?;

    let gate = run_candidate(&env, &GatePlanner::new(&env));

    let jump = match &access {
        JumpAccess::Ready(table) => {
            let planner = JumpPlanner::new(&env, table);
            let mut candidate = run_candidate(&env, &planner);
            apply_amenity_detour(&env, &planner, &mut candidate);
            if table.online {
                candidate.explanation.push(format!(
                    "jump neighbors for range bucket {} built online",
                    table.bucket
                ));
            }
            candidate
        }
        JumpAccess::Unavailable { reason } => {
            CandidateRoute::infeasible(RouteMode::Jump, prepared.strictness, reason.clone())
        }
    };

    let hybrid = match &access {
        JumpAccess::Ready(table) => run_candidate(&env, &HybridPlanner::new(&env, Some(table))),
        JumpAccess::Unavailable { reason } => {
            let mut candidate = run_candidate(&env, &HybridPlanner::new(&env, None));
            candidate
                .explanation
                .push(format!("hybrid limited to gate edges: {reason}"));
            candidate
        }
    };

    let best = select_best(
        &[&gate, &jump, &hybrid],
        prepared.profile,
        prepared.requested_mode,
    );
    match best.mode {
        Some(mode) => explanation.push(format!(
            "selected {mode} route ({})",
            best.reason.code()
        )),
        None => explanation.push("no feasible route in any mode".to_string()),
    }

    info!(
        selected = ?best.mode,
        reason = best.reason.code(),
        dominance = best.dominance_rule_applied,
        "route planning finished"
    );

    Ok(RouteBundle {
        snapshot_generation: snapshot.generation(),
        origin: Some(origin),
        destination: Some(destination),
        profile: prepared.profile,
        gate,
        jump,
        hybrid,
        best,
        explanation,
    })
}

fn prepare_request(
    ctx: &PlanContext<'_>,
    request: &RouteRequest,
    origin: SystemId,
    destination: SystemId,
    explanation: &mut Vec<String>,
) -> PreparedRequest {
    let snapshot = ctx.snapshot;

    let safety_vs_speed = if request.safety_vs_speed.is_finite() {
        request.safety_vs_speed.clamp(0.0, 100.0)
    } else {
        default_safety_vs_speed()
    };
    if safety_vs_speed != request.safety_vs_speed {
        explanation.push(format!(
            "safety_vs_speed {} clamped to {safety_vs_speed}",
            request.safety_vs_speed
        ));
    }

    let skill_level = request.skill_level.clamp(0, i32::from(MAX_SKILL_LEVEL));
    if skill_level != request.skill_level {
        explanation.push(format!(
            "skill level {} clamped to {skill_level}",
            request.skill_level
        ));
    }

    let jump_ship = request.jump_ship.as_deref().and_then(JumpShipType::parse);
    let unknown_jump_ship = match (&request.jump_ship, jump_ship) {
        (Some(name), None) => Some(name.clone()),
        _ => None,
    };
    let ship_class = request
        .ship_class
        .or_else(|| jump_ship.map(JumpShipType::hull_class))
        .unwrap_or_default();

    let profile = request
        .preference
        .unwrap_or_else(|| PreferenceProfile::from_safety_vs_speed(safety_vs_speed));
    let risk_weight = 0.2 + 0.8 * safety_vs_speed / 100.0;
    explanation.push(format!(
        "profile {profile} (safety_vs_speed {safety_vs_speed}), risk weight {risk_weight:.2}"
    ));

    let mut forbidden = HashSet::new();
    if request.avoid_lowsec || request.avoid_nullsec {
        for system in snapshot.systems() {
            let band = system.security_band();
            if (request.avoid_lowsec && band == SecurityBand::Low)
                || (request.avoid_nullsec && band == SecurityBand::Null)
            {
                forbidden.insert(system.id);
            }
        }
    }
    for reference in &request.avoid_systems {
        match snapshot.resolve(reference) {
            Ok(id) => {
                forbidden.insert(id);
            }
            Err(err) => explanation.push(format!("ignored avoided system: {err}")),
        }
    }

    PreparedRequest {
        origin,
        destination,
        requested_mode: request.mode,
        ship_class,
        jump_ship,
        unknown_jump_ship,
        skill_level,
        jump_range_ly: jump_ship.map(|ship| effective_range(ship, skill_level)),
        fatigue_profile: FatigueProfile::for_ship(jump_ship, ship_class, request.covert_bridge),
        safety_vs_speed,
        risk_weight,
        profile,
        cost_options: CostOptions {
            weights: ctx.config.risk,
            ship_class,
            prefer_stations: request.prefer_stations,
        },
        forbidden,
        strictness: request.strictness,
        prefer_stations: request.prefer_stations,
    }
}

fn destination_block(ctx: &PlanContext<'_>, prepared: &PreparedRequest) -> Option<String> {
    let system = ctx.snapshot.system(prepared.destination)?;
    let band = system.security_band();
    if prepared.origin != prepared.destination && !prepared.ship_class.may_enter(band) {
        return Some(format!(
            "{} hulls cannot enter {band}-sec destination {}",
            prepared.ship_class, system.name
        ));
    }
    None
}

fn run_candidate(env: &SearchEnv<'_>, planner: &dyn RoutePlanner) -> CandidateRoute {
    let ladder = avoidance::run_ladder(env, planner);
    let mode = planner.mode();
    let outcome = outcome_from_search(env, mode, &ladder.outcome);
    let mut explanation = ladder.notes;
    match &outcome {
        RouteOutcome::Found(route) => explanation.push(format!(
            "{mode} route: {} gate hops, {} jumps, {:.2} LY jumped, risk {:.1}",
            route.metrics.gate_hops,
            route.metrics.jump_hops,
            route.metrics.total_ly,
            route.metrics.risk_score
        )),
        RouteOutcome::Partial { reason, .. } | RouteOutcome::Infeasible { reason } => {
            explanation.push(reason.clone())
        }
    }
    debug!(
        mode = %mode,
        found = outcome.is_found(),
        fallback_used = ladder.report.fallback_used,
        explored = ladder.outcome.explored,
        "candidate planned"
    );
    CandidateRoute {
        mode,
        outcome,
        avoidance: ladder.report,
        amenity_detour_applied: false,
        explanation,
    }
}

/// Re-plan a found jump route through station systems only.
///
/// Accepted when it costs at most one extra jump; only attempted when the
/// request leans towards safety.
fn apply_amenity_detour(env: &SearchEnv<'_>, planner: &JumpPlanner<'_>, candidate: &mut CandidateRoute) {
    let prepared = env.prepared;
    if !prepared.prefer_stations {
        return;
    }
    let Some(base_hops) = candidate.outcome.found().map(|route| route.metrics.jump_hops) else {
        return;
    };
    if prepared.safety_vs_speed <= 50.0 {
        candidate.explanation.push(format!(
            "amenity detour denied: safety_vs_speed {} does not exceed 50",
            prepared.safety_vs_speed
        ));
        return;
    }

    let (blocked, penalized) = candidate.avoidance.constraint_sets(prepared);
    let constraints = SearchConstraints {
        blocked: &blocked,
        penalized: &penalized,
        soft_penalty: env.ctx.config.avoidance.soft_penalty,
        stations_only: true,
    };
    let detour = planner.search(&constraints);
    if !detour.is_success() {
        candidate
            .explanation
            .push("amenity detour rejected: no route through station systems".to_string());
        return;
    }

    let route = assemble_route(env, &detour);
    if route.metrics.jump_hops <= base_hops + 1 {
        candidate.explanation.push(format!(
            "amenity detour applied: {} jumps with a station at every stop",
            route.metrics.jump_hops
        ));
        candidate.outcome = RouteOutcome::Found(route);
        candidate.amenity_detour_applied = true;
    } else {
        candidate.explanation.push(format!(
            "amenity detour rejected: needs {} jumps, {} more than allowed",
            route.metrics.jump_hops,
            route.metrics.jump_hops - base_hops - 1
        ));
    }
}

fn outcome_from_search(
    env: &SearchEnv<'_>,
    mode: RouteMode,
    outcome: &SearchOutcome<Leg>,
) -> RouteOutcome {
    match outcome.status {
        SearchStatus::Success => RouteOutcome::Found(assemble_route(env, outcome)),
        SearchStatus::Partial => RouteOutcome::Partial {
            route: assemble_route(env, outcome),
            reason: format!(
                "{mode} search budget exhausted after {} systems; {}",
                outcome.explored,
                nearest_approach(env, outcome.nearest)
            ),
        },
        SearchStatus::Failed => {
            let reason = match outcome.nearest {
                Some(_) => format!(
                    "no {mode} route found; {}",
                    nearest_approach(env, outcome.nearest)
                ),
                None => format!("no {mode} route found"),
            };
            RouteOutcome::Infeasible { reason }
        }
    }
}

fn nearest_approach(env: &SearchEnv<'_>, nearest: Option<SystemId>) -> String {
    let snapshot = env.ctx.snapshot;
    let Some(id) = nearest else {
        return "no progress beyond the origin".to_string();
    };
    let name = snapshot.system_name(id).unwrap_or("unknown");
    match snapshot.distance_ly(id, env.prepared.destination) {
        Some(distance) => format!("nearest approach {name} at {distance:.2} LY from destination"),
        None => format!("nearest approach {name}"),
    }
}

pub(crate) fn assemble_route(env: &SearchEnv<'_>, outcome: &SearchOutcome<Leg>) -> Route {
    let snapshot = env.ctx.snapshot;
    let nodes: Vec<RouteNode> = outcome
        .path
        .iter()
        .filter_map(|&id| {
            let system = snapshot.system(id)?;
            Some(RouteNode {
                id,
                name: system.name.clone(),
                security_status: system.metadata.security_status,
                security_band: system.security_band(),
                has_station: env.ctx.amenities.has_amenity(id),
                chokepoint: snapshot.is_chokepoint(id),
                cost: env.node_cost(id),
            })
        })
        .collect();

    let legs: Vec<RouteLeg> = outcome
        .path
        .windows(2)
        .zip(&outcome.edges)
        .map(|(pair, leg)| RouteLeg {
            from: pair[0],
            to: pair[1],
            kind: leg.kind,
            distance_ly: leg.distance_ly,
        })
        .collect();

    let mut entered = CostComponents::default();
    for node in nodes.iter().skip(1) {
        entered.add(&node.cost);
    }

    let jump_distances: Vec<f64> = legs
        .iter()
        .filter(|leg| leg.kind == LegKind::Jump)
        .map(|leg| leg.distance_ly)
        .collect();
    let fatigue = (!jump_distances.is_empty())
        .then(|| project_fatigue(&jump_distances, env.prepared.fatigue_profile));

    let metrics = RouteMetrics {
        gate_hops: legs.iter().filter(|leg| leg.kind == LegKind::Gate).count(),
        jump_hops: jump_distances.len(),
        total_ly: jump_distances.iter().sum(),
        risk_score: entered.risk,
        security_penalty: entered.security_penalty,
        exposure_score: entered.exposure,
        infrastructure_penalty: entered.infrastructure,
        total_cooldown_minutes: fatigue.as_ref().map_or(0.0, |f| f.total_cooldown_minutes),
        final_fatigue_minutes: fatigue.as_ref().map_or(0.0, |f| f.final_fatigue_minutes),
        fatigue_risk: fatigue.as_ref().map(|f| f.risk),
        search_cost: outcome.cost,
        explored: outcome.explored,
    };

    Route {
        nodes,
        legs,
        metrics,
        fatigue,
    }
}
