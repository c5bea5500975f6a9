//! Choosing the best candidate.
//!
//! Candidates are compared on a normalized cost in minutes: travel time per
//! hop, fuel per light-year, jump cooldown, and the profile-weighted risk and
//! security terms. Routes that take many more gates than a competitor for a
//! negligible saving are penalized, and a jump route that is nearly as good
//! as the hybrid one is preferred for its simplicity.

use std::cmp::Ordering;

use serde::Serialize;

use super::profile::{PreferenceProfile, ProfileWeights};
use super::{CandidateRoute, RouteMetrics, RouteMode, TravelMode};

/// Minutes per gate hop.
pub const GATE_MINUTES: f64 = 1.5;
/// Minutes per jump, before the profile's per-jump surcharge.
pub const JUMP_MINUTES: f64 = 1.0;
/// Fuel cost in minutes per light-year jumped.
pub const FUEL_MINUTES_PER_LY: f64 = 0.5;
/// Gate hops beyond a competitor's count that trigger the extra-gate check.
pub const EXTRA_GATE_HOP_MARGIN: usize = 3;
/// Savings below this many minutes do not justify extra gates.
pub const NEGLIGIBLE_SAVING_MINUTES: f64 = 2.0;
/// Penalty in minutes per extra gate hop.
pub const EXTRA_GATE_PENALTY_PER_HOP: f64 = 0.75;
/// Absolute slack for the jump-over-hybrid dominance rule.
pub const DOMINANCE_MINUTES: f64 = 1.0;
/// Relative slack for the jump-over-hybrid dominance rule.
pub const DOMINANCE_RATIO: f64 = 0.05;

const TIE_EPSILON: f64 = 1e-9;

/// Why a candidate was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    RequestedMode,
    OnlyFeasibleCandidate,
    JumpDominatesHybridTimeThreshold,
    NormalizedTotalCost,
    NormalizedTotalCostWithExtraGatePenalty,
    TieBreak,
    NoFeasibleRoute,
}

impl SelectionReason {
    pub fn code(self) -> &'static str {
        match self {
            SelectionReason::RequestedMode => "requested_mode",
            SelectionReason::OnlyFeasibleCandidate => "only_feasible_candidate",
            SelectionReason::JumpDominatesHybridTimeThreshold => {
                "jump_dominates_hybrid_time_threshold"
            }
            SelectionReason::NormalizedTotalCost => "normalized_total_cost",
            SelectionReason::NormalizedTotalCostWithExtraGatePenalty => {
                "normalized_total_cost_with_extra_gate_penalty"
            }
            SelectionReason::TieBreak => "tie_break",
            SelectionReason::NoFeasibleRoute => "no_feasible_route",
        }
    }
}

/// Normalized cost of one feasible candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedCost {
    pub mode: RouteMode,
    pub minutes: f64,
    pub extra_gate_penalty: f64,
    pub total: f64,
}

/// Outcome of candidate selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Selected mode; `None` when nothing was feasible.
    pub mode: Option<RouteMode>,
    pub reason: SelectionReason,
    pub dominance_rule_applied: bool,
    pub costs: Vec<NormalizedCost>,
}

impl Selection {
    pub(crate) fn none() -> Self {
        Self {
            mode: None,
            reason: SelectionReason::NoFeasibleRoute,
            dominance_rule_applied: false,
            costs: Vec::new(),
        }
    }

    pub fn cost(&self, mode: RouteMode) -> Option<&NormalizedCost> {
        self.costs.iter().find(|cost| cost.mode == mode)
    }
}

/// Normalized cost of a route in minutes under `weights`.
pub fn normalized_minutes(metrics: &RouteMetrics, weights: &ProfileWeights) -> f64 {
    let gates = metrics.gate_hops as f64;
    let jumps = metrics.jump_hops as f64;
    weights.gate_cost * gates * GATE_MINUTES
        + weights.jump_cost * jumps * (JUMP_MINUTES + weights.per_jump)
        + weights.fuel * metrics.total_ly * FUEL_MINUTES_PER_LY
        + weights.jump_cost * metrics.total_cooldown_minutes
        + weights.risk * metrics.risk_score
        + weights.security_penalty * metrics.security_penalty
}

struct Scored<'a> {
    mode: RouteMode,
    metrics: &'a RouteMetrics,
    minutes: f64,
    penalty: f64,
}

impl Scored<'_> {
    fn total(&self) -> f64 {
        self.minutes + self.penalty
    }
}

fn compare(a: &Scored<'_>, b: &Scored<'_>, with_penalty: bool) -> Ordering {
    let (lhs, rhs) = if with_penalty {
        (a.total(), b.total())
    } else {
        (a.minutes, b.minutes)
    };
    if (lhs - rhs).abs() >= TIE_EPSILON {
        return lhs.total_cmp(&rhs);
    }
    tie_break(a, b)
}

fn tie_break(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    a.metrics
        .gate_hops
        .cmp(&b.metrics.gate_hops)
        .then(a.metrics.jump_hops.cmp(&b.metrics.jump_hops))
        .then(a.metrics.total_ly.total_cmp(&b.metrics.total_ly))
}

/// Select the best feasible candidate.
///
/// Only candidates that reached the destination compete. A non-auto
/// `requested` mode wins whenever its candidate is feasible.
pub fn select_best(
    candidates: &[&CandidateRoute],
    profile: PreferenceProfile,
    requested: TravelMode,
) -> Selection {
    let weights = profile.weights();
    let mut scored: Vec<Scored<'_>> = candidates
        .iter()
        .filter_map(|candidate| {
            let route = candidate.outcome.found()?;
            Some(Scored {
                mode: candidate.mode,
                metrics: &route.metrics,
                minutes: normalized_minutes(&route.metrics, weights),
                penalty: 0.0,
            })
        })
        .collect();

    if scored.is_empty() {
        return Selection::none();
    }

    // Penalize a candidate for every competitor it beats by a negligible
    // margin while taking at least EXTRA_GATE_HOP_MARGIN more gates.
    let snapshot: Vec<(usize, f64)> = scored
        .iter()
        .map(|entry| (entry.metrics.gate_hops, entry.minutes))
        .collect();
    for entry in scored.iter_mut() {
        let gates = entry.metrics.gate_hops;
        for &(other_gates, other_minutes) in &snapshot {
            let saving = other_minutes - entry.minutes;
            if gates >= other_gates + EXTRA_GATE_HOP_MARGIN && saving < NEGLIGIBLE_SAVING_MINUTES {
                let extra = (gates - other_gates) as f64 * EXTRA_GATE_PENALTY_PER_HOP;
                entry.penalty = entry.penalty.max(extra);
            }
        }
    }

    let costs: Vec<NormalizedCost> = scored
        .iter()
        .map(|entry| NormalizedCost {
            mode: entry.mode,
            minutes: entry.minutes,
            extra_gate_penalty: entry.penalty,
            total: entry.total(),
        })
        .collect();

    let selection = |mode, reason, dominance_rule_applied| Selection {
        mode: Some(mode),
        reason,
        dominance_rule_applied,
        costs,
    };

    if let Some(mode) = requested.route_mode() {
        if scored.iter().any(|entry| entry.mode == mode) {
            return selection(mode, SelectionReason::RequestedMode, false);
        }
    }

    if scored.len() == 1 {
        return selection(scored[0].mode, SelectionReason::OnlyFeasibleCandidate, false);
    }

    let mut ranked: Vec<&Scored<'_>> = scored.iter().collect();
    ranked.sort_by(|a, b| compare(a, b, true));
    let winner = ranked[0];
    let runner_up = ranked[1];

    let raw_best = scored
        .iter()
        .min_by(|a, b| compare(a, b, false))
        .map(|entry| entry.mode);

    let mut reason = if (winner.total() - runner_up.total()).abs() < TIE_EPSILON {
        SelectionReason::TieBreak
    } else if raw_best != Some(winner.mode) {
        SelectionReason::NormalizedTotalCostWithExtraGatePenalty
    } else {
        SelectionReason::NormalizedTotalCost
    };
    let mut mode = winner.mode;
    let mut dominance = false;

    let jump = scored.iter().find(|entry| entry.mode == RouteMode::Jump);
    let hybrid = scored.iter().find(|entry| entry.mode == RouteMode::Hybrid);
    if let (Some(jump), Some(hybrid)) = (jump, hybrid) {
        let threshold = DOMINANCE_MINUTES.max(DOMINANCE_RATIO * hybrid.total());
        if matches!(mode, RouteMode::Jump | RouteMode::Hybrid)
            && jump.total() - hybrid.total() <= threshold
        {
            mode = RouteMode::Jump;
            reason = SelectionReason::JumpDominatesHybridTimeThreshold;
            dominance = true;
        }
    }

    selection(mode, reason, dominance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{AvoidanceReport, AvoidanceStrictness, Route, RouteOutcome};

    fn metrics(gate_hops: usize, jump_hops: usize, total_ly: f64, risk: f64) -> RouteMetrics {
        RouteMetrics {
            gate_hops,
            jump_hops,
            total_ly,
            risk_score: risk,
            security_penalty: 0.0,
            exposure_score: 0.0,
            infrastructure_penalty: 0.0,
            total_cooldown_minutes: 0.0,
            final_fatigue_minutes: 0.0,
            fatigue_risk: None,
            search_cost: 0.0,
            explored: 0,
        }
    }

    fn found(mode: RouteMode, metrics: RouteMetrics) -> CandidateRoute {
        CandidateRoute {
            mode,
            outcome: RouteOutcome::Found(Route {
                nodes: Vec::new(),
                legs: Vec::new(),
                metrics,
                fatigue: None,
            }),
            avoidance: AvoidanceReport::untouched(AvoidanceStrictness::Strict),
            amenity_detour_applied: false,
            explanation: Vec::new(),
        }
    }

    fn infeasible(mode: RouteMode) -> CandidateRoute {
        CandidateRoute::infeasible(mode, AvoidanceStrictness::Strict, "none".to_string())
    }

    #[test]
    fn nothing_feasible() {
        let gate = infeasible(RouteMode::Gate);
        let jump = infeasible(RouteMode::Jump);
        let selection = select_best(&[&gate, &jump], PreferenceProfile::Balanced, TravelMode::Auto);
        assert_eq!(selection.mode, None);
        assert_eq!(selection.reason, SelectionReason::NoFeasibleRoute);
    }

    #[test]
    fn single_feasible_candidate_wins() {
        let gate = found(RouteMode::Gate, metrics(4, 0, 0.0, 0.0));
        let jump = infeasible(RouteMode::Jump);
        let selection = select_best(&[&gate, &jump], PreferenceProfile::Balanced, TravelMode::Auto);
        assert_eq!(selection.mode, Some(RouteMode::Gate));
        assert_eq!(selection.reason, SelectionReason::OnlyFeasibleCandidate);
    }

    #[test]
    fn requested_mode_overrides_cost() {
        let gate = found(RouteMode::Gate, metrics(20, 0, 0.0, 0.0));
        let jump = found(RouteMode::Jump, metrics(0, 1, 5.0, 0.0));
        let selection = select_best(&[&gate, &jump], PreferenceProfile::Balanced, TravelMode::Gate);
        assert_eq!(selection.mode, Some(RouteMode::Gate));
        assert_eq!(selection.reason, SelectionReason::RequestedMode);
    }

    #[test]
    fn cheapest_total_wins() {
        let gate = found(RouteMode::Gate, metrics(10, 0, 0.0, 0.0));
        let jump = found(RouteMode::Jump, metrics(0, 2, 10.0, 0.0));
        let selection = select_best(&[&gate, &jump], PreferenceProfile::Balanced, TravelMode::Auto);
        // gate: 15.0, jump: 2 * 2.0 + 10 * 0.5 = 9.0
        assert_eq!(selection.mode, Some(RouteMode::Jump));
        assert_eq!(selection.reason, SelectionReason::NormalizedTotalCost);
    }

    #[test]
    fn extra_gates_for_negligible_saving_are_penalized() {
        // gate: 6 * 1.5 = 9.0; jump: 1 * 2.0 + 15 * 0.5 = 9.5.
        let gate = found(RouteMode::Gate, metrics(6, 0, 0.0, 0.0));
        let jump = found(RouteMode::Jump, metrics(0, 1, 15.0, 0.0));
        let selection = select_best(&[&gate, &jump], PreferenceProfile::Balanced, TravelMode::Auto);
        assert_eq!(selection.mode, Some(RouteMode::Jump));
        assert_eq!(
            selection.reason,
            SelectionReason::NormalizedTotalCostWithExtraGatePenalty
        );
        let gate_cost = selection.cost(RouteMode::Gate).expect("gate cost");
        assert!((gate_cost.extra_gate_penalty - 4.5).abs() < 1e-9);
    }

    #[test]
    fn ties_prefer_fewer_gate_hops() {
        // Both cost 3.0 minutes.
        let gate = found(RouteMode::Gate, metrics(2, 0, 0.0, 0.0));
        let hybrid = found(RouteMode::Hybrid, metrics(0, 1, 2.0, 0.0));
        let selection = select_best(&[&gate, &hybrid], PreferenceProfile::Balanced, TravelMode::Auto);
        assert_eq!(selection.mode, Some(RouteMode::Hybrid));
        assert_eq!(selection.reason, SelectionReason::TieBreak);
    }

    #[test]
    fn jump_close_to_hybrid_dominates() {
        // hybrid: 1.5 + 2.0 + 5.0 = 8.5; jump: 2.0 + 6.5 + 0.6 = 9.1
        let hybrid = found(RouteMode::Hybrid, metrics(1, 1, 10.0, 0.0));
        let jump = found(RouteMode::Jump, metrics(0, 1, 13.0, 1.0));
        let gate = found(RouteMode::Gate, metrics(30, 0, 0.0, 0.0));
        let selection = select_best(
            &[&gate, &jump, &hybrid],
            PreferenceProfile::Balanced,
            TravelMode::Auto,
        );
        assert_eq!(selection.mode, Some(RouteMode::Jump));
        assert!(selection.dominance_rule_applied);
        assert_eq!(
            selection.reason,
            SelectionReason::JumpDominatesHybridTimeThreshold
        );
    }

    #[test]
    fn cooldown_counts_toward_normalized_minutes() {
        let weights = PreferenceProfile::Balanced.weights();
        let rested = metrics(0, 2, 12.0, 0.0);
        let tired = RouteMetrics {
            total_cooldown_minutes: 60.0,
            ..rested.clone()
        };
        let rested_minutes = normalized_minutes(&rested, weights);
        let tired_minutes = normalized_minutes(&tired, weights);
        assert!((tired_minutes - rested_minutes - 60.0 * weights.jump_cost).abs() < 1e-9);
    }

    #[test]
    fn cooldown_keeps_a_long_jump_chain_behind_gates() {
        // gate: 4 * 1.5 = 6.0; jump: 2.0 + 2.5 + 14.0 cooldown = 18.5
        let gate = found(RouteMode::Gate, metrics(4, 0, 0.0, 0.0));
        let jump = found(
            RouteMode::Jump,
            RouteMetrics {
                total_cooldown_minutes: 14.0,
                ..metrics(0, 1, 5.0, 0.0)
            },
        );
        let selection = select_best(&[&gate, &jump], PreferenceProfile::Balanced, TravelMode::Auto);
        assert_eq!(selection.mode, Some(RouteMode::Gate));
    }

    #[test]
    fn jump_far_behind_hybrid_does_not_dominate() {
        let hybrid = found(RouteMode::Hybrid, metrics(1, 1, 5.0, 0.0));
        let jump = found(RouteMode::Jump, metrics(0, 4, 30.0, 0.0));
        let selection = select_best(&[&jump, &hybrid], PreferenceProfile::Balanced, TravelMode::Auto);
        assert_eq!(selection.mode, Some(RouteMode::Hybrid));
        assert!(!selection.dominance_rule_applied);
    }

    #[test]
    fn safety_profile_weighs_risk() {
        let risky = found(RouteMode::Gate, metrics(3, 0, 0.0, 20.0));
        let calm = found(RouteMode::Jump, metrics(0, 3, 30.0, 0.0));
        let speed = select_best(&[&risky, &calm], PreferenceProfile::Speed, TravelMode::Auto);
        let safety = select_best(&[&risky, &calm], PreferenceProfile::Safety, TravelMode::Auto);
        assert_eq!(speed.mode, Some(RouteMode::Gate));
        assert_eq!(safety.mode, Some(RouteMode::Jump));
    }
}
