mod common;

use std::collections::HashMap;

use common::{
    carrier_line, full_neighbor_store, gate_chain, gates, plan, plan_with, snapshot, system,
    with_station,
};
use evenav_lib::config::EngineConfig;
use evenav_lib::cost::RiskAggregate;
use evenav_lib::routing::{
    AvoidanceStrictness, CorridorSide, LegKind, RouteMode, RouteOutcome, RouteRequest,
    SelectionReason, TravelMode,
};
use evenav_lib::{MemoryNeighborStore, SystemRef};

fn carrier_request(origin: &str, destination: &str) -> RouteRequest {
    RouteRequest::new(origin, destination).with_jump_ship("carrier", 5)
}

#[test]
fn carrier_crosses_twelve_light_years_in_two_jumps() {
    let snapshot = carrier_line();
    let store = full_neighbor_store(&snapshot);
    let bundle = plan(&snapshot, &store, &carrier_request("A", "C"));

    let route = bundle.jump.outcome.found().expect("jump route");
    assert_eq!(route.system_ids(), vec![1, 2, 3]);
    assert_eq!(route.metrics.jump_hops, 2);
    assert_eq!(route.metrics.gate_hops, 0);
    assert!((route.metrics.total_ly - 12.0).abs() < 1e-3);
    assert!(route.legs.iter().all(|leg| leg.kind == LegKind::Jump));

    let fatigue = route.fatigue.as_ref().expect("fatigue projection");
    assert_eq!(fatigue.hops.len(), 2);
    assert!(fatigue.final_fatigue_minutes > 0.0);
    assert_eq!(route.metrics.final_fatigue_minutes, fatigue.final_fatigue_minutes);

    assert!(matches!(bundle.gate.outcome, RouteOutcome::Infeasible { .. }));
    assert_eq!(bundle.best.mode, Some(RouteMode::Jump));
}

#[test]
fn identical_jump_and_hybrid_routes_prefer_jump() {
    let snapshot = carrier_line();
    let store = full_neighbor_store(&snapshot);
    let bundle = plan(&snapshot, &store, &carrier_request("A", "C"));

    assert!(bundle.hybrid.outcome.is_found());
    assert_eq!(bundle.best.mode, Some(RouteMode::Jump));
    assert!(bundle.best.dominance_rule_applied);
    assert_eq!(
        bundle.best.reason,
        SelectionReason::JumpDominatesHybridTimeThreshold
    );
    assert!(bundle.best_route().is_some());
}

#[test]
fn missing_neighbor_table_makes_jump_infeasible() {
    let snapshot = carrier_line();
    let store = MemoryNeighborStore::new();
    let bundle = plan(&snapshot, &store, &carrier_request("A", "C"));

    let reason = bundle.jump.outcome.reason().expect("infeasible reason");
    assert!(
        reason.contains("missing precomputed jump neighbors for range bucket 7"),
        "unexpected reason: {reason}"
    );
    assert!(bundle
        .hybrid
        .explanation
        .iter()
        .any(|line| line.contains("hybrid limited to gate edges")));
    assert_eq!(bundle.best.mode, None);
    assert_eq!(bundle.best.reason, SelectionReason::NoFeasibleRoute);
}

#[test]
fn online_fallback_builds_missing_table() {
    let snapshot = carrier_line();
    let store = MemoryNeighborStore::new();
    let config = EngineConfig {
        online_neighbor_fallback: true,
        ..EngineConfig::default()
    };
    let bundle = plan_with(
        &snapshot,
        &store,
        &HashMap::new(),
        &config,
        &carrier_request("A", "C"),
    );

    assert!(bundle.jump.outcome.is_found());
    assert!(bundle
        .jump
        .explanation
        .iter()
        .any(|line| line.contains("built online")));
}

#[test]
fn unknown_ship_name_is_infeasible_not_an_error() {
    let snapshot = carrier_line();
    let store = full_neighbor_store(&snapshot);
    let request = RouteRequest::new("A", "C").with_jump_ship("rowboat", 5);
    let bundle = plan(&snapshot, &store, &request);

    let reason = bundle.jump.outcome.reason().expect("reason");
    assert!(reason.contains("unknown jump ship type 'rowboat'"));
}

#[test]
fn unknown_endpoint_reports_suggestions() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let bundle = plan(&snapshot, &store, &RouteRequest::new("Alpah", "Golf"));

    assert_eq!(bundle.origin, None);
    assert_eq!(bundle.best.mode, None);
    let reason = bundle.gate.outcome.reason().expect("reason");
    assert!(reason.contains("unknown system name: Alpah"));
    assert!(reason.contains("Alpha"));
}

#[test]
fn gate_route_follows_the_chain() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let bundle = plan(&snapshot, &store, &RouteRequest::new("Alpha", "Golf"));

    let route = bundle.gate.outcome.found().expect("gate route");
    assert_eq!(route.system_ids(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(route.metrics.gate_hops, 6);
    assert_eq!(route.nodes[0].name, "Alpha");
    assert!(route.fatigue.is_none());

    assert_eq!(
        bundle.jump.outcome.reason(),
        Some("no jump-capable ship specified")
    );
    assert_eq!(bundle.best.mode, Some(RouteMode::Gate));
}

#[test]
fn system_ids_resolve_like_names() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let request = RouteRequest::new(SystemRef::Id(1), SystemRef::Id(3));
    let bundle = plan(&snapshot, &store, &request);
    assert_eq!(bundle.origin, Some(1));
    assert_eq!(bundle.destination, Some(3));
    assert!(bundle.gate.outcome.is_found());
}

#[test]
fn same_origin_and_destination_is_a_zero_hop_route() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let bundle = plan(&snapshot, &store, &RouteRequest::new("Delta", "Delta"));
    let route = bundle.gate.outcome.found().expect("trivial route");
    assert_eq!(route.system_ids(), vec![4]);
    assert_eq!(route.hop_count(), 0);
}

#[test]
fn requested_mode_is_honoured_when_feasible() {
    let snapshot = carrier_line();
    let store = full_neighbor_store(&snapshot);
    let request = carrier_request("A", "C").with_mode(TravelMode::Hybrid);
    let bundle = plan(&snapshot, &store, &request);
    assert_eq!(bundle.best.mode, Some(RouteMode::Hybrid));
    assert_eq!(bundle.best.reason, SelectionReason::RequestedMode);
}

#[test]
fn risk_heatmap_steers_gate_routes() {
    // 1 - 2 - 4 and 1 - 3 - 4, equally long.
    let snapshot = snapshot(
        vec![
            system(1, "Start", [0.0, 0.0, 0.0], 0.9),
            system(2, "Camp", [1.0, 1.0, 0.0], 0.9),
            system(3, "Quiet", [1.0, -1.0, 0.0], 0.9),
            system(4, "End", [2.0, 0.0, 0.0], 0.9),
        ],
        gates(&[(1, 2), (2, 4), (1, 3), (3, 4)]),
    );
    let store = MemoryNeighborStore::new();
    let risk = HashMap::from([(
        2,
        RiskAggregate {
            ship_kills: 12,
            pod_kills: 4,
            npc_kills: 0,
        },
    )]);
    let bundle = plan_with(
        &snapshot,
        &store,
        &risk,
        &EngineConfig::default(),
        &RouteRequest::new("Start", "End"),
    );

    let route = bundle.gate.outcome.found().expect("gate route");
    assert_eq!(route.system_ids(), vec![1, 3, 4]);
    assert_eq!(route.metrics.risk_score, 0.0);
}

#[test]
fn avoid_lowsec_takes_the_longer_high_sec_path() {
    let snapshot = snapshot(
        vec![
            system(1, "Start", [0.0, 0.0, 0.0], 0.9),
            system(2, "Shortcut", [1.0, 0.0, 0.0], 0.2),
            system(3, "Detour1", [0.0, 1.0, 0.0], 0.9),
            system(4, "End", [2.0, 0.0, 0.0], 0.9),
            system(5, "Detour2", [1.0, 1.0, 0.0], 0.9),
        ],
        gates(&[(1, 2), (2, 4), (1, 3), (3, 5), (5, 4)]),
    );
    let store = MemoryNeighborStore::new();
    let mut request = RouteRequest::new("Start", "End");
    request.avoid_lowsec = true;
    let bundle = plan(&snapshot, &store, &request);

    let route = bundle.gate.outcome.found().expect("gate route");
    assert_eq!(route.system_ids(), vec![1, 3, 5, 4]);
    assert!(!bundle.gate.avoidance.fallback_used);
    assert_eq!(bundle.gate.avoidance.applied, AvoidanceStrictness::Strict);
    assert_eq!(bundle.gate.avoidance.avoided_systems, 1);
}

#[test]
fn strict_avoidance_falls_back_to_soft_for_mid_route_blocks() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let mut request = RouteRequest::new("Alpha", "Golf");
    request.avoid_systems = vec![SystemRef::from("Delta")];
    let bundle = plan(&snapshot, &store, &request);

    let route = bundle.gate.outcome.found().expect("soft fallback route");
    assert!(route.system_ids().contains(&4));
    let report = &bundle.gate.avoidance;
    assert_eq!(report.requested, AvoidanceStrictness::Strict);
    assert_eq!(report.applied, AvoidanceStrictness::Soft);
    assert!(report.fallback_used);
    assert_eq!(report.corridor_side, None);
    assert!(bundle
        .gate
        .explanation
        .iter()
        .any(|line| line.contains("fell back to soft avoidance")));
}

#[test]
fn exit_corridor_admits_avoided_destination_approach() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let mut request = RouteRequest::new("Alpha", "Golf");
    request.avoid_systems = vec![SystemRef::from("Foxtrot"), SystemRef::from("Golf")];
    let bundle = plan(&snapshot, &store, &request);

    assert!(bundle.gate.outcome.is_found());
    let report = &bundle.gate.avoidance;
    assert_eq!(report.corridor_side, Some(CorridorSide::Exit));
    assert_eq!(report.exception_corridor, vec![7, 6]);
    assert!(report.fallback_used);
}

#[test]
fn entry_corridor_admits_avoided_origin_neighbourhood() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let mut request = RouteRequest::new("Alpha", "Golf");
    request.avoid_systems = vec![SystemRef::from("Bravo")];
    let bundle = plan(&snapshot, &store, &request);

    let report = &bundle.gate.avoidance;
    assert_eq!(report.corridor_side, Some(CorridorSide::Entry));
    assert_eq!(report.exception_corridor, vec![2]);
}

#[test]
fn corridor_longer_than_the_cap_is_not_admitted() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let mut config = EngineConfig::default();
    config.avoidance.max_exception_corridor_hops = 1;
    let mut request = RouteRequest::new("Alpha", "Golf");
    request.avoid_systems = vec![SystemRef::from("Bravo"), SystemRef::from("Charlie")];
    let bundle = plan_with(&snapshot, &store, &HashMap::new(), &config, &request);

    let report = &bundle.gate.avoidance;
    assert_eq!(report.corridor_side, None);
    assert!(report.fallback_used);
    assert!(bundle.gate.outcome.is_found());
}

#[test]
fn soft_avoidance_penalizes_without_fallback() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let mut request = RouteRequest::new("Alpha", "Golf");
    request.avoid_systems = vec![SystemRef::from("Delta")];
    request.strictness = AvoidanceStrictness::Soft;
    let bundle = plan(&snapshot, &store, &request);

    let report = &bundle.gate.avoidance;
    assert_eq!(report.applied, AvoidanceStrictness::Soft);
    assert!(!report.fallback_used);
    let route = bundle.gate.outcome.found().expect("route");
    assert!(route.metrics.search_cost > 25.0);
}

#[test]
fn capital_hulls_cannot_reach_high_sec_destinations() {
    let snapshot = snapshot(
        vec![
            system(1, "A", [0.0, 0.0, 0.0], 0.3),
            system(2, "B", [6.0, 0.0, 0.0], 0.3),
            system(3, "Haven", [12.0, 0.0, 0.0], 0.9),
        ],
        Vec::new(),
    );
    let store = full_neighbor_store(&snapshot);
    let bundle = plan(&snapshot, &store, &carrier_request("A", "Haven"));

    for mode in RouteMode::ALL {
        let reason = bundle.candidate(mode).outcome.reason().expect("reason");
        assert!(reason.contains("cannot enter"), "{mode}: {reason}");
    }
    assert_eq!(bundle.best.mode, None);
}

#[test]
fn exhausted_budget_yields_partial_route() {
    let snapshot = gate_chain();
    let store = MemoryNeighborStore::new();
    let mut config = EngineConfig::default();
    config.search.dijkstra_max_nodes = 2;
    let bundle = plan_with(
        &snapshot,
        &store,
        &HashMap::new(),
        &config,
        &RouteRequest::new("Alpha", "Golf"),
    );

    match &bundle.gate.outcome {
        RouteOutcome::Partial { route, reason } => {
            assert_eq!(route.system_ids(), vec![1, 2]);
            assert!(reason.contains("budget exhausted"), "{reason}");
        }
        other => panic!("expected partial outcome, got {other:?}"),
    }
    assert_eq!(bundle.best.mode, None);
}

fn station_fork() -> evenav_lib::GraphSnapshot {
    snapshot(
        vec![
            system(1, "A", [0.0, 0.0, 0.0], 0.3),
            system(2, "Bare", [6.0, 0.0, 0.0], 0.3),
            with_station(system(3, "Dock", [6.0, 1.0, 0.0], 0.3)),
            system(4, "C", [12.0, 0.0, 0.0], 0.3),
        ],
        Vec::new(),
    )
}

#[test]
fn amenity_detour_applies_for_safety_leaning_requests() {
    let snapshot = station_fork();
    let store = full_neighbor_store(&snapshot);
    let mut request = carrier_request("A", "C").with_safety_vs_speed(80.0);
    request.prefer_stations = true;
    let bundle = plan(&snapshot, &store, &request);

    assert!(bundle.jump.amenity_detour_applied);
    let route = bundle.jump.outcome.found().expect("route");
    assert_eq!(route.system_ids(), vec![1, 3, 4]);
    assert!(route.nodes[1].has_station);
}

#[test]
fn amenity_detour_is_denied_for_balanced_requests() {
    let snapshot = station_fork();
    let store = full_neighbor_store(&snapshot);
    let mut request = carrier_request("A", "C");
    request.prefer_stations = true;
    let bundle = plan(&snapshot, &store, &request);

    assert!(!bundle.jump.amenity_detour_applied);
    assert!(bundle
        .jump
        .explanation
        .iter()
        .any(|line| line.contains("amenity detour denied")));
}

#[test]
fn out_of_range_inputs_are_clamped_and_explained() {
    let snapshot = carrier_line();
    let store = full_neighbor_store(&snapshot);
    let request = RouteRequest::new("A", "C")
        .with_jump_ship("carrier", 9)
        .with_safety_vs_speed(250.0);
    let bundle = plan(&snapshot, &store, &request);

    assert!(bundle
        .explanation
        .iter()
        .any(|line| line.contains("skill level 9 clamped to 5")));
    assert!(bundle
        .explanation
        .iter()
        .any(|line| line.contains("safety_vs_speed 250 clamped to 100")));
    assert_eq!(
        bundle.profile,
        evenav_lib::routing::PreferenceProfile::Safety
    );
}

#[test]
fn bundle_serializes_with_status_tags() {
    let snapshot = carrier_line();
    let store = full_neighbor_store(&snapshot);
    let bundle = plan(&snapshot, &store, &carrier_request("A", "C"));
    let json = serde_json::to_value(&bundle).expect("serialize");
    assert_eq!(json["jump"]["outcome"]["status"], "found");
    assert_eq!(json["gate"]["outcome"]["status"], "infeasible");
    assert_eq!(json["best"]["mode"], "jump");
}
