//! Per-system cost model.
//!
//! Entering a system costs one unit of travel plus a risk term built from
//! recent activity, boundary chokepoints, and the security band. Exposure and
//! infrastructure are reported alongside for selection and explanations.

use serde::{Deserialize, Serialize};

use crate::db::{SecurityBand, System};
use crate::ship::ShipClass;

/// Travel cost of entering any system.
pub const TRAVEL_COST: f64 = 1.0;
/// Added risk for systems sitting on a boundary-crossing gate.
pub const CHOKEPOINT_RISK: f64 = 10.0;
/// Added risk for null-sec systems.
pub const NULL_SEC_RISK: f64 = 15.0;
/// Added risk for low-sec systems.
pub const LOW_SEC_RISK: f64 = 7.0;
/// Added cost for stops without a station when stations are preferred.
pub const MISSING_STATION_PENALTY: f64 = 5.0;

/// Recent activity counts for a system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAggregate {
    pub ship_kills: u32,
    pub pod_kills: u32,
    pub npc_kills: u32,
}

/// Weights turning activity counts into a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub ship_kill: f64,
    pub pod_kill: f64,
    pub npc_kill: f64,
    /// Multiplier applied to the weighted sum.
    pub scale: f64,
    /// Ceiling of the activity part of the risk score.
    pub cap: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            ship_kill: 1.0,
            pod_kill: 0.5,
            npc_kill: 0.01,
            scale: 1.0,
            cap: 50.0,
        }
    }
}

impl RiskWeights {
    /// Capped activity risk for one aggregate.
    pub fn activity_risk(&self, aggregate: &RiskAggregate) -> f64 {
        let weighted = self.ship_kill * f64::from(aggregate.ship_kills)
            + self.pod_kill * f64::from(aggregate.pod_kills)
            + self.npc_kill * f64::from(aggregate.npc_kills);
        (self.scale * weighted).clamp(0.0, self.cap.max(0.0))
    }
}

/// Inputs shared by every cost evaluation of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostOptions {
    pub weights: RiskWeights,
    pub ship_class: ShipClass,
    pub prefer_stations: bool,
}

/// Cost breakdown for entering one system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostComponents {
    pub travel: f64,
    /// Activity, chokepoint, and security band risk combined.
    pub risk: f64,
    /// Security band share of `risk`.
    pub security_penalty: f64,
    pub exposure: f64,
    pub infrastructure: f64,
}

impl CostComponents {
    pub fn add(&mut self, other: &CostComponents) {
        self.travel += other.travel;
        self.risk += other.risk;
        self.security_penalty += other.security_penalty;
        self.exposure += other.exposure;
        self.infrastructure += other.infrastructure;
    }
}

/// Security band surcharge.
pub fn security_penalty(band: SecurityBand) -> f64 {
    match band {
        SecurityBand::High => 0.0,
        SecurityBand::Low => LOW_SEC_RISK,
        SecurityBand::Null => NULL_SEC_RISK,
    }
}

/// Cost of entering `system`.
pub fn node_cost(
    system: &System,
    risk: Option<&RiskAggregate>,
    is_chokepoint: bool,
    has_station: bool,
    options: &CostOptions,
) -> CostComponents {
    let activity = risk.map_or(0.0, |aggregate| options.weights.activity_risk(aggregate));
    let chokepoint = if is_chokepoint { CHOKEPOINT_RISK } else { 0.0 };
    let band = security_penalty(system.security_band());
    let infrastructure = if options.prefer_stations && !has_station {
        MISSING_STATION_PENALTY
    } else {
        0.0
    };

    CostComponents {
        travel: TRAVEL_COST,
        risk: activity + chokepoint + band,
        security_penalty: band,
        exposure: system.metadata.size.max(0.0) * options.ship_class.size_modifier(),
        infrastructure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SystemMetadata;
    use crate::geometry::SystemPosition;

    fn system(security: f64, size: f64) -> System {
        System {
            id: 1,
            name: "Test".to_string(),
            position: SystemPosition::default(),
            metadata: SystemMetadata {
                security_status: security,
                size,
                ..SystemMetadata::default()
            },
        }
    }

    #[test]
    fn quiet_high_sec_costs_only_travel() {
        let cost = node_cost(&system(0.9, 1.0), None, false, true, &CostOptions::default());
        assert_eq!(cost.travel, 1.0);
        assert_eq!(cost.risk, 0.0);
        assert_eq!(cost.infrastructure, 0.0);
    }

    #[test]
    fn band_and_chokepoint_surcharges_stack() {
        let options = CostOptions::default();
        let low = node_cost(&system(0.3, 1.0), None, false, true, &options);
        assert_eq!(low.risk, LOW_SEC_RISK);
        assert_eq!(low.security_penalty, LOW_SEC_RISK);

        let null_choke = node_cost(&system(-0.2, 1.0), None, true, true, &options);
        assert_eq!(null_choke.risk, NULL_SEC_RISK + CHOKEPOINT_RISK);
        assert_eq!(null_choke.security_penalty, NULL_SEC_RISK);
    }

    #[test]
    fn activity_risk_is_capped() {
        let options = CostOptions::default();
        let busy = RiskAggregate {
            ship_kills: 500,
            pod_kills: 100,
            npc_kills: 0,
        };
        let cost = node_cost(&system(1.0, 1.0), Some(&busy), false, true, &options);
        assert_eq!(cost.risk, options.weights.cap);

        let light = RiskAggregate {
            ship_kills: 2,
            pod_kills: 2,
            npc_kills: 100,
        };
        let cost = node_cost(&system(1.0, 1.0), Some(&light), false, true, &options);
        assert!((cost.risk - 4.0).abs() < 1e-9);
    }

    #[test]
    fn exposure_scales_with_hull_class() {
        let options = CostOptions {
            ship_class: ShipClass::Capital,
            ..CostOptions::default()
        };
        let cost = node_cost(&system(0.5, 2.0), None, false, true, &options);
        assert!((cost.exposure - 5.0).abs() < 1e-9);
    }

    #[test]
    fn missing_station_penalized_only_when_preferred() {
        let mut options = CostOptions::default();
        let sys = system(0.5, 1.0);
        assert_eq!(node_cost(&sys, None, false, false, &options).infrastructure, 0.0);
        options.prefer_stations = true;
        assert_eq!(
            node_cost(&sys, None, false, false, &options).infrastructure,
            MISSING_STATION_PENALTY
        );
        assert_eq!(node_cost(&sys, None, false, true, &options).infrastructure, 0.0);
    }
}
