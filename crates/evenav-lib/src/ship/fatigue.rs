//! Jump fatigue and activation cooldown.
//!
//! Every jump adds fatigue that scales with the distance travelled and with
//! the fatigue already carried. Before the next jump the pilot must sit out an
//! activation cooldown, which also bleeds fatigue off. Distances are first
//! scaled by the profile multiplier (the "effective" light-years).
//!
//! Per-distance base values are memoized once per process for every tenth of
//! a light-year between 0.1 and 10.0; in-range distances are rounded up to the
//! next tenth before lookup, and the whole hop uses the rounded distance.
//!
//! The cooldown is subtracted before fatigue is capped, so for a fixed prior
//! a longer hop never leaves less fatigue than a shorter one.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::constants::{
    COVERT_BRIDGE_FATIGUE_MULTIPLIER, FATIGUE_HIGH_MINUTES, FATIGUE_MEDIUM_MINUTES,
    FATIGUE_TABLE_MAX_LY, FATIGUE_TABLE_MIN_LY, INDUSTRIAL_FATIGUE_MULTIPLIER,
    MAX_COOLDOWN_MINUTES, MAX_FATIGUE_MINUTES, STANDARD_FATIGUE_MULTIPLIER,
};
use super::range::{JumpShipType, ShipClass};

const TABLE_STEPS: usize = 100;

/// Fatigue scaling applied to jump distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueProfile {
    Standard,
    CovertBridge,
    Industrial,
}

impl FatigueProfile {
    const ALL: [FatigueProfile; 3] = [
        FatigueProfile::Standard,
        FatigueProfile::CovertBridge,
        FatigueProfile::Industrial,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            FatigueProfile::Standard => STANDARD_FATIGUE_MULTIPLIER,
            FatigueProfile::CovertBridge => COVERT_BRIDGE_FATIGUE_MULTIPLIER,
            FatigueProfile::Industrial => INDUSTRIAL_FATIGUE_MULTIPLIER,
        }
    }

    /// The applicable profile with the smallest multiplier.
    pub fn for_ship(ship: Option<JumpShipType>, class: ShipClass, covert_bridge: bool) -> Self {
        let industrial = ship.is_some_and(JumpShipType::is_industrial) || class.is_industrial();
        let mut best = FatigueProfile::Standard;
        if covert_bridge {
            best = FatigueProfile::CovertBridge;
        }
        if industrial && FatigueProfile::Industrial.multiplier() < best.multiplier() {
            best = FatigueProfile::Industrial;
        }
        best
    }

    fn index(self) -> usize {
        match self {
            FatigueProfile::Standard => 0,
            FatigueProfile::CovertBridge => 1,
            FatigueProfile::Industrial => 2,
        }
    }
}

/// Qualitative fatigue level at the end of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueRisk {
    Low,
    Medium,
    High,
}

impl FatigueRisk {
    pub fn from_fatigue(minutes: f64) -> Self {
        if minutes >= FATIGUE_HIGH_MINUTES {
            FatigueRisk::High
        } else if minutes >= FATIGUE_MEDIUM_MINUTES {
            FatigueRisk::Medium
        } else {
            FatigueRisk::Low
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BaseValues {
    effective_ly: f64,
    activation: f64,
    fatigue: f64,
}

impl BaseValues {
    fn for_effective_ly(effective_ly: f64) -> Self {
        Self {
            effective_ly,
            activation: (1.0 + effective_ly).clamp(0.0, MAX_COOLDOWN_MINUTES),
            fatigue: (10.0 * (1.0 + effective_ly)).clamp(0.0, MAX_FATIGUE_MINUTES),
        }
    }
}

static BASE_TABLE: Lazy<Vec<[BaseValues; TABLE_STEPS]>> = Lazy::new(|| {
    FatigueProfile::ALL
        .iter()
        .map(|profile| {
            std::array::from_fn(|step| {
                let nominal = (step + 1) as f64 / 10.0;
                BaseValues::for_effective_ly(nominal * profile.multiplier())
            })
        })
        .collect()
});

fn base_values(profile: FatigueProfile, distance_ly: f64) -> BaseValues {
    if (FATIGUE_TABLE_MIN_LY..=FATIGUE_TABLE_MAX_LY).contains(&distance_ly) {
        let step = ((distance_ly * 10.0) - 1e-9).ceil() as usize;
        let step = step.clamp(1, TABLE_STEPS);
        BASE_TABLE[profile.index()][step - 1]
    } else {
        BaseValues::for_effective_ly(distance_ly.max(0.0) * profile.multiplier())
    }
}

/// Fatigue bookkeeping for a single hop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HopFatigue {
    pub distance_ly: f64,
    /// Activation cooldown incurred by this jump, in minutes.
    pub cooldown_minutes: f64,
    /// Fatigue carried after the cooldown has elapsed, in minutes.
    pub fatigue_minutes: f64,
}

/// Running fatigue of a pilot across consecutive jumps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueState {
    profile: FatigueProfile,
    fatigue_minutes: f64,
}

impl FatigueState {
    pub fn new(profile: FatigueProfile) -> Self {
        Self {
            profile,
            fatigue_minutes: 0.0,
        }
    }

    pub fn fatigue_minutes(&self) -> f64 {
        self.fatigue_minutes
    }

    /// Apply one jump of `distance_ly` and return its bookkeeping.
    pub fn jump(&mut self, distance_ly: f64) -> HopFatigue {
        let prior = self.fatigue_minutes;
        let base = base_values(self.profile, distance_ly);

        let cooldown = base
            .activation
            .max(prior / 10.0)
            .clamp(0.0, MAX_COOLDOWN_MINUTES);
        let fatigue = (base.fatigue.max(prior * (1.0 + base.effective_ly)) - cooldown)
            .clamp(0.0, MAX_FATIGUE_MINUTES);

        self.fatigue_minutes = fatigue;
        HopFatigue {
            distance_ly,
            cooldown_minutes: cooldown,
            fatigue_minutes: fatigue,
        }
    }
}

/// Aggregate fatigue over a whole route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueSummary {
    pub profile: FatigueProfile,
    pub hops: Vec<HopFatigue>,
    pub total_cooldown_minutes: f64,
    pub final_fatigue_minutes: f64,
    pub risk: FatigueRisk,
}

/// Project fatigue for a sequence of jump distances.
pub fn project_fatigue(distances_ly: &[f64], profile: FatigueProfile) -> FatigueSummary {
    let mut state = FatigueState::new(profile);
    let hops: Vec<HopFatigue> = distances_ly.iter().map(|&d| state.jump(d)).collect();
    let total_cooldown_minutes = hops.iter().map(|hop| hop.cooldown_minutes).sum();
    let final_fatigue_minutes = state.fatigue_minutes();
    FatigueSummary {
        profile,
        hops,
        total_cooldown_minutes,
        final_fatigue_minutes,
        risk: FatigueRisk::from_fatigue(final_fatigue_minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_jump_uses_base_values() {
        let mut state = FatigueState::new(FatigueProfile::Standard);
        let hop = state.jump(5.0);
        assert!((hop.cooldown_minutes - 6.0).abs() < 1e-9);
        assert!((hop.fatigue_minutes - 54.0).abs() < 1e-9);
    }

    #[test]
    fn table_matches_formula_on_tenths() {
        for step in 1..=100 {
            let ly = step as f64 / 10.0;
            let table = base_values(FatigueProfile::Standard, ly);
            let formula = BaseValues::for_effective_ly(ly);
            assert!((table.fatigue - formula.fatigue).abs() < 1e-9, "{ly}");
        }
    }

    #[test]
    fn smallest_multiplier_wins() {
        assert_eq!(
            FatigueProfile::for_ship(Some(JumpShipType::Carrier), ShipClass::Capital, false),
            FatigueProfile::Standard
        );
        assert_eq!(
            FatigueProfile::for_ship(Some(JumpShipType::BlackOps), ShipClass::Battleship, true),
            FatigueProfile::CovertBridge
        );
        assert_eq!(
            FatigueProfile::for_ship(Some(JumpShipType::JumpFreighter), ShipClass::Freighter, true),
            FatigueProfile::Industrial
        );
    }

    #[test]
    fn risk_thresholds() {
        assert_eq!(FatigueRisk::from_fatigue(10.0), FatigueRisk::Low);
        assert_eq!(FatigueRisk::from_fatigue(60.0), FatigueRisk::Medium);
        assert_eq!(FatigueRisk::from_fatigue(180.0), FatigueRisk::High);
    }

    #[test]
    fn saturated_fatigue_does_not_favour_longer_hops() {
        let mut lead = FatigueState::new(FatigueProfile::Standard);
        lead.jump(9.0);
        assert!((lead.fatigue_minutes() - 90.0).abs() < 1e-9);

        let mut near = lead;
        let mut far = lead;
        let near_hop = near.jump(3.0);
        let far_hop = far.jump(10.0);
        assert!((near_hop.cooldown_minutes - 9.0).abs() < 1e-9);
        assert!((far_hop.cooldown_minutes - 11.0).abs() < 1e-9);
        assert_eq!(near_hop.fatigue_minutes, MAX_FATIGUE_MINUTES);
        assert_eq!(far_hop.fatigue_minutes, MAX_FATIGUE_MINUTES);
    }

    #[test]
    fn rounding_applies_to_the_whole_hop() {
        let mut lead = FatigueState::new(FatigueProfile::Standard);
        lead.jump(0.9);
        // prior 19 - 1.9 = 17.1; 5.01 ly rounds to 5.1
        let mut near = lead;
        let mut far = lead;
        let near_hop = near.jump(5.0);
        let far_hop = far.jump(5.01);
        assert!(far_hop.fatigue_minutes >= near_hop.fatigue_minutes);
        assert!((far_hop.fatigue_minutes - (17.1f64 * 6.1).max(61.0) + 6.1).abs() < 1e-6);
    }

    #[test]
    fn long_chains_saturate() {
        let summary = project_fatigue(&[10.0; 12], FatigueProfile::Standard);
        assert_eq!(summary.hops.len(), 12);
        assert!(summary.final_fatigue_minutes <= MAX_FATIGUE_MINUTES);
        assert_eq!(summary.risk, FatigueRisk::High);
    }

    proptest! {
        #[test]
        fn values_stay_in_bounds(distances in proptest::collection::vec(0.0f64..15.0, 1..20)) {
            let summary = project_fatigue(&distances, FatigueProfile::Standard);
            for hop in &summary.hops {
                prop_assert!((0.0..=MAX_COOLDOWN_MINUTES).contains(&hop.cooldown_minutes));
                prop_assert!((0.0..=MAX_FATIGUE_MINUTES).contains(&hop.fatigue_minutes));
            }
        }

        #[test]
        fn longer_jumps_never_cost_less(short in 0.0f64..12.0, extra in 0.0f64..3.0, prior_hops in 0usize..4) {
            let lead = vec![4.0; prior_hops];
            let mut near = lead.clone();
            near.push(short);
            let mut far = lead;
            far.push(short + extra);

            let near = project_fatigue(&near, FatigueProfile::Standard);
            let far = project_fatigue(&far, FatigueProfile::Standard);
            let near_hop = near.hops.last().copied().expect("hop");
            let far_hop = far.hops.last().copied().expect("hop");
            prop_assert!(far_hop.cooldown_minutes >= near_hop.cooldown_minutes);
            prop_assert!(far.total_cooldown_minutes >= near.total_cooldown_minutes);
        }

        #[test]
        fn longer_jumps_never_leave_less_fatigue(
            prior_ly in proptest::collection::vec(0.0f64..12.0, 0..5),
            short in 0.0f64..12.0,
            extra in 0.0f64..3.0,
            profile in prop_oneof![
                Just(FatigueProfile::Standard),
                Just(FatigueProfile::CovertBridge),
                Just(FatigueProfile::Industrial),
            ],
        ) {
            let mut lead = FatigueState::new(profile);
            for &distance in &prior_ly {
                lead.jump(distance);
            }
            let mut near = lead;
            let mut far = lead;
            let near_hop = near.jump(short);
            let far_hop = far.jump(short + extra);
            prop_assert!(
                far_hop.fatigue_minutes + 1e-9 >= near_hop.fatigue_minutes,
                "prior {} near {} far {}",
                lead.fatigue_minutes(),
                near_hop.fatigue_minutes,
                far_hop.fatigue_minutes
            );
        }
    }
}
