//! Jump-capable hull types, hull size classes, and effective jump range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::db::SecurityBand;

use super::constants::MAX_SKILL_LEVEL;

/// Ship types fitted with a jump drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpShipType {
    Carrier,
    Dreadnought,
    ForceAuxiliary,
    Supercarrier,
    Titan,
    BlackOps,
    JumpFreighter,
    Rorqual,
}

/// Static jump drive characteristics of a hull type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JumpRangeSpec {
    /// Range at skill level 0, in light-years.
    pub base_ly: f64,
    /// Range added per skill level, in light-years.
    pub per_level_ly: f64,
    /// Hard ceiling, in light-years.
    pub max_ly: f64,
}

impl JumpShipType {
    pub const ALL: [JumpShipType; 8] = [
        JumpShipType::Carrier,
        JumpShipType::Dreadnought,
        JumpShipType::ForceAuxiliary,
        JumpShipType::Supercarrier,
        JumpShipType::Titan,
        JumpShipType::BlackOps,
        JumpShipType::JumpFreighter,
        JumpShipType::Rorqual,
    ];

    /// Parse a user-supplied ship name.
    ///
    /// Case, whitespace, `_` and `-` are ignored, and a few common short
    /// forms are accepted. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        let ship = match normalized.as_str() {
            "carrier" => JumpShipType::Carrier,
            "dreadnought" | "dreadnaught" | "dread" => JumpShipType::Dreadnought,
            "forceauxiliary" | "forceaux" | "fax" => JumpShipType::ForceAuxiliary,
            "supercarrier" | "super" => JumpShipType::Supercarrier,
            "titan" => JumpShipType::Titan,
            "blackops" | "blops" => JumpShipType::BlackOps,
            "jumpfreighter" | "jf" => JumpShipType::JumpFreighter,
            "rorqual" | "rorq" => JumpShipType::Rorqual,
            _ => return None,
        };
        Some(ship)
    }

    pub fn name(self) -> &'static str {
        match self {
            JumpShipType::Carrier => "carrier",
            JumpShipType::Dreadnought => "dreadnought",
            JumpShipType::ForceAuxiliary => "force_auxiliary",
            JumpShipType::Supercarrier => "supercarrier",
            JumpShipType::Titan => "titan",
            JumpShipType::BlackOps => "black_ops",
            JumpShipType::JumpFreighter => "jump_freighter",
            JumpShipType::Rorqual => "rorqual",
        }
    }

    pub fn range_spec(self) -> JumpRangeSpec {
        let (base_ly, per_level_ly, max_ly) = match self {
            JumpShipType::Carrier | JumpShipType::Dreadnought | JumpShipType::ForceAuxiliary => {
                (3.5, 0.7, 7.0)
            }
            JumpShipType::Supercarrier | JumpShipType::Titan => (3.0, 0.6, 6.0),
            JumpShipType::BlackOps => (4.0, 0.8, 8.0),
            JumpShipType::JumpFreighter | JumpShipType::Rorqual => (5.0, 1.0, 10.0),
        };
        JumpRangeSpec {
            base_ly,
            per_level_ly,
            max_ly,
        }
    }

    /// Hull size class the ship belongs to.
    pub fn hull_class(self) -> ShipClass {
        match self {
            JumpShipType::Supercarrier | JumpShipType::Titan => ShipClass::Supercapital,
            JumpShipType::BlackOps => ShipClass::Battleship,
            JumpShipType::JumpFreighter => ShipClass::Freighter,
            JumpShipType::Carrier
            | JumpShipType::Dreadnought
            | JumpShipType::ForceAuxiliary
            | JumpShipType::Rorqual => ShipClass::Capital,
        }
    }

    /// Hulls whose jump fatigue uses the industrial multiplier.
    pub fn is_industrial(self) -> bool {
        matches!(self, JumpShipType::JumpFreighter | JumpShipType::Rorqual)
    }
}

impl fmt::Display for JumpShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Effective jump range in light-years.
///
/// `min(max, base + clamp(skill, 0, 5) * per_level)`; never decreases as the
/// skill level rises.
pub fn effective_range(ship: JumpShipType, skill_level: i32) -> f64 {
    let spec = ship.range_spec();
    let level = skill_level.clamp(0, i32::from(MAX_SKILL_LEVEL));
    (spec.base_ly + f64::from(level) * spec.per_level_ly).min(spec.max_ly)
}

/// Hull size classes used for exposure and admissibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipClass {
    Frigate,
    Destroyer,
    #[default]
    Cruiser,
    Battlecruiser,
    Battleship,
    Industrial,
    Freighter,
    Capital,
    Supercapital,
}

impl ShipClass {
    pub const ALL: [ShipClass; 9] = [
        ShipClass::Frigate,
        ShipClass::Destroyer,
        ShipClass::Cruiser,
        ShipClass::Battlecruiser,
        ShipClass::Battleship,
        ShipClass::Industrial,
        ShipClass::Freighter,
        ShipClass::Capital,
        ShipClass::Supercapital,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|class| class.name() == normalized)
    }

    pub fn name(self) -> &'static str {
        match self {
            ShipClass::Frigate => "frigate",
            ShipClass::Destroyer => "destroyer",
            ShipClass::Cruiser => "cruiser",
            ShipClass::Battlecruiser => "battlecruiser",
            ShipClass::Battleship => "battleship",
            ShipClass::Industrial => "industrial",
            ShipClass::Freighter => "freighter",
            ShipClass::Capital => "capital",
            ShipClass::Supercapital => "supercapital",
        }
    }

    /// Multiplier applied to node size when scoring exposure.
    pub fn size_modifier(self) -> f64 {
        match self {
            ShipClass::Frigate => 0.5,
            ShipClass::Destroyer => 0.7,
            ShipClass::Cruiser => 1.0,
            ShipClass::Battlecruiser => 1.2,
            ShipClass::Battleship => 1.5,
            ShipClass::Industrial => 1.3,
            ShipClass::Freighter => 2.0,
            ShipClass::Capital => 2.5,
            ShipClass::Supercapital => 3.0,
        }
    }

    /// Whether a hull of this class may be present in a system of `band`.
    ///
    /// Capital and supercapital hulls are barred from high-security space.
    pub fn may_enter(self, band: SecurityBand) -> bool {
        !(band == SecurityBand::High
            && matches!(self, ShipClass::Capital | ShipClass::Supercapital))
    }

    pub fn is_industrial(self) -> bool {
        matches!(self, ShipClass::Industrial | ShipClass::Freighter)
    }
}

impl fmt::Display for ShipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases_and_separators() {
        assert_eq!(JumpShipType::parse("Jump Freighter"), Some(JumpShipType::JumpFreighter));
        assert_eq!(JumpShipType::parse("black-ops"), Some(JumpShipType::BlackOps));
        assert_eq!(JumpShipType::parse("FAX"), Some(JumpShipType::ForceAuxiliary));
        assert_eq!(JumpShipType::parse("force_auxiliary"), Some(JumpShipType::ForceAuxiliary));
        assert_eq!(JumpShipType::parse("shuttle"), None);
    }

    #[test]
    fn names_round_trip() {
        for ship in JumpShipType::ALL {
            assert_eq!(JumpShipType::parse(ship.name()), Some(ship));
        }
        for class in ShipClass::ALL {
            assert_eq!(ShipClass::parse(class.name()), Some(class));
        }
    }

    #[test]
    fn carrier_range_at_each_level() {
        let expected = [3.5, 4.2, 4.9, 5.6, 6.3, 7.0];
        for (level, want) in expected.into_iter().enumerate() {
            let got = effective_range(JumpShipType::Carrier, level as i32);
            assert!((got - want).abs() < 1e-9, "level {level}: {got} != {want}");
        }
    }

    #[test]
    fn skill_is_clamped() {
        assert_eq!(
            effective_range(JumpShipType::Titan, -3),
            effective_range(JumpShipType::Titan, 0)
        );
        assert_eq!(
            effective_range(JumpShipType::Titan, 12),
            effective_range(JumpShipType::Titan, 5)
        );
    }

    #[test]
    fn capitals_avoid_high_sec() {
        assert!(!ShipClass::Capital.may_enter(SecurityBand::High));
        assert!(!ShipClass::Supercapital.may_enter(SecurityBand::High));
        assert!(ShipClass::Capital.may_enter(SecurityBand::Low));
        assert!(ShipClass::Battleship.may_enter(SecurityBand::High));
    }
}
