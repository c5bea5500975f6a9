//! Ship capabilities: hull classes, jump range, and jump fatigue.
//!
//! - [`range`] - jump-capable hull types, size classes, effective range
//! - [`fatigue`] - cooldown and fatigue accumulation across jumps
//! - [`constants`] - shared limits and multipliers
//!
//! # Example
//!
//! ```
//! use evenav_lib::ship::{effective_range, project_fatigue, FatigueProfile, JumpShipType};
//!
//! let carrier = JumpShipType::parse("carrier").unwrap();
//! assert!((effective_range(carrier, 5) - 7.0).abs() < 1e-9);
//!
//! let summary = project_fatigue(&[6.0, 6.0], FatigueProfile::Standard);
//! assert_eq!(summary.hops.len(), 2);
//! ```

pub mod constants;
pub mod fatigue;
pub mod range;

pub use constants::{
    FATIGUE_HIGH_MINUTES, FATIGUE_MEDIUM_MINUTES, MAX_COOLDOWN_MINUTES, MAX_FATIGUE_MINUTES,
    MAX_SKILL_LEVEL,
};
pub use fatigue::{
    project_fatigue, FatigueProfile, FatigueRisk, FatigueState, FatigueSummary, HopFatigue,
};
pub use range::{effective_range, JumpRangeSpec, JumpShipType, ShipClass};
