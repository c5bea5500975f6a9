//! Constants shared by the jump range and fatigue models.

/// Highest trainable jump skill level.
pub const MAX_SKILL_LEVEL: u8 = 5;

/// Upper bound on accumulated jump fatigue, in minutes.
pub const MAX_FATIGUE_MINUTES: f64 = 300.0;

/// Upper bound on a single jump activation cooldown, in minutes.
pub const MAX_COOLDOWN_MINUTES: f64 = 30.0;

/// Final fatigue at or above this is reported as high risk.
pub const FATIGUE_HIGH_MINUTES: f64 = 180.0;

/// Final fatigue at or above this is reported as medium risk.
pub const FATIGUE_MEDIUM_MINUTES: f64 = 60.0;

/// Shortest distance covered by the memoized fatigue table, in light-years.
pub const FATIGUE_TABLE_MIN_LY: f64 = 0.1;

/// Longest distance covered by the memoized fatigue table, in light-years.
pub const FATIGUE_TABLE_MAX_LY: f64 = 10.0;

/// Fatigue multiplier for ordinary jump drives.
pub const STANDARD_FATIGUE_MULTIPLIER: f64 = 1.0;

/// Fatigue multiplier when travelling through a covert jump bridge.
pub const COVERT_BRIDGE_FATIGUE_MULTIPLIER: f64 = 0.25;

/// Fatigue multiplier for industrial jump hulls.
pub const INDUSTRIAL_FATIGUE_MULTIPLIER: f64 = 0.10;
