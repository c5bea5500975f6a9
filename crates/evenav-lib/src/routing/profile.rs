use std::fmt;

use serde::{Deserialize, Serialize};

/// Coefficients that weight each component of a route's normalized cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileWeights {
    pub gate_cost: f64,
    pub jump_cost: f64,
    pub risk: f64,
    pub security_penalty: f64,
    pub fuel: f64,
    /// Extra minutes charged per jump on top of the base jump time.
    pub per_jump: f64,
}

/// Named speed/safety trade-off used when comparing candidate routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceProfile {
    Speed,
    #[default]
    Balanced,
    Safety,
}

const SPEED: ProfileWeights = ProfileWeights {
    gate_cost: 1.0,
    jump_cost: 1.0,
    risk: 0.2,
    security_penalty: 0.2,
    fuel: 0.5,
    per_jump: 0.5,
};

const BALANCED: ProfileWeights = ProfileWeights {
    gate_cost: 1.0,
    jump_cost: 1.0,
    risk: 0.6,
    security_penalty: 0.6,
    fuel: 1.0,
    per_jump: 1.0,
};

const SAFETY: ProfileWeights = ProfileWeights {
    gate_cost: 1.2,
    jump_cost: 1.1,
    risk: 1.5,
    security_penalty: 1.5,
    fuel: 1.0,
    per_jump: 2.0,
};

impl PreferenceProfile {
    /// Profile implied by a 0-100 safety-vs-speed slider.
    pub fn from_safety_vs_speed(value: f64) -> Self {
        if value <= 40.0 {
            PreferenceProfile::Speed
        } else if value >= 60.0 {
            PreferenceProfile::Safety
        } else {
            PreferenceProfile::Balanced
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "speed" | "fast" => Some(PreferenceProfile::Speed),
            "balanced" => Some(PreferenceProfile::Balanced),
            "safety" | "safe" => Some(PreferenceProfile::Safety),
            _ => None,
        }
    }

    pub fn weights(self) -> &'static ProfileWeights {
        match self {
            PreferenceProfile::Speed => &SPEED,
            PreferenceProfile::Balanced => &BALANCED,
            PreferenceProfile::Safety => &SAFETY,
        }
    }
}

impl fmt::Display for PreferenceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            PreferenceProfile::Speed => "speed",
            PreferenceProfile::Balanced => "balanced",
            PreferenceProfile::Safety => "safety",
        };
        f.write_str(value)
    }
}
