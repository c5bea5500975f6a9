//! Distance math over 3-D star map coordinates.
//!
//! Positions are stored in meters, as in the static data export. Everything
//! that reasons about jump range works in light-years, so conversions go
//! through [`METERS_PER_LIGHT_YEAR`].

use serde::{Deserialize, Serialize};

/// Meters in one light-year.
pub const METERS_PER_LIGHT_YEAR: f64 = 9_460_730_472_580_800.0;

/// Cartesian coordinates for a solar system, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SystemPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a position from light-year coordinates.
    pub fn from_light_years(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x * METERS_PER_LIGHT_YEAR,
            y: y * METERS_PER_LIGHT_YEAR,
            z: z * METERS_PER_LIGHT_YEAR,
        }
    }

    /// Calculate the Euclidean distance to another position in meters.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Euclidean distance to another position in light-years.
    pub fn distance_ly(&self, other: &Self) -> f64 {
        self.distance_to(other) / METERS_PER_LIGHT_YEAR
    }

    /// Coordinates converted to light-years.
    pub fn to_light_years(&self) -> [f64; 3] {
        [
            self.x / METERS_PER_LIGHT_YEAR,
            self.y / METERS_PER_LIGHT_YEAR,
            self.z / METERS_PER_LIGHT_YEAR,
        ]
    }
}

/// Euclidean distance between two positions in meters.
pub fn distance(a: &SystemPosition, b: &SystemPosition) -> f64 {
    a.distance_to(b)
}

/// Euclidean distance between two positions in light-years.
pub fn distance_ly(a: &SystemPosition, b: &SystemPosition) -> f64 {
    a.distance_ly(b)
}

/// Euclidean distance between two light-year coordinate triples.
pub fn distance_ly_points(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
