use serde::{Deserialize, Serialize};

use crate::constants::{WORLD_MAX_X, WORLD_MAX_Y, WORLD_MIN_X, WORLD_MIN_Y};
use crate::rng::SeededRng;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Unit vector for a heading in degrees, counter-clockwise from +x.
    pub fn from_heading_deg(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        Self::new(radians.cos(), radians.sin())
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn offset(self, delta: Self) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }
}

/// Axis-aligned rectangle the target is confined to and agents spawn in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: WORLD_MIN_X,
            max_x: WORLD_MAX_X,
            min_y: WORLD_MIN_Y,
            max_y: WORLD_MAX_Y,
        }
    }
}

impl Bounds {
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min_x, self.max_x),
            point.y.clamp(self.min_y, self.max_y),
        )
    }

    pub fn sample(&self, rng: &mut SeededRng) -> Vec2 {
        let x = rng.range(self.min_x, self.max_x);
        let y = rng.range(self.min_y, self.max_y);
        Vec2::new(x, y)
    }
}
