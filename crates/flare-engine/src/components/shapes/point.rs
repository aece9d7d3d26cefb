use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::math::Bounds;
use crate::core::rng::Rng;

/// Degenerate zero-area shape.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointShape {
    pub center: Vec2,
    pub rotation: f32,
}

impl PointShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(center: Vec2) -> Self {
        Self { center, rotation: 0.0 }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point == self.center
    }

    pub fn intersects(&self, bounds: &Bounds) -> bool {
        bounds.contains(self.center)
    }
}

/// Emits every particle from the center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointEmitterShape {
    pub shape: PointShape,
    /// Fixed heading for every particle; random when `None`.
    pub heading: Option<Vec2>,
}

impl PointEmitterShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heading(mut self, heading: Vec2) -> Self {
        self.heading = Some(heading.normalize_or_zero());
        self
    }

    pub fn sample(&self, _uniform_ratio: f32, rng: &mut Rng) -> (Vec2, Vec2) {
        let heading = match self.heading {
            Some(h) => h,
            None => rng.unit_vector(),
        };
        (Vec2::ZERO, heading)
    }
}
