use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use super::EmissionDirection;
use crate::core::math::{between, Bounds};
use crate::core::rng::Rng;

const FULL_CIRCLE_TOLERANCE: f32 = 0.0001;

/// Circle, or a pie wedge when `angle_ratio` is below one.
///
/// The wedge spans `[rotation - PI, rotation - PI + TAU * angle_ratio]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleShape {
    pub center: Vec2,
    pub rotation: f32,
    radius: f32,
    angle_ratio: f32,
}

impl Default for CircleShape {
    fn default() -> Self {
        Self::new(32.0)
    }
}

impl CircleShape {
    pub fn new(radius: f32) -> Self {
        Self::wedge(radius, 1.0)
    }

    pub fn wedge(radius: f32, angle_ratio: f32) -> Self {
        let mut shape = Self {
            center: Vec2::ZERO,
            rotation: 0.0,
            radius: 1.0,
            angle_ratio: 1.0,
        };
        shape.set_radius(radius);
        shape.set_angle_ratio(angle_ratio);
        shape
    }

    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the radius, clamped to at least one unit.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(1.0);
    }

    pub fn angle_ratio(&self) -> f32 {
        self.angle_ratio
    }

    /// Set the fraction of the full circle covered, clamped to [0.001, 1].
    pub fn set_angle_ratio(&mut self, ratio: f32) {
        self.angle_ratio = ratio.clamp(0.001, 1.0);
    }

    pub fn is_full_circle(&self) -> bool {
        (self.angle_ratio - 1.0).abs() < FULL_CIRCLE_TOLERANCE
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let d = point - self.center;
        let (dx, dy) = (d.x.abs(), d.y.abs());
        let r = self.radius;
        if dx > r || dy > r {
            return false;
        }
        let inside = dx + dy <= r || dx * dx + dy * dy <= r * r;
        if !inside || self.is_full_circle() {
            return inside;
        }

        // Angle measured from the wedge start, wrapped into [0, TAU).
        let start = self.rotation - PI;
        let swept = (d.y.atan2(d.x) - start).rem_euclid(TAU);
        swept <= TAU * self.angle_ratio
    }

    /// Circle-vs-rectangle overlap.
    pub fn intersects(&self, bounds: &Bounds) -> bool {
        let half = bounds.size() / 2.0;
        let dist = (self.center - bounds.center()).abs();

        if dist.x > half.x + self.radius || dist.y > half.y + self.radius {
            return false;
        }
        if dist.x <= half.x || dist.y <= half.y {
            return true;
        }
        let corner = dist - half;
        corner.length_squared() <= self.radius * self.radius
    }
}

/// Emits from inside, or from the rim of, a circle or wedge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CircleEmitterShape {
    pub shape: CircleShape,
    pub direction: EmissionDirection,
    /// Emit from the rim only.
    pub edge_only: bool,
    /// Space particles evenly around the arc instead of at random angles.
    pub uniform: bool,
}

impl CircleEmitterShape {
    pub fn new(radius: f32) -> Self {
        Self {
            shape: CircleShape::new(radius),
            ..Default::default()
        }
    }

    pub fn with_direction(mut self, direction: EmissionDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_edge_only(mut self, edge_only: bool) -> Self {
        self.edge_only = edge_only;
        self
    }

    pub fn with_uniform(mut self, uniform: bool) -> Self {
        self.uniform = uniform;
        self
    }

    pub fn with_angle_ratio(mut self, ratio: f32) -> Self {
        self.shape.set_angle_ratio(ratio);
        self
    }

    pub fn sample(&self, uniform_ratio: f32, rng: &mut Rng) -> (Vec2, Vec2) {
        let shape = &self.shape;
        let distance = if self.edge_only {
            shape.radius()
        } else {
            rng.range(0.0, shape.radius())
        };

        let angle = if shape.is_full_circle() {
            if self.uniform {
                between(-PI, PI, uniform_ratio)
            } else {
                rng.angle(1.0)
            }
        } else if self.uniform {
            between(-PI, -PI + TAU * shape.angle_ratio(), uniform_ratio) + shape.rotation
        } else {
            rng.angle(shape.angle_ratio()) + shape.rotation
        };

        let heading = Vec2::from_angle(angle);
        match self.direction {
            EmissionDirection::Out => (heading * distance, heading),
            EmissionDirection::In => (-heading * distance, heading),
            EmissionDirection::None => (heading * distance, rng.unit_vector()),
        }
    }
}
