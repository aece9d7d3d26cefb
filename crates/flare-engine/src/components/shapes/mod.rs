//! Geometric shapes: hit-testing for area regions and emission sampling for
//! emitters.

mod circle;
mod point;
mod rectangle;

pub use circle::{CircleEmitterShape, CircleShape};
pub use point::{PointEmitterShape, PointShape};
pub use rectangle::{RectangleEmitterShape, RectangleShape};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::math::Bounds;
use crate::core::rng::Rng;

/// Heading policy for particles emitted from a shape's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionDirection {
    /// Point toward the center.
    In,
    /// Point away from the center.
    Out,
    /// Random heading.
    #[default]
    None,
}

/// Shape that can be hit-tested against points and rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Point(PointShape),
    Circle(CircleShape),
    Rectangle(RectangleShape),
}

impl Shape {
    pub fn center(&self) -> Vec2 {
        match self {
            Shape::Point(s) => s.center,
            Shape::Circle(s) => s.center,
            Shape::Rectangle(s) => s.center(),
        }
    }

    pub fn set_center(&mut self, center: Vec2) {
        match self {
            Shape::Point(s) => s.center = center,
            Shape::Circle(s) => s.center = center,
            Shape::Rectangle(s) => s.set_center(center),
        }
    }

    pub fn rotation(&self) -> f32 {
        match self {
            Shape::Point(s) => s.rotation,
            Shape::Circle(s) => s.rotation,
            Shape::Rectangle(s) => s.rotation,
        }
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        match self {
            Shape::Point(s) => s.rotation = rotation,
            Shape::Circle(s) => s.rotation = rotation,
            Shape::Rectangle(s) => s.rotation = rotation,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Shape::Point(s) => s.contains(point),
            Shape::Circle(s) => s.contains(point),
            Shape::Rectangle(s) => s.contains(point),
        }
    }

    pub fn intersects(&self, bounds: &Bounds) -> bool {
        match self {
            Shape::Point(s) => s.intersects(bounds),
            Shape::Circle(s) => s.intersects(bounds),
            Shape::Rectangle(s) => s.intersects(bounds),
        }
    }
}

impl From<PointShape> for Shape {
    fn from(s: PointShape) -> Self {
        Shape::Point(s)
    }
}

impl From<CircleShape> for Shape {
    fn from(s: CircleShape) -> Self {
        Shape::Circle(s)
    }
}

impl From<RectangleShape> for Shape {
    fn from(s: RectangleShape) -> Self {
        Shape::Rectangle(s)
    }
}

/// Shape an emitter spawns particles from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmitterShape {
    Point(PointEmitterShape),
    Circle(CircleEmitterShape),
    Rectangle(RectangleEmitterShape),
}

impl Default for EmitterShape {
    fn default() -> Self {
        EmitterShape::Point(PointEmitterShape::default())
    }
}

impl EmitterShape {
    /// Local spawn offset and unit heading for one particle.
    ///
    /// `uniform_ratio` is the particle's position within its emission batch,
    /// in [0, 1), and drives shapes configured for even spacing.
    pub fn sample(&self, uniform_ratio: f32, rng: &mut Rng) -> (Vec2, Vec2) {
        match self {
            EmitterShape::Point(s) => s.sample(uniform_ratio, rng),
            EmitterShape::Circle(s) => s.sample(uniform_ratio, rng),
            EmitterShape::Rectangle(s) => s.sample(uniform_ratio, rng),
        }
    }

    /// The hit-testable geometry of this emitter shape.
    pub fn geometry(&self) -> Shape {
        match self {
            EmitterShape::Point(s) => Shape::Point(s.shape),
            EmitterShape::Circle(s) => Shape::Circle(s.shape),
            EmitterShape::Rectangle(s) => Shape::Rectangle(s.shape),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.geometry().center()
    }

    pub fn set_center(&mut self, center: Vec2) {
        match self {
            EmitterShape::Point(s) => s.shape.center = center,
            EmitterShape::Circle(s) => s.shape.center = center,
            EmitterShape::Rectangle(s) => s.shape.set_center(center),
        }
    }

    pub fn rotation(&self) -> f32 {
        self.geometry().rotation()
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        match self {
            EmitterShape::Point(s) => s.shape.rotation = rotation,
            EmitterShape::Circle(s) => s.shape.rotation = rotation,
            EmitterShape::Rectangle(s) => s.shape.rotation = rotation,
        }
    }

    /// Smallest size that covers every spawn point, used as the default
    /// emitter size.
    pub fn bounds_hint(&self) -> Vec2 {
        match self {
            EmitterShape::Point(_) => Vec2::ONE,
            EmitterShape::Circle(s) => Vec2::splat(s.shape.radius() * 2.0),
            EmitterShape::Rectangle(s) => s.shape.size(),
        }
    }
}

impl From<PointEmitterShape> for EmitterShape {
    fn from(s: PointEmitterShape) -> Self {
        EmitterShape::Point(s)
    }
}

impl From<CircleEmitterShape> for EmitterShape {
    fn from(s: CircleEmitterShape) -> Self {
        EmitterShape::Circle(s)
    }
}

impl From<RectangleEmitterShape> for EmitterShape {
    fn from(s: RectangleEmitterShape) -> Self {
        EmitterShape::Rectangle(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_center_round_trips_through_variants() {
        let mut shapes = [
            Shape::from(PointShape::new()),
            Shape::from(CircleShape::new(4.0)),
            Shape::from(RectangleShape::new(Vec2::splat(4.0))),
        ];
        for shape in &mut shapes {
            shape.set_center(Vec2::new(7.0, -2.0));
            shape.set_rotation(0.5);
            assert_eq!(shape.center(), Vec2::new(7.0, -2.0));
            assert_eq!(shape.rotation(), 0.5);
            assert!(shape.intersects(&Bounds::from_center(Vec2::new(7.0, -2.0), Vec2::ONE)));
        }
    }

    #[test]
    fn emitter_shape_exposes_geometry() {
        let mut shape = EmitterShape::from(CircleEmitterShape::new(3.0));
        shape.set_center(Vec2::new(1.0, 1.0));
        assert!(shape.geometry().contains(Vec2::new(2.0, 2.0)));
        assert_eq!(shape.bounds_hint(), Vec2::splat(6.0));
    }

    #[test]
    fn shape_json_is_tagged() {
        let json = r#"{ "type": "circle", "center": [0.0, 0.0], "rotation": 0.0, "radius": 5.0, "angle_ratio": 1.0 }"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert!(matches!(shape, Shape::Circle(c) if c.radius() == 5.0));
    }
}
