//! Small geometry helpers shared by shapes, emitters and area regions.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unit heading pointing up the screen (Y-down coordinates).
pub const UP: Vec2 = Vec2::new(0.0, -1.0);
/// Unit heading pointing right.
pub const RIGHT: Vec2 = Vec2::new(1.0, 0.0);
/// Unit heading pointing down the screen.
pub const DOWN: Vec2 = Vec2::new(0.0, 1.0);
/// Unit heading pointing left.
pub const LEFT: Vec2 = Vec2::new(-1.0, 0.0);

/// Axis-aligned rectangle stored as top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Bounds of a `size` box centered on `center`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            x: center.x - size.x / 2.0,
            y: center.y - size.y / 2.0,
            width: size.x,
            height: size.y,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether `point` lies inside or on the edge of the rectangle.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Whether the two rectangles overlap. Touching edges count.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

/// Value at `ratio` of the way from `min` to `max`.
#[inline]
pub fn between(min: f32, max: f32, ratio: f32) -> f32 {
    min + (max - min) * ratio
}

/// Where `value` sits between `min` and `max` (0 at `min`, 1 at `max`).
#[inline]
pub fn ratio(min: f32, max: f32, value: f32) -> f32 {
    (value - min) / (max - min)
}

/// Sprite angle that faces along `direction`.
#[inline]
pub fn angle_of(direction: Vec2) -> f32 {
    (-direction.x).atan2(direction.y)
}
