use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EmissionDirection;
use crate::core::math::{Bounds, DOWN, LEFT, RIGHT, UP};
use crate::core::rng::Rng;

/// Axis-aligned box centered on `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangleShape {
    center: Vec2,
    pub rotation: f32,
    size: Vec2,
}

impl Default for RectangleShape {
    fn default() -> Self {
        Self::new(Vec2::splat(128.0))
    }
}

impl RectangleShape {
    pub fn new(size: Vec2) -> Self {
        let mut shape = Self {
            center: Vec2::ZERO,
            rotation: 0.0,
            size: Vec2::ONE,
        };
        shape.set_size(size);
        shape
    }

    pub fn with_center(mut self, center: Vec2) -> Self {
        self.set_center(center);
        self
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Set the size, each axis clamped to at least one unit.
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size.max(Vec2::ONE);
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_center(self.center, self.size)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.bounds().contains(point)
    }

    pub fn intersects(&self, bounds: &Bounds) -> bool {
        self.bounds().intersects(bounds)
    }
}

/// Emits inside a box, or along its perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectangleEmitterShape {
    pub shape: RectangleShape,
    pub direction: EmissionDirection,
    pub edge_only: bool,
    /// Space particles evenly along the perimeter. Only used with `edge_only`.
    pub uniform: bool,
}

impl RectangleEmitterShape {
    pub fn new(size: Vec2) -> Self {
        Self {
            shape: RectangleShape::new(size),
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

    pub fn sample(&self, uniform_ratio: f32, rng: &mut Rng) -> (Vec2, Vec2) {
        let size = self.shape.size();
        if !self.edge_only {
            let position = Vec2::new(rng.range(0.0, size.x), rng.range(0.0, size.y)) - size / 2.0;
            return (position, rng.unit_vector());
        }

        let perimeter = 2.0 * (size.x + size.y);
        let mut len = if self.uniform {
            uniform_ratio * perimeter
        } else {
            rng.range(0.0, perimeter)
        };

        // Walk top -> right -> bottom -> left, starting at the top-left corner.
        let half = size / 2.0;
        let (position, heading) = if len < size.x {
            (Vec2::new(-half.x + len, -half.y), UP)
        } else if len < size.x + size.y {
            len -= size.x;
            (Vec2::new(half.x, -half.y + len), RIGHT)
        } else if len < 2.0 * size.x + size.y {
            len -= size.x + size.y;
            (Vec2::new(half.x - len, half.y), DOWN)
        } else {
            len -= 2.0 * size.x + size.y;
            (Vec2::new(-half.x, half.y - len), LEFT)
        };

        let heading = match self.direction {
            EmissionDirection::Out => heading,
            EmissionDirection::In => -heading,
            EmissionDirection::None => rng.unit_vector(),
        };
        (position, heading)
    }
}
