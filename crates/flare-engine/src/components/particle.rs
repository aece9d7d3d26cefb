//! The particle record held in emitter buffers.

use glam::{Vec2, Vec4};

/// A single particle. Identity is its slot index in the owning emitter's
/// buffer, and that slot changes whenever another particle expires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub scale: Vec2,
    /// Normalized travel heading.
    pub direction: Vec2,
    /// Color channels, interpreted by modules as hue, saturation, lightness, alpha.
    pub color: Vec4,
    /// Used by attract/repel style effects.
    pub mass: f32,
    pub speed: f32,
    /// Sprite rotation in radians.
    pub sprite_rotation: f32,
    /// Lifetime assigned at emission, in seconds.
    pub initial_life: f32,
    /// Seconds since emission.
    pub time_alive: f32,
    /// Texture source rectangle (x, y, width, height).
    pub source_rect: Vec4,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            direction: Vec2::ZERO,
            color: Vec4::ZERO,
            mass: 0.0,
            speed: 0.0,
            sprite_rotation: 0.0,
            initial_life: 1.0,
            time_alive: 1.0,
            source_rect: Vec4::ZERO,
        }
    }
}

impl Particle {
    /// Normalized progress through the particle's life, 0 at emission and 1 at expiry.
    #[inline]
    pub fn life_ratio(&self) -> f32 {
        if self.initial_life <= 0.0 {
            1.0
        } else {
            self.time_alive / self.initial_life
        }
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.time_alive >= self.initial_life
    }

    /// Current velocity vector.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.direction * self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_particle_is_spent() {
        let p = Particle::default();
        assert!(p.is_expired());
        assert_eq!(p.scale, Vec2::ONE);
    }

    #[test]
    fn life_ratio_progresses() {
        let p = Particle {
            initial_life: 4.0,
            time_alive: 1.0,
            ..Default::default()
        };
        assert_eq!(p.life_ratio(), 0.25);
        assert!(!p.is_expired());
    }

    #[test]
    fn zero_life_counts_as_finished() {
        let p = Particle {
            initial_life: 0.0,
            time_alive: 0.0,
            ..Default::default()
        };
        assert_eq!(p.life_ratio(), 1.0);
        assert!(p.is_expired());
    }
}
