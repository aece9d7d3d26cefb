//! Seedable pseudo-random number generator for emission and module sampling.
//! Deterministic per seed, cheap to fork for parallel work.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};
use std::f32::consts::{PI, TAU};

/// Seedable pseudo-random number generator.
#[derive(Debug, Clone)]
pub struct Rng {
    inner: SmallRng,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Uniform value in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Uniform value in [min, max). Returns `min` for an empty range.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform angle in [-PI, -PI + TAU * ratio).
    #[inline]
    pub fn angle(&mut self, ratio: f32) -> f32 {
        -PI + TAU * ratio * self.next_f32()
    }

    /// Random unit-length heading.
    #[inline]
    pub fn unit_vector(&mut self) -> Vec2 {
        Vec2::from_angle(self.angle(1.0))
    }

    /// Independent generator seeded from this one.
    pub fn fork(&mut self) -> Rng {
        Rng::new(self.inner.random::<u64>())
    }
}
