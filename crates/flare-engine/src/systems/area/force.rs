use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::particle::Particle;
use crate::core::math::angle_of;
use crate::extensions::easing::lerp;

/// Whether a force pulls particles in or pushes them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    #[default]
    Attract,
    Repel,
}

/// Radial force field.
///
/// Strength ramps linearly from zero at `min_distance` to full at
/// `max_distance`. Particles farther than `max_distance` are untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceEffect {
    mode: ForceMode,
    min_distance: f32,
    max_distance: f32,
    intensity: f32,
    speed_increase: f32,
}

impl Default for ForceEffect {
    fn default() -> Self {
        Self {
            mode: ForceMode::Attract,
            min_distance: 0.0,
            max_distance: f32::MAX,
            intensity: 25.0,
            speed_increase: 12.0,
        }
    }
}

impl ForceEffect {
    pub fn new(mode: ForceMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn attract(min_distance: f32, max_distance: f32) -> Self {
        Self::with_range(ForceMode::Attract, min_distance, max_distance)
    }

    pub fn repel(min_distance: f32, max_distance: f32) -> Self {
        Self::with_range(ForceMode::Repel, min_distance, max_distance)
    }

    fn with_range(mode: ForceMode, min_distance: f32, max_distance: f32) -> Self {
        let mut effect = Self {
            mode,
            intensity: 10.0,
            speed_increase: 10.0,
            ..Default::default()
        };
        effect.set_max_distance(max_distance);
        effect.set_min_distance(min_distance);
        effect
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.set_intensity(intensity);
        self
    }

    pub fn with_speed_increase(mut self, speed_increase: f32) -> Self {
        self.set_speed_increase(speed_increase);
        self
    }

    pub fn mode(&self) -> ForceMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ForceMode) {
        self.mode = mode;
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Clamped to `[0, max_distance]`.
    pub fn set_min_distance(&mut self, distance: f32) {
        self.min_distance = distance.clamp(0.0, self.max_distance);
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Clamped to at least `min_distance`.
    pub fn set_max_distance(&mut self, distance: f32) {
        self.max_distance = distance.max(self.min_distance);
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    pub fn speed_increase(&self) -> f32 {
        self.speed_increase
    }

    pub fn set_speed_increase(&mut self, speed_increase: f32) {
        self.speed_increase = speed_increase.max(0.0);
    }

    /// Strength at `distance`, in [0, 1].
    pub fn ratio(&self, distance: f32) -> f32 {
        let span = self.max_distance - self.min_distance;
        if span <= f32::EPSILON {
            return 1.0;
        }
        ((distance - self.min_distance) / span).clamp(0.0, 1.0)
    }

    /// Steer one particle relative to a field centered on `center`.
    /// The caller has already checked the particle is inside the field.
    pub fn apply(&self, center: Vec2, dt: f32, particle: &mut Particle) {
        let distance = center.distance(particle.position);
        if distance > self.max_distance {
            return;
        }
        let ratio = self.ratio(distance);
        let mut toward = (center - particle.position).normalize_or_zero();
        let angle = angle_of(toward);
        if self.mode == ForceMode::Repel {
            toward = -toward;
        }

        let blend = (ratio * self.intensity * dt).min(1.0);
        particle.direction = particle.direction.lerp(toward, blend);
        particle.sprite_rotation = lerp(particle.sprite_rotation, angle, blend);
        particle.speed += self.speed_increase * ratio;
    }
}
