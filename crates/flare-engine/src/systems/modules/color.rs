use serde::{Deserialize, Serialize};

use super::{ParticleModule, UpdateContext};
use crate::components::particle::Particle;
use crate::core::curve::SharedCurve;
use crate::core::math::between;
use crate::core::rng::Rng;
use crate::extensions::easing::lerp;

/// Which color channel a [`ColorModule`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorChannel {
    Hue,
    Saturation,
    Lightness,
    Alpha,
}

impl ColorChannel {
    /// Index of the channel in [`Particle::color`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ColorChannel::Hue => 0,
            ColorChannel::Saturation => 1,
            ColorChannel::Lightness => 2,
            ColorChannel::Alpha => 3,
        }
    }
}

/// How a channel moves over a particle's life.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// From the emitted value to `end`.
    Lerp { end: f32 },
    /// Curve evaluated at the life ratio.
    Curve(SharedCurve),
    /// From the emitted value to a target drawn once per particle from [min, max).
    RandomLerp { min: f32, max: f32 },
}

impl Transition {
    pub fn random_lerp(min: f32, max: f32) -> Self {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        Transition::RandomLerp { min, max }
    }

    fn deep_copy(&self) -> Self {
        match self {
            Transition::Curve(curve) => Transition::Curve(curve.deep_clone()),
            other => other.clone(),
        }
    }
}

/// Drives one color channel of every particle over its lifetime.
///
/// Keeps per-slot state: the channel value captured when the particle was
/// activated, and for [`Transition::RandomLerp`] the particle's own target.
#[derive(Debug, Clone)]
pub struct ColorModule {
    channel: ColorChannel,
    transition: Transition,
    pub enabled: bool,
    start: Vec<f32>,
    target: Vec<f32>,
}

impl ColorModule {
    pub fn new(channel: ColorChannel, transition: Transition) -> Self {
        let transition = match transition {
            Transition::RandomLerp { min, max } => Transition::random_lerp(min, max),
            other => other,
        };
        Self {
            channel,
            transition,
            enabled: true,
            start: Vec::new(),
            target: Vec::new(),
        }
    }

    pub fn hue(transition: Transition) -> Self {
        Self::new(ColorChannel::Hue, transition)
    }

    pub fn saturation(transition: Transition) -> Self {
        Self::new(ColorChannel::Saturation, transition)
    }

    pub fn lightness(transition: Transition) -> Self {
        Self::new(ColorChannel::Lightness, transition)
    }

    pub fn alpha(transition: Transition) -> Self {
        Self::new(ColorChannel::Alpha, transition)
    }

    pub fn channel(&self) -> ColorChannel {
        self.channel
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    /// Switch transition. Per-particle targets are only drawn for particles
    /// activated after the switch.
    pub fn set_transition(&mut self, transition: Transition) {
        self.transition = match transition {
            Transition::RandomLerp { min, max } => Transition::random_lerp(min, max),
            other => other,
        };
    }

    /// Copy with the same channel and transition but no particle state.
    pub fn deep_copy(&self) -> Self {
        Self {
            enabled: self.enabled,
            ..Self::new(self.channel, self.transition.deep_copy())
        }
    }

    /// Per-particle target drawn at activation, if any.
    pub fn target_of(&self, slot: usize) -> Option<f32> {
        match self.transition {
            Transition::RandomLerp { .. } => self.target.get(slot).copied(),
            _ => None,
        }
    }
}

impl ParticleModule for ColorModule {
    fn initialize(&mut self, capacity: usize) {
        self.start.clear();
        self.start.resize(capacity, 0.0);
        self.target.clear();
        self.target.resize(capacity, 0.0);
    }

    fn on_activated(&mut self, particles: &[Particle], indices: &[usize], rng: &mut Rng) {
        let ch = self.channel.index();
        for &slot in indices {
            self.start[slot] = particles[slot].color[ch];
            if let Transition::RandomLerp { min, max } = self.transition {
                self.target[slot] = between(min, max, rng.next_f32());
            }
        }
    }

    fn on_update(&mut self, _ctx: &UpdateContext, particles: &mut [Particle]) {
        let ch = self.channel.index();
        match &self.transition {
            Transition::Lerp { end } => {
                for (p, start) in particles.iter_mut().zip(&self.start) {
                    p.color[ch] = lerp(*start, *end, p.life_ratio());
                }
            }
            Transition::Curve(curve) => curve.with(|curve| {
                for p in particles.iter_mut() {
                    p.color[ch] = curve.evaluate(p.life_ratio());
                }
            }),
            Transition::RandomLerp { .. } => {
                for ((p, start), end) in particles.iter_mut().zip(&self.start).zip(&self.target) {
                    p.color[ch] = lerp(*start, *end, p.life_ratio());
                }
            }
        }
    }

    fn on_relocated(&mut self, from: usize, to: usize) {
        self.start.swap(from, to);
        self.target.swap(from, to);
    }
}
