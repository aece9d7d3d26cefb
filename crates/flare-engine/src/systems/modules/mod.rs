//! Behavior modules: ordered, per-emitter transforms run over the active
//! particle range every update.
//!
//! Each module owns per-slot state sized to its emitter's capacity, so a
//! module instance belongs to exactly one emitter. Use `deep_copy` to give
//! another emitter the same behavior.

mod color;
mod texture_animation;

pub use color::{ColorChannel, ColorModule, Transition};
pub use texture_animation::{AnimationMode, TextureAnimationModule};

use glam::Vec2;
use std::fmt;
use std::str::FromStr;

use crate::api::error::ParticleError;
use crate::components::particle::Particle;
use crate::core::rng::Rng;

/// Per-update values a module may need from its emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateContext {
    pub dt: f32,
    /// Size of the emitter's texture, for modules that pick atlas regions.
    pub texture_size: Vec2,
}

impl UpdateContext {
    pub fn new(dt: f32, texture_size: Vec2) -> Self {
        Self { dt, texture_size }
    }
}

/// Hooks an emitter calls on its modules.
///
/// Only `on_update` is required. The other hooks are for modules that keep
/// per-slot state.
pub trait ParticleModule {
    /// Size per-slot state for an emitter of `capacity` particles. Called when
    /// the module is added to an emitter.
    fn initialize(&mut self, _capacity: usize) {}

    /// Slots in `indices` were filled by emission since the last update.
    fn on_activated(&mut self, _particles: &[Particle], _indices: &[usize], _rng: &mut Rng) {}

    /// Advance the active particle range.
    fn on_update(&mut self, ctx: &UpdateContext, particles: &mut [Particle]);

    /// The particle in slot `from` was moved to slot `to` by a swap-remove.
    fn on_relocated(&mut self, _from: usize, _to: usize) {}
}

/// Tag naming a module type, used to query and remove modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Hue,
    Saturation,
    Lightness,
    Alpha,
    TextureAnimation,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 5] = [
        ModuleKind::Hue,
        ModuleKind::Saturation,
        ModuleKind::Lightness,
        ModuleKind::Alpha,
        ModuleKind::TextureAnimation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Hue => "hue",
            ModuleKind::Saturation => "saturation",
            ModuleKind::Lightness => "lightness",
            ModuleKind::Alpha => "alpha",
            ModuleKind::TextureAnimation => "texture_animation",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = ParticleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParticleError::UnknownModuleKind(s.to_string()))
    }
}

impl From<ColorChannel> for ModuleKind {
    fn from(channel: ColorChannel) -> Self {
        match channel {
            ColorChannel::Hue => ModuleKind::Hue,
            ColorChannel::Saturation => ModuleKind::Saturation,
            ColorChannel::Lightness => ModuleKind::Lightness,
            ColorChannel::Alpha => ModuleKind::Alpha,
        }
    }
}

/// A behavior module attached to an emitter.
#[derive(Debug, Clone)]
pub enum Module {
    Color(ColorModule),
    TextureAnimation(TextureAnimationModule),
}

impl Module {
    pub fn kind(&self) -> ModuleKind {
        match self {
            Module::Color(m) => m.channel().into(),
            Module::TextureAnimation(_) => ModuleKind::TextureAnimation,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Module::Color(m) => m.enabled,
            Module::TextureAnimation(m) => m.enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Module::Color(m) => m.enabled = enabled,
            Module::TextureAnimation(m) => m.enabled = enabled,
        }
    }

    /// Same behavior with fresh per-slot state and no shared curves.
    pub fn deep_copy(&self) -> Module {
        match self {
            Module::Color(m) => Module::Color(m.deep_copy()),
            Module::TextureAnimation(m) => Module::TextureAnimation(m.clone()),
        }
    }

    fn inner(&mut self) -> &mut dyn ParticleModule {
        match self {
            Module::Color(m) => m,
            Module::TextureAnimation(m) => m,
        }
    }
}

impl ParticleModule for Module {
    fn initialize(&mut self, capacity: usize) {
        self.inner().initialize(capacity);
    }

    fn on_activated(&mut self, particles: &[Particle], indices: &[usize], rng: &mut Rng) {
        self.inner().on_activated(particles, indices, rng);
    }

    fn on_update(&mut self, ctx: &UpdateContext, particles: &mut [Particle]) {
        self.inner().on_update(ctx, particles);
    }

    fn on_relocated(&mut self, from: usize, to: usize) {
        self.inner().on_relocated(from, to);
    }
}

impl From<ColorModule> for Module {
    fn from(m: ColorModule) -> Self {
        Module::Color(m)
    }
}

impl From<TextureAnimationModule> for Module {
    fn from(m: TextureAnimationModule) -> Self {
        Module::TextureAnimation(m)
    }
}
