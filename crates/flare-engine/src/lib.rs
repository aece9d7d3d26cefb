pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use api::config::{AllocationMode, EngineConfig, ErrorHandling, UpdateMode};
pub use api::error::{ParticleError, Result};
pub use api::types::{EmitterId, RegionId};
pub use core::curve::{Curve, CurveKey, SharedCurve};
pub use core::math::Bounds;
pub use core::pool::{BufferPool, PoolSnapshot};
pub use components::emitter_config::{ColorStart, EmitterConfig, ScalarStart, ScaleStart};
pub use components::particle::Particle;
pub use components::shapes::{
    CircleEmitterShape, CircleShape, EmissionDirection, EmitterShape, PointEmitterShape,
    PointShape, RectangleEmitterShape, RectangleShape, Shape,
};
pub use systems::area::{AreaEffect, AreaRegion, ForceEffect, ForceMode};
pub use systems::emitter::{BlendMode, Emitter, EmitterContext, Space};
pub use systems::emitter_set::EmitterSet;
pub use systems::engine::ParticleEngine;
pub use systems::modules::{
    AnimationMode, ColorChannel, ColorModule, Module, ModuleKind, ParticleModule,
    TextureAnimationModule, Transition, UpdateContext,
};
pub use renderer::{build_particle_buffer, ParticleInstance, ParticleRenderBuffer};

// Extensions
pub use extensions::{Easing, lerp, ease};
