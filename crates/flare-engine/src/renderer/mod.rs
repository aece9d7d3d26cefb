pub mod build;
pub mod instance;

pub use build::build_particle_buffer;
pub use instance::{ParticleInstance, ParticleRenderBuffer};
