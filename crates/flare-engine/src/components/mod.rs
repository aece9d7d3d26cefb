pub mod emitter_config;
pub mod particle;
pub mod shapes;
