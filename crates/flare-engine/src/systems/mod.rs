pub mod area;
pub mod emitter;
pub mod emitter_set;
pub mod engine;
pub mod modules;
