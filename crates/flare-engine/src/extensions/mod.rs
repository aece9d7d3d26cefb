// extensions/mod.rs
//
// Helpers shared by curves and modules that are not tied to the particle model.

pub mod easing;

pub use easing::{Easing, lerp, ease};
