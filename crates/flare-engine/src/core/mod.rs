pub mod curve;
pub mod math;
pub mod pool;
pub mod rng;
