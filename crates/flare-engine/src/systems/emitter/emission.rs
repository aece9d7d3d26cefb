use glam::{Vec2, Vec4};
use rayon::prelude::*;

use crate::components::emitter_config::EmitterConfig;
use crate::components::particle::Particle;
use crate::components::shapes::EmitterShape;
use crate::core::rng::Rng;

/// Total batch size above which emission is split across the thread pool.
/// Divided by the worker count, so more cores start splitting sooner.
pub(crate) const PARALLEL_EMISSION_BATCH: usize = 2048;

/// Read-only view of everything needed to initialize a particle.
pub(crate) struct Spawner<'a> {
    pub shape: &'a EmitterShape,
    pub config: &'a EmitterConfig,
    pub origin: Vec2,
    pub start_rect: Vec4,
}

impl Spawner<'_> {
    /// Fill one slot. `ratio` is the slot's position within the batch.
    pub fn spawn(&self, slot: &mut Particle, ratio: f32, rng: &mut Rng) {
        let (offset, heading) = self.shape.sample(ratio, rng);
        *slot = Particle {
            position: self.origin + offset,
            direction: heading,
            time_alive: 0.0,
            source_rect: self.start_rect,
            speed: self.config.sample_speed(rng),
            scale: self.config.sample_scale(rng),
            color: self.config.sample_color(rng),
            initial_life: self.config.sample_life(rng),
            mass: 0.0,
            sprite_rotation: 0.0,
        };
    }

    /// Fill `slots` on the calling thread.
    pub fn spawn_serial(&self, slots: &mut [Particle], rng: &mut Rng) {
        let count = slots.len() as f32;
        for (i, slot) in slots.iter_mut().enumerate() {
            self.spawn(slot, i as f32 / count, rng);
        }
    }

    /// Fill `slots` in disjoint chunks on the thread pool, one forked
    /// generator per chunk.
    pub fn spawn_parallel(&self, slots: &mut [Particle], rng: &mut Rng) {
        let count = slots.len();
        let chunk = count.div_ceil(rayon::current_num_threads()).max(1);
        let rngs: Vec<Rng> = (0..count.div_ceil(chunk)).map(|_| rng.fork()).collect();
        slots
            .par_chunks_mut(chunk)
            .zip(rngs)
            .enumerate()
            .for_each(|(c, (chunk_slots, mut rng))| {
                for (j, slot) in chunk_slots.iter_mut().enumerate() {
                    let i = c * chunk + j;
                    self.spawn(slot, i as f32 / count as f32, &mut rng);
                }
            });
    }
}

/// Whether a batch of `count` is big enough to split across threads.
pub(crate) fn should_parallelize(count: usize) -> bool {
    count > 1 && count >= PARALLEL_EMISSION_BATCH / rayon::current_num_threads().max(1)
}
