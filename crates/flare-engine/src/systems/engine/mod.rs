//! The particle engine: registry of emitters and area regions, and the
//! frame scheduler that drives them.
//!
//! ```ignore
//! let mut engine = ParticleEngine::new(EngineConfig::default());
//! engine.initialize();
//! let id = engine.create_emitter(1024, CircleEmitterShape::new(16.0), Vec2::splat(64.0))?;
//! engine.emitter_mut(id)?.emit(64);
//!
//! // Once per frame:
//! engine.update(dt, &[camera_bounds])?;
//! engine.wait_for_completion()?;
//! engine.build_render_buffer(&mut buffer)?;
//! ```

mod world;

use crossbeam_channel::Receiver;
use glam::Vec2;
use std::sync::Arc;

use crate::api::config::{EngineConfig, UpdateMode};
use crate::api::error::{ParticleError, Result};
use crate::api::types::{EmitterId, RegionId};
use crate::components::shapes::EmitterShape;
use crate::core::math::Bounds;
use crate::core::pool::{BufferAllocator, BufferPool, PoolSnapshot};
use crate::renderer::{build_particle_buffer, ParticleRenderBuffer};
use crate::systems::area::AreaRegion;
use crate::systems::emitter::{Emitter, EmitterContext};

use world::World;

/// Owner of every emitter and area region, and the entry point for frames.
///
/// All operations fail with [`ParticleError::NotInitialized`] until
/// [`initialize`](Self::initialize) has been called. While an asynchronous
/// frame is running, `&self` reads fail with [`ParticleError::FrameInFlight`]
/// and `&mut self` operations first wait for the frame to finish.
pub struct ParticleEngine {
    config: EngineConfig,
    pool: Arc<BufferPool>,
    context: EmitterContext,
    initialized: bool,
    /// `None` while a background frame owns the world.
    world: Option<World>,
    in_flight: Option<Receiver<World>>,
    next_emitter: u32,
    next_region: u32,
}

impl ParticleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let pool = Arc::new(BufferPool::new(config.max_pooled_buffers));
        let allocator = BufferAllocator::new(config.allocation_mode, Arc::clone(&pool));
        let context = EmitterContext::new(config.error_handling, allocator, config.seed);
        Self {
            config,
            pool,
            context,
            initialized: false,
            world: Some(World::default()),
            in_flight: None,
            next_emitter: 1,
            next_region: 1,
        }
    }

    /// Enable the engine. Calling it again has no effect.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        log::info!(
            "particle engine initialized (allocation: {:?}, errors: {:?}, update: {:?})",
            self.config.allocation_mode,
            self.config.error_handling,
            self.config.update_mode
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Context for building emitters that inherit this engine's error policy
    /// and buffer pool.
    pub fn context(&self) -> Result<EmitterContext> {
        self.ensure_initialized()?;
        Ok(self.context.clone())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(ParticleError::NotInitialized)
        }
    }

    fn world(&self) -> Result<&World> {
        self.ensure_initialized()?;
        self.world.as_ref().ok_or(ParticleError::FrameInFlight)
    }

    fn world_mut(&mut self) -> Result<&mut World> {
        self.ensure_initialized()?;
        self.join()?;
        self.world.as_mut().ok_or(ParticleError::WorkerLost)
    }

    /// Take the world back from a background frame, if one is running.
    fn join(&mut self) -> Result<()> {
        if let Some(rx) = self.in_flight.take() {
            let world = rx.recv().map_err(|_| ParticleError::WorkerLost)?;
            self.world = Some(world);
        }
        Ok(())
    }

    // -- Emitters --

    /// Register an emitter and return its id.
    pub fn add_emitter(&mut self, mut emitter: Emitter) -> Result<EmitterId> {
        let id = EmitterId(self.next_emitter);
        let world = self.world_mut()?;
        emitter.id = id;
        emitter.attached_mut().clear();
        log::debug!("registered {id} with capacity {}", emitter.capacity());
        world.emitters.push(emitter);
        self.next_emitter += 1;
        Ok(id)
    }

    /// Build and register an emitter in one step.
    pub fn create_emitter(
        &mut self,
        capacity: usize,
        shape: impl Into<EmitterShape>,
        size: Vec2,
    ) -> Result<EmitterId> {
        let emitter = Emitter::new(&self.context()?, capacity, shape, size)?;
        self.add_emitter(emitter)
    }

    pub fn emitter(&self, id: EmitterId) -> Result<&Emitter> {
        self.world()?.emitter(id).ok_or(ParticleError::UnknownEmitter(id))
    }

    pub fn emitter_mut(&mut self, id: EmitterId) -> Result<&mut Emitter> {
        self.world_mut()?.emitter_mut(id).ok_or(ParticleError::UnknownEmitter(id))
    }

    /// Disabled emitters keep their particles but are not updated, cannot
    /// emit, are left out of the particle count, and are detached from every
    /// region. Disabling also cancels a pending [`dispose_after`](Self::dispose_after).
    pub fn set_emitter_enabled(&mut self, id: EmitterId, enabled: bool) -> Result<()> {
        let world = self.world_mut()?;
        let idx = world
            .emitters
            .iter()
            .position(|e| e.id == id)
            .ok_or(ParticleError::UnknownEmitter(id))?;
        world.emitters[idx].enabled = enabled;
        if !enabled {
            let World { emitters, regions, pending_destroy } = world;
            pending_destroy.retain(|(pending, _)| *pending != id);
            let emitter = &mut emitters[idx];
            for region_id in emitter.attached_mut().drain() {
                if let Some(region) = regions.iter_mut().find(|r| r.id == region_id) {
                    region.attached_mut().remove(&id);
                }
            }
        }
        Ok(())
    }

    /// Remove an emitter now. Its buffers go back to the pool.
    pub fn dispose_emitter(&mut self, id: EmitterId) -> Result<()> {
        self.world_mut()?
            .dispose(id)
            .map(drop)
            .ok_or(ParticleError::UnknownEmitter(id))
    }

    /// Dispose an emitter once `ttl` seconds of updates have passed. Without a
    /// ttl the emitter's longest particle lifetime is used, so particles
    /// already in flight can finish. Calling again resets the countdown.
    pub fn dispose_after(&mut self, id: EmitterId, ttl: Option<f32>) -> Result<()> {
        let world = self.world_mut()?;
        let emitter = world.emitter(id).ok_or(ParticleError::UnknownEmitter(id))?;
        let ttl = ttl.unwrap_or_else(|| emitter.config.max_life());
        match world.pending_destroy.iter_mut().find(|(pending, _)| *pending == id) {
            Some(entry) => entry.1 = ttl,
            None => world.pending_destroy.push((id, ttl)),
        }
        log::debug!("{id} will be disposed in {ttl}s");
        Ok(())
    }

    // -- Regions --

    pub fn add_region(&mut self, mut region: AreaRegion) -> Result<RegionId> {
        let id = RegionId(self.next_region);
        let world = self.world_mut()?;
        region.id = id;
        region.attached_mut().clear();
        log::debug!("registered {id}");
        world.regions.push(region);
        self.next_region += 1;
        Ok(id)
    }

    pub fn region(&self, id: RegionId) -> Result<&AreaRegion> {
        self.world()?.region(id).ok_or(ParticleError::UnknownRegion(id))
    }

    pub fn region_mut(&mut self, id: RegionId) -> Result<&mut AreaRegion> {
        self.world_mut()?.region_mut(id).ok_or(ParticleError::UnknownRegion(id))
    }

    /// Disabled regions affect nothing and are detached from every emitter.
    pub fn set_region_enabled(&mut self, id: RegionId, enabled: bool) -> Result<()> {
        let World { emitters, regions, .. } = self.world_mut()?;
        let region = regions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ParticleError::UnknownRegion(id))?;
        region.enabled = enabled;
        if !enabled {
            World::detach_region(region, emitters);
        }
        Ok(())
    }

    /// Unregister a region, detaching it from every emitter.
    pub fn remove_region(&mut self, id: RegionId) -> Result<AreaRegion> {
        let World { emitters, regions, .. } = self.world_mut()?;
        let idx = regions
            .iter()
            .position(|r| r.id == id)
            .ok_or(ParticleError::UnknownRegion(id))?;
        let mut region = regions.swap_remove(idx);
        World::detach_region(&mut region, emitters);
        log::debug!("removed {id}");
        Ok(region)
    }

    // -- Frames --

    /// Advance one frame with the configured update mode.
    ///
    /// `views` are the visible rectangles. Emitters outside all of them are
    /// cleared and skipped; an empty slice means everything is visible.
    pub fn update(&mut self, dt: f32, views: &[Bounds]) -> Result<()> {
        self.update_with_mode(dt, views, self.config.update_mode)
    }

    /// Advance one frame with an explicit update mode.
    pub fn update_with_mode(&mut self, dt: f32, views: &[Bounds], mode: UpdateMode) -> Result<()> {
        self.ensure_initialized()?;
        if self.in_flight.is_some() {
            log::warn!("update called while the previous frame is still running; waiting for it");
            self.join()?;
        }
        let mut world = self.world.take().ok_or(ParticleError::WorkerLost)?;
        match mode {
            UpdateMode::Synchronous => {
                world.step(dt, views, false);
                self.world = Some(world);
            }
            UpdateMode::ParallelSynchronous => {
                world.step(dt, views, true);
                self.world = Some(world);
            }
            UpdateMode::ParallelAsynchronous => {
                let (tx, rx) = crossbeam_channel::bounded(1);
                let views = views.to_vec();
                rayon::spawn(move || {
                    world.step(dt, &views, true);
                    // The receiver is gone only if the engine was dropped.
                    let _ = tx.send(world);
                });
                self.in_flight = Some(rx);
            }
        }
        Ok(())
    }

    /// Block until a running asynchronous frame finishes. No-op otherwise.
    pub fn wait_for_completion(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.join()
    }

    pub fn is_frame_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    // -- Queries --

    /// Live particles across all enabled emitters.
    pub fn particle_count(&self) -> Result<usize> {
        Ok(self.world()?.particle_count())
    }

    pub fn emitter_ids(&self) -> Result<Vec<EmitterId>> {
        Ok(self.world()?.emitters.iter().map(Emitter::id).collect())
    }

    pub fn region_ids(&self) -> Result<Vec<RegionId>> {
        Ok(self.world()?.regions.iter().map(AreaRegion::id).collect())
    }

    /// Emitters updated by the last frame.
    pub fn visible_emitters(&self) -> Result<Vec<EmitterId>> {
        Ok(self
            .world()?
            .emitters
            .iter()
            .filter(|e| e.enabled && e.visible)
            .map(Emitter::id)
            .collect())
    }

    pub fn pool_stats(&self) -> PoolSnapshot {
        self.pool.stats().snapshot()
    }

    /// Pack every visible emitter's particles for drawing.
    pub fn build_render_buffer(&self, buffer: &mut ParticleRenderBuffer) -> Result<()> {
        let world = self.world()?;
        build_particle_buffer(world.emitters.iter().filter(|e| e.enabled && e.visible), buffer);
        Ok(())
    }
}

impl Default for ParticleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::{AllocationMode, ErrorHandling};
    use crate::components::emitter_config::{EmitterConfig, ScalarStart};
    use crate::components::shapes::{CircleShape, PointEmitterShape};
    use crate::systems::area::ForceEffect;

    fn engine(mode: UpdateMode) -> ParticleEngine {
        let mut engine = ParticleEngine::new(EngineConfig::new().with_update_mode(mode));
        engine.initialize();
        engine
    }

    fn point(engine: &mut ParticleEngine, at: Vec2) -> EmitterId {
        let id = engine
            .create_emitter(16, PointEmitterShape::new(), Vec2::splat(10.0))
            .unwrap();
        engine.emitter_mut(id).unwrap().set_position(at);
        id
    }

    #[test]
    fn operations_fail_before_initialize() {
        let mut engine = ParticleEngine::default();
        assert!(matches!(engine.update(0.1, &[]), Err(ParticleError::NotInitialized)));
        assert!(matches!(engine.particle_count(), Err(ParticleError::NotInitialized)));
        assert!(matches!(engine.context(), Err(ParticleError::NotInitialized)));
        assert!(matches!(
            engine.create_emitter(4, PointEmitterShape::new(), Vec2::ONE),
            Err(ParticleError::NotInitialized)
        ));
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut engine = ParticleEngine::default();
        engine.initialize();
        engine.initialize();
        assert!(engine.is_initialized());
    }

    #[test]
    fn particle_count_sums_emitters() {
        let mut engine = engine(UpdateMode::Synchronous);
        let a = point(&mut engine, Vec2::ZERO);
        let b = point(&mut engine, Vec2::ZERO);
        engine.emitter_mut(a).unwrap().emit(3);
        engine.emitter_mut(b).unwrap().emit(4);
        assert_eq!(engine.particle_count().unwrap(), 7);
    }

    #[test]
    fn view_culling_clears_offscreen_emitters() {
        let mut engine = engine(UpdateMode::ParallelSynchronous);
        let far_a = point(&mut engine, Vec2::new(1000.0, 0.0));
        let far_b = point(&mut engine, Vec2::new(0.0, -1000.0));
        let near = point(&mut engine, Vec2::ZERO);
        for id in [far_a, far_b, near] {
            engine.emitter_mut(id).unwrap().emit(5);
        }
        engine.update(0.01, &[Bounds::new(-100.0, -100.0, 200.0, 200.0)]).unwrap();
        assert_eq!(engine.emitter(far_a).unwrap().active_count(), 0);
        assert_eq!(engine.emitter(far_b).unwrap().active_count(), 0);
        assert_eq!(engine.emitter(near).unwrap().active_count(), 5);
        assert_eq!(engine.visible_emitters().unwrap(), vec![near]);
    }

    #[test]
    fn dispose_after_waits_for_ttl() {
        let mut engine = engine(UpdateMode::Synchronous);
        let id = point(&mut engine, Vec2::ZERO);
        engine.dispose_after(id, Some(2.0)).unwrap();
        engine.update(1.0, &[]).unwrap();
        assert!(engine.emitter(id).is_ok());
        engine.update(1.0, &[]).unwrap();
        assert!(matches!(engine.emitter(id), Err(ParticleError::UnknownEmitter(_))));
    }

    #[test]
    fn dispose_after_defaults_to_max_life() {
        let mut engine = engine(UpdateMode::Synchronous);
        let id = point(&mut engine, Vec2::ZERO);
        engine.emitter_mut(id).unwrap().config =
            EmitterConfig::new().with_life(ScalarStart::Random { min: 1.0, max: 3.0 });
        engine.dispose_after(id, None).unwrap();
        engine.update(2.5, &[]).unwrap();
        assert!(engine.emitter(id).is_ok());
        engine.update(0.5, &[]).unwrap();
        assert!(engine.emitter(id).is_err());
    }

    #[test]
    fn disabling_cancels_pending_disposal() {
        let mut engine = engine(UpdateMode::Synchronous);
        let id = point(&mut engine, Vec2::ZERO);
        engine.dispose_after(id, Some(0.5)).unwrap();
        engine.set_emitter_enabled(id, false).unwrap();
        engine.set_emitter_enabled(id, true).unwrap();
        engine.update(1.0, &[]).unwrap();
        assert!(engine.emitter(id).is_ok());
    }

    #[test]
    fn disabled_emitters_leave_the_particle_count() {
        let mut engine = engine(UpdateMode::Synchronous);
        let a = point(&mut engine, Vec2::ZERO);
        let b = point(&mut engine, Vec2::ZERO);
        engine.emitter_mut(a).unwrap().emit(5);
        engine.emitter_mut(b).unwrap().emit(2);
        engine.set_emitter_enabled(a, false).unwrap();
        assert_eq!(engine.particle_count().unwrap(), 2);
        assert_eq!(engine.emitter(a).unwrap().active_count(), 5);
        engine.set_emitter_enabled(a, true).unwrap();
        assert_eq!(engine.particle_count().unwrap(), 7);
    }

    #[test]
    fn async_frame_blocks_reads_until_joined() {
        let mut engine = engine(UpdateMode::ParallelAsynchronous);
        let id = point(&mut engine, Vec2::ZERO);
        engine.emitter_mut(id).unwrap().emit(2);
        engine.update(0.01, &[]).unwrap();
        assert!(engine.is_frame_in_flight());
        assert!(matches!(engine.particle_count(), Err(ParticleError::FrameInFlight)));
        engine.wait_for_completion().unwrap();
        assert!(!engine.is_frame_in_flight());
        assert_eq!(engine.particle_count().unwrap(), 2);
    }

    #[test]
    fn back_to_back_async_frames_are_joined() {
        let mut engine = engine(UpdateMode::ParallelAsynchronous);
        let id = point(&mut engine, Vec2::ZERO);
        engine.emitter_mut(id).unwrap().config = EmitterConfig::new().with_life(ScalarStart::Fixed(10.0));
        engine.emitter_mut(id).unwrap().emit(1);
        for _ in 0..5 {
            engine.update(0.5, &[]).unwrap();
        }
        engine.wait_for_completion().unwrap();
        let p = engine.emitter(id).unwrap().active_particles()[0];
        assert!((p.time_alive - 2.5).abs() < 1e-5);
    }

    #[test]
    fn disabling_a_region_detaches_both_sides() {
        let mut engine = engine(UpdateMode::ParallelSynchronous);
        let e = point(&mut engine, Vec2::ZERO);
        let r = engine
            .add_region(AreaRegion::new(CircleShape::new(50.0), ForceEffect::attract(0.0, 50.0)))
            .unwrap();
        engine.update(0.01, &[]).unwrap();
        assert!(engine.region(r).unwrap().is_attached(e));
        assert!(engine.emitter(e).unwrap().is_attached(r));

        engine.set_region_enabled(r, false).unwrap();
        assert!(engine.region(r).unwrap().attached_emitters().is_empty());
        assert!(engine.emitter(e).unwrap().attached_regions().is_empty());

        engine.update(0.01, &[]).unwrap();
        assert!(engine.emitter(e).unwrap().attached_regions().is_empty());
    }

    #[test]
    fn disabling_an_emitter_detaches_both_sides() {
        let mut engine = engine(UpdateMode::Synchronous);
        let e = point(&mut engine, Vec2::ZERO);
        let r = engine
            .add_region(AreaRegion::new(CircleShape::new(50.0), ForceEffect::repel(0.0, 50.0)))
            .unwrap();
        engine.update(0.01, &[]).unwrap();
        engine.set_emitter_enabled(e, false).unwrap();
        assert!(!engine.region(r).unwrap().is_attached(e));
        assert!(!engine.emitter(e).unwrap().is_attached(r));
        assert_eq!(engine.emitter_mut(e).unwrap().emit(3), 0);
    }

    #[test]
    fn remove_region_detaches() {
        let mut engine = engine(UpdateMode::Synchronous);
        let e = point(&mut engine, Vec2::ZERO);
        let r = engine
            .add_region(AreaRegion::new(CircleShape::new(50.0), ForceEffect::attract(0.0, 50.0)))
            .unwrap();
        engine.update(0.01, &[]).unwrap();
        let region = engine.remove_region(r).unwrap();
        assert!(region.attached_emitters().is_empty());
        assert!(engine.emitter(e).unwrap().attached_regions().is_empty());
        assert!(matches!(engine.region(r), Err(ParticleError::UnknownRegion(_))));
    }

    #[test]
    fn disposal_returns_pooled_buffers() {
        let mut engine = ParticleEngine::new(EngineConfig::new().with_allocation_mode(AllocationMode::Pooled));
        engine.initialize();
        let id = point(&mut engine, Vec2::ZERO);
        assert!(engine.emitter(id).unwrap().is_pooled());
        engine.dispose_emitter(id).unwrap();
        assert_eq!(engine.pool_stats().returns, 2);
        assert!(matches!(engine.dispose_emitter(id), Err(ParticleError::UnknownEmitter(_))));

        point(&mut engine, Vec2::ZERO);
        assert_eq!(engine.pool_stats().hits, 2);
    }

    #[test]
    fn strict_engine_rejects_invalid_emitters() {
        let mut engine = ParticleEngine::new(EngineConfig::new().with_error_handling(ErrorHandling::Throw));
        engine.initialize();
        let err = engine
            .create_emitter(8, PointEmitterShape::new(), Vec2::new(-1.0, 4.0))
            .unwrap_err();
        assert!(matches!(err, ParticleError::InvalidValue { field: "size", .. }));
        assert!(engine.emitter_ids().unwrap().is_empty());
    }

    #[test]
    fn region_steers_particles_through_engine() {
        let mut engine = engine(UpdateMode::ParallelSynchronous);
        let shape = PointEmitterShape::new().with_heading(Vec2::X);
        let emitter = Emitter::new(&engine.context().unwrap(), 8, shape, Vec2::splat(10.0))
            .unwrap()
            .with_position(Vec2::new(0.0, 40.0))
            .with_config(EmitterConfig::new().with_speed(ScalarStart::Fixed(1.0)).with_life(ScalarStart::Fixed(5.0)));
        let e = engine.add_emitter(emitter).unwrap();
        engine
            .add_region(AreaRegion::new(CircleShape::new(100.0), ForceEffect::attract(0.0, 100.0)))
            .unwrap();
        engine.emitter_mut(e).unwrap().emit(1);
        engine.update(0.1, &[]).unwrap();
        let p = engine.emitter(e).unwrap().active_particles()[0];
        assert!(p.speed > 1.0);
        assert!(p.direction.y < 0.0, "pulled toward the region center");
    }
}
