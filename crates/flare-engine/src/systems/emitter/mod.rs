//! Emitters: a fixed-capacity particle buffer plus the shape, start-value
//! configuration and behavior modules that fill and advance it.
//!
//! The buffer is split into an active prefix `[0, active_count)` and a free
//! tail. Expired particles are swap-removed, so slot order is not stable
//! across updates.

mod emission;

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::config::ErrorHandling;
use crate::api::error::{ParticleError, Result};
use crate::api::types::{EmitterId, RegionId};
use crate::components::emitter_config::EmitterConfig;
use crate::components::particle::Particle;
use crate::components::shapes::EmitterShape;
use crate::core::math::Bounds;
use crate::core::pool::{BufferAllocator, ParticleBuffer};
use crate::core::rng::Rng;
use crate::systems::area::AreaRegion;
use crate::systems::modules::{Module, ModuleKind, ParticleModule, UpdateContext};

use emission::{should_parallelize, Spawner};

/// Coordinate space particles live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    /// Particles stay where they were emitted when the emitter moves.
    #[default]
    World,
    /// Particles move rigidly with the emitter.
    Local,
}

/// How the renderer should blend this emitter's particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Subtractive,
}

/// Settings an emitter inherits from the engine that creates it.
#[derive(Debug, Clone)]
pub struct EmitterContext {
    pub error_handling: ErrorHandling,
    pub allocator: BufferAllocator,
    seeds: Arc<AtomicU64>,
}

impl EmitterContext {
    pub fn new(error_handling: ErrorHandling, allocator: BufferAllocator, seed: u64) -> Self {
        Self {
            error_handling,
            allocator,
            seeds: Arc::new(AtomicU64::new(seed)),
        }
    }

    /// Seed for the next emitter. Every emitter created from one context gets
    /// a distinct, reproducible stream.
    fn next_seed(&self) -> u64 {
        self.seeds.fetch_add(0x9E37_79B9_7F4A_7C15, Ordering::Relaxed)
    }
}

impl Default for EmitterContext {
    fn default() -> Self {
        Self::new(ErrorHandling::Stability, BufferAllocator::dedicated(), 42)
    }
}

/// Accept `value` if `valid`, otherwise clamp or reject it per `handling`.
fn validate<T: Copy + Debug>(
    handling: ErrorHandling,
    field: &'static str,
    value: T,
    valid: bool,
    reason: &str,
    clamp: impl FnOnce(T) -> T,
) -> Result<T> {
    if valid {
        return Ok(value);
    }
    match handling {
        ErrorHandling::Throw => Err(ParticleError::invalid(field, reason)),
        ErrorHandling::Stability => {
            let clamped = clamp(value);
            log::debug!("clamped emitter {field} from {value:?} to {clamped:?}");
            Ok(clamped)
        }
    }
}

fn valid_size(size: Vec2) -> bool {
    size.x > 0.0 && size.y > 0.0
}

/// Owner of one particle buffer.
#[derive(Debug)]
pub struct Emitter {
    pub(crate) id: EmitterId,
    shape: EmitterShape,
    pub space: Space,
    pub blend_mode: BlendMode,
    /// Split large emission batches across the thread pool.
    pub parallel_emission: bool,
    pub config: EmitterConfig,
    size: Vec2,
    texture_size: Vec2,
    start_rect: Vec4,
    bounds: Bounds,
    buffer: ParticleBuffer,
    num_active: usize,
    modules: Vec<Module>,
    attached: Mutex<HashSet<RegionId>>,
    pub(crate) enabled: bool,
    emission_enabled: bool,
    pub(crate) visible: bool,
    /// Position at the last update, or wherever the emitter sat while empty.
    last_position: Vec2,
    context: EmitterContext,
    rng: Rng,
}

impl Emitter {
    /// Create an emitter of `capacity` particles. `size` is the culling box
    /// around the shape's center.
    pub fn new(
        context: &EmitterContext,
        capacity: usize,
        shape: impl Into<EmitterShape>,
        size: Vec2,
    ) -> Result<Self> {
        let handling = context.error_handling;
        let capacity = validate(handling, "capacity", capacity, capacity > 0, "must be at least one", |_| 1)?;
        let size = validate(handling, "size", size, valid_size(size), "must be greater than zero on both axes", |s| {
            s.max(Vec2::ONE)
        })?;
        Ok(Self::build(context, capacity, shape.into(), size))
    }

    fn build(context: &EmitterContext, capacity: usize, shape: EmitterShape, size: Vec2) -> Self {
        Self {
            id: EmitterId(0),
            bounds: Bounds::from_center(shape.center(), size),
            shape,
            space: Space::World,
            blend_mode: BlendMode::Alpha,
            parallel_emission: true,
            config: EmitterConfig::default(),
            size,
            texture_size: Vec2::splat(128.0),
            start_rect: Vec4::new(0.0, 0.0, 128.0, 128.0),
            buffer: context.allocator.allocate(capacity),
            num_active: 0,
            modules: Vec::new(),
            attached: Mutex::new(HashSet::new()),
            enabled: true,
            emission_enabled: true,
            visible: true,
            last_position: shape.center(),
            rng: Rng::new(context.next_seed()),
            context: context.clone(),
        }
    }

    // -- Builder pattern --

    pub fn with_config(mut self, config: EmitterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_module(mut self, module: impl Into<Module>) -> Self {
        self.add_module(module);
        self
    }

    // -- Accessors --

    /// Id assigned on registration. `EmitterId(0)` until then.
    pub fn id(&self) -> EmitterId {
        self.id
    }

    pub fn shape(&self) -> &EmitterShape {
        &self.shape
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.num_active
    }

    /// Live particles, in unspecified order.
    pub fn active_particles(&self) -> &[Particle] {
        &self.buffer.particles[..self.num_active]
    }

    pub fn active_particles_mut(&mut self) -> &mut [Particle] {
        &mut self.buffer.particles[..self.num_active]
    }

    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.active_particles().get(index)
    }

    pub fn is_pooled(&self) -> bool {
        self.buffer.is_pooled()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the last frame found this emitter inside a view.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn emission_enabled(&self) -> bool {
        self.emission_enabled
    }

    pub fn set_emission_enabled(&mut self, enabled: bool) {
        self.emission_enabled = enabled;
    }

    pub fn position(&self) -> Vec2 {
        self.shape.center()
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.shape.set_center(position);
        self.bounds = Bounds::from_center(position, self.size);
        if self.num_active == 0 {
            self.last_position = position;
        }
    }

    pub fn rotation(&self) -> f32 {
        self.shape.rotation()
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.shape.set_rotation(rotation);
    }

    /// Culling box centered on the emitter.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) -> Result<()> {
        let size = validate(
            self.context.error_handling,
            "size",
            size,
            valid_size(size),
            "must be greater than zero on both axes",
            |s| s.max(Vec2::ONE),
        )?;
        self.size = size;
        self.bounds = Bounds::from_center(self.position(), size);
        Ok(())
    }

    pub fn texture_size(&self) -> Vec2 {
        self.texture_size
    }

    pub fn set_texture_size(&mut self, size: Vec2) -> Result<()> {
        self.texture_size = validate(
            self.context.error_handling,
            "texture_size",
            size,
            valid_size(size),
            "must be greater than zero on both axes",
            |s| s.max(Vec2::ONE),
        )?;
        Ok(())
    }

    /// Source rectangle (x, y, width, height) new particles start with.
    pub fn start_rect(&self) -> Vec4 {
        self.start_rect
    }

    pub fn set_start_rect(&mut self, rect: Vec4) -> Result<()> {
        let valid = rect.z > 0.0
            && rect.w > 0.0
            && (0.0..=rect.z).contains(&rect.x)
            && (0.0..=rect.w).contains(&rect.y);
        self.start_rect = validate(
            self.context.error_handling,
            "start_rect",
            rect,
            valid,
            "not a valid source rectangle",
            |r| {
                let (w, h) = (r.z.max(1.0), r.w.max(1.0));
                Vec4::new(r.x.clamp(0.0, w), r.y.clamp(0.0, h), w, h)
            },
        )?;
        Ok(())
    }

    // -- Particle lifecycle --

    /// Activate up to `count` particles (at least one). Returns how many were
    /// emitted: zero if the emitter is disabled, emission is off, or the
    /// buffer is full.
    pub fn emit(&mut self, count: usize) -> usize {
        if !self.enabled || !self.emission_enabled {
            return 0;
        }
        let free = self.capacity() - self.num_active;
        if free == 0 {
            return 0;
        }
        let count = count.clamp(1, free);
        let start = self.num_active;

        let spawner = Spawner {
            shape: &self.shape,
            config: &self.config,
            origin: self.shape.center(),
            start_rect: self.start_rect,
        };
        let slots = &mut self.buffer.particles[start..start + count];
        if self.parallel_emission && should_parallelize(count) {
            spawner.spawn_parallel(slots, &mut self.rng);
        } else {
            spawner.spawn_serial(slots, &mut self.rng);
        }

        self.buffer.new_indices.extend(start..start + count);
        self.num_active += count;
        count
    }

    /// Advance one frame.
    ///
    /// Stages, in order: activation hooks for newly emitted particles, aging
    /// and removal of expired particles, enabled modules, attached regions
    /// from `regions`, then position integration.
    pub fn update(&mut self, dt: f32, regions: &[AreaRegion]) {
        let position = self.position();
        let last_position = self.last_position;
        self.bounds = Bounds::from_center(position, self.size);

        if !self.buffer.new_indices.is_empty() {
            for module in &mut self.modules {
                module.on_activated(&self.buffer.particles, &self.buffer.new_indices, &mut self.rng);
            }
            self.buffer.new_indices.clear();
        }

        // A removed slot is refilled from the tail, so only advance past
        // slots that survived.
        let mut i = 0;
        while i < self.num_active {
            let particle = &mut self.buffer.particles[i];
            particle.time_alive += dt;
            if particle.is_expired() {
                self.remove_at(i);
            } else {
                i += 1;
            }
        }

        let ctx = UpdateContext::new(dt, self.texture_size);
        let active = &mut self.buffer.particles[..self.num_active];
        for module in self.modules.iter_mut().filter(|m| m.is_enabled()) {
            module.on_update(&ctx, active);
        }

        let attached = self.attached.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !attached.is_empty() {
            for region in regions.iter().filter(|r| attached.contains(&r.id)) {
                region.process(dt, active);
            }
        }

        let shift = match self.space {
            Space::World => Vec2::ZERO,
            Space::Local => position - last_position,
        };
        for particle in active.iter_mut() {
            particle.position += particle.velocity() * dt + shift;
        }
        self.last_position = position;
    }

    /// Remove the active particle at `index`.
    pub fn deactivate(&mut self, index: usize) -> Result<()> {
        if index >= self.num_active {
            return Err(ParticleError::IndexOutOfRange {
                index,
                active: self.num_active,
            });
        }
        self.remove_at(index);
        Ok(())
    }

    /// Swap-remove: the last active particle moves into `index`.
    fn remove_at(&mut self, index: usize) {
        self.num_active -= 1;
        let last = self.num_active;
        let pending = &mut self.buffer.new_indices;
        if !pending.is_empty() {
            pending.retain(|&slot| slot != index);
        }
        if index == last {
            return;
        }
        self.buffer.particles.swap(index, last);
        for slot in pending.iter_mut().filter(|slot| **slot == last) {
            *slot = index;
        }
        for module in &mut self.modules {
            module.on_relocated(last, index);
        }
    }

    /// Drop every active particle without running any hooks.
    pub fn clear(&mut self) {
        self.num_active = 0;
        self.buffer.new_indices.clear();
    }

    // -- Modules --

    /// Append a module. Its per-slot state is sized to this emitter.
    pub fn add_module(&mut self, module: impl Into<Module>) {
        let mut module = module.into();
        module.initialize(self.capacity());
        self.modules.push(module);
    }

    pub fn add_modules<I, M>(&mut self, modules: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<Module>,
    {
        for module in modules {
            self.add_module(module);
        }
    }

    /// Remove the most recently added module of `kind`.
    pub fn remove_module(&mut self, kind: ModuleKind) -> bool {
        match self.modules.iter().rposition(|m| m.kind() == kind) {
            Some(idx) => {
                self.modules.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every module of `kind`.
    pub fn remove_modules(&mut self, kind: ModuleKind) -> bool {
        let before = self.modules.len();
        self.modules.retain(|m| m.kind() != kind);
        self.modules.len() != before
    }

    /// First module of `kind`.
    pub fn module(&self, kind: ModuleKind) -> Option<&Module> {
        self.modules.iter().find(|m| m.kind() == kind)
    }

    pub fn module_mut(&mut self, kind: ModuleKind) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.kind() == kind)
    }

    pub fn modules_of(&self, kind: ModuleKind) -> impl Iterator<Item = &Module> + '_ {
        self.modules.iter().filter(move |m| m.kind() == kind)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    // -- Region attachment --

    /// Regions currently affecting this emitter.
    pub fn attached_regions(&self) -> Vec<RegionId> {
        let mut ids: Vec<RegionId> = self.lock_attached().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_attached(&self, region: RegionId) -> bool {
        self.lock_attached().contains(&region)
    }

    pub(crate) fn lock_attached(&self) -> MutexGuard<'_, HashSet<RegionId>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn attached_mut(&mut self) -> &mut HashSet<RegionId> {
        self.attached.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// New emitter with the same settings and copies of every module, backed
    /// by a freshly allocated buffer. Particles and attachments are not copied.
    pub fn deep_copy(&self) -> Emitter {
        let mut copy = Self::build(&self.context, self.capacity(), self.shape, self.size);
        copy.space = self.space;
        copy.blend_mode = self.blend_mode;
        copy.parallel_emission = self.parallel_emission;
        copy.config = self.config.deep_copy();
        copy.texture_size = self.texture_size;
        copy.start_rect = self.start_rect;
        copy.emission_enabled = self.emission_enabled;
        copy.add_modules(self.modules.iter().map(Module::deep_copy));
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::AllocationMode;
    use crate::components::emitter_config::ScalarStart;
    use crate::components::shapes::{CircleShape, PointEmitterShape};
    use crate::core::pool::BufferPool;
    use crate::systems::area::ForceEffect;
    use crate::systems::modules::{ColorModule, TextureAnimationModule, Transition};

    fn emitter(capacity: usize) -> Emitter {
        Emitter::new(&EmitterContext::default(), capacity, PointEmitterShape::new(), Vec2::splat(64.0)).unwrap()
    }

    fn strict() -> EmitterContext {
        EmitterContext::new(ErrorHandling::Throw, BufferAllocator::dedicated(), 1)
    }

    fn eastward(capacity: usize, speed: f32) -> Emitter {
        let shape = PointEmitterShape::new().with_heading(Vec2::X);
        Emitter::new(&EmitterContext::default(), capacity, shape, Vec2::splat(64.0))
            .unwrap()
            .with_config(EmitterConfig::new().with_speed(ScalarStart::Fixed(speed)).with_life(ScalarStart::Fixed(10.0)))
    }

    #[test]
    fn emit_clamps_to_capacity() {
        let mut e = emitter(4);
        assert_eq!(e.emit(6), 4);
        assert_eq!(e.active_count(), 4);
        assert_eq!(e.emit(1), 0);
        assert_eq!(e.active_count(), 4);
    }

    #[test]
    fn emit_zero_still_emits_one() {
        let mut e = emitter(4);
        assert_eq!(e.emit(0), 1);
    }

    #[test]
    fn disabled_emission_is_noop() {
        let mut e = emitter(4);
        e.set_emission_enabled(false);
        assert_eq!(e.emit(2), 0);
        e.set_emission_enabled(true);
        e.enabled = false;
        assert_eq!(e.emit(2), 0);
    }

    #[test]
    fn particle_moves_along_heading() {
        let mut e = eastward(10, 5.0);
        e.emit(1);
        e.update(1.0, &[]);
        assert_eq!(e.active_count(), 1);
        assert_eq!(e.active_particles()[0].position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn expired_particles_are_removed_same_frame() {
        let mut e = emitter(8).with_config(EmitterConfig::new().with_life(ScalarStart::Fixed(1.0)));
        e.emit(3);
        e.update(0.5, &[]);
        assert_eq!(e.active_count(), 3);
        e.update(0.5, &[]);
        assert_eq!(e.active_count(), 0);
    }

    #[test]
    fn swap_remove_keeps_all_survivors() {
        let mut e = emitter(8);
        e.emit(4);
        // Slots 0 and 3 die, 1 and 2 survive.
        let lives = [0.5, 5.0, 6.0, 0.5];
        for (p, life) in e.active_particles_mut().iter_mut().zip(lives) {
            p.initial_life = life;
        }
        e.update(1.0, &[]);
        let mut remaining: Vec<f32> = e.active_particles().iter().map(|p| p.initial_life).collect();
        remaining.sort_by(f32::total_cmp);
        assert_eq!(remaining, vec![5.0, 6.0]);
        assert!(e.active_particles().iter().all(|p| p.time_alive == 1.0));
    }

    #[test]
    fn deactivate_is_bounds_checked() {
        let mut e = emitter(4);
        e.emit(2);
        let err = e.deactivate(2).unwrap_err();
        assert!(matches!(err, ParticleError::IndexOutOfRange { index: 2, active: 2 }));
        e.deactivate(0).unwrap();
        assert_eq!(e.active_count(), 1);
    }

    #[test]
    fn deactivate_fixes_pending_activation() {
        let mut e = emitter(4).with_module(ColorModule::alpha(Transition::Lerp { end: 0.0 }));
        e.emit(3);
        e.deactivate(0).unwrap();
        assert_eq!(e.buffer.new_indices, vec![1, 0]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut e = emitter(4);
        e.emit(3);
        e.clear();
        assert_eq!(e.active_count(), 0);
        assert!(e.buffer.new_indices.is_empty());
    }

    #[test]
    fn local_space_follows_emitter() {
        let mut local = eastward(4, 0.0).with_space(Space::Local);
        let mut world = eastward(4, 0.0);
        for e in [&mut local, &mut world] {
            e.emit(1);
            e.update(0.1, &[]);
            e.set_position(Vec2::new(3.0, -2.0));
            e.update(0.1, &[]);
        }
        assert_eq!(local.active_particles()[0].position, Vec2::new(3.0, -2.0));
        assert_eq!(world.active_particles()[0].position, Vec2::ZERO);
    }

    #[test]
    fn local_space_carries_moves_before_first_update() {
        let mut e = eastward(4, 0.0).with_space(Space::Local);
        e.emit(1);
        e.set_position(Vec2::new(10.0, 0.0));
        e.update(0.1, &[]);
        assert_eq!(e.active_particles()[0].position, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn moving_an_empty_local_emitter_shifts_nothing() {
        let mut e = eastward(4, 0.0).with_space(Space::Local).with_position(Vec2::new(50.0, 0.0));
        e.emit(1);
        e.update(0.1, &[]);
        assert_eq!(e.active_particles()[0].position, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn random_end_endpoints_through_update() {
        let mut e = emitter(2)
            .with_config(EmitterConfig::new().with_life(ScalarStart::Fixed(2.0)))
            .with_module(ColorModule::alpha(Transition::random_lerp(0.2, 0.4)));
        e.emit(1);
        e.update(0.0, &[]);
        assert!((e.active_particles()[0].color.w - 1.0).abs() < 1e-5, "starts at the emitted alpha");
        let target = match &e.modules()[0] {
            Module::Color(m) => m.target_of(0).unwrap(),
            _ => unreachable!(),
        };
        e.update(1.999_99, &[]);
        assert!((e.active_particles()[0].color.w - target).abs() < 1e-3);
    }

    #[test]
    fn module_state_follows_relocated_particle() {
        let mut e = emitter(4)
            .with_config(EmitterConfig::new().with_life(ScalarStart::Fixed(10.0)))
            .with_module(ColorModule::hue(Transition::Lerp { end: 0.0 }));
        e.emit(2);
        e.active_particles_mut()[1].color.x = 100.0;
        e.update(0.0, &[]);
        e.deactivate(0).unwrap();
        // The particle that started at hue 100 now sits in slot 0.
        e.update(5.0, &[]);
        assert!((e.active_particles()[0].color.x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn attached_region_is_applied() {
        let mut e = eastward(4, 1.0);
        let mut region = AreaRegion::new(CircleShape::new(100.0), ForceEffect::attract(0.0, 100.0));
        region.id = RegionId(1);
        e.attached_mut().insert(RegionId(1));
        e.set_position(Vec2::new(0.0, 50.0));
        e.emit(1);
        e.update(0.1, std::slice::from_ref(&region));
        assert!(e.active_particles()[0].speed > 1.0);
        assert_eq!(e.attached_regions(), vec![RegionId(1)]);
    }

    #[test]
    fn strict_mode_rejects_bad_size() {
        let mut e = Emitter::new(&strict(), 4, PointEmitterShape::new(), Vec2::splat(10.0)).unwrap();
        let err = e.set_size(Vec2::new(0.0, 5.0)).unwrap_err();
        assert!(matches!(err, ParticleError::InvalidValue { field: "size", .. }));
        assert_eq!(e.size(), Vec2::splat(10.0));
        assert!(Emitter::new(&strict(), 4, PointEmitterShape::new(), Vec2::ZERO).is_err());
    }

    #[test]
    fn stability_mode_clamps() {
        let mut e = emitter(4);
        e.set_size(Vec2::new(-3.0, 5.0)).unwrap();
        assert_eq!(e.size(), Vec2::new(1.0, 5.0));
        e.set_texture_size(Vec2::new(0.0, 0.0)).unwrap();
        assert_eq!(e.texture_size(), Vec2::ONE);
        e.set_start_rect(Vec4::new(50.0, -2.0, 32.0, 0.0)).unwrap();
        assert_eq!(e.start_rect(), Vec4::new(32.0, 0.0, 32.0, 1.0));
    }

    #[test]
    fn bounds_track_position() {
        let mut e = emitter(1);
        e.set_position(Vec2::new(100.0, 100.0));
        assert_eq!(e.bounds(), Bounds::new(68.0, 68.0, 64.0, 64.0));
    }

    #[test]
    fn module_queries_by_kind() {
        let mut e = emitter(4);
        e.add_modules([
            Module::from(ColorModule::alpha(Transition::Lerp { end: 0.0 })),
            Module::from(TextureAnimationModule::over_lifetime(2, 2)),
            Module::from(ColorModule::alpha(Transition::Lerp { end: 1.0 })),
        ]);
        assert_eq!(e.modules_of(ModuleKind::Alpha).count(), 2);
        assert!(e.module(ModuleKind::Hue).is_none());
        assert!(e.remove_module(ModuleKind::Alpha));
        assert_eq!(e.modules().len(), 2);
        assert!(e.remove_modules(ModuleKind::TextureAnimation));
        assert!(!e.remove_modules(ModuleKind::TextureAnimation));
        assert_eq!(e.modules().len(), 1);
    }

    #[test]
    fn deep_copy_gets_fresh_buffer() {
        let pool = Arc::new(BufferPool::new(8));
        let ctx = EmitterContext::new(
            ErrorHandling::Stability,
            BufferAllocator::new(AllocationMode::Pooled, pool),
            3,
        );
        let mut e = Emitter::new(&ctx, 16, PointEmitterShape::new(), Vec2::splat(8.0))
            .unwrap()
            .with_module(ColorModule::alpha(Transition::Lerp { end: 0.0 }));
        e.emit(5);
        let copy = e.deep_copy();
        assert_eq!(copy.capacity(), 16);
        assert_eq!(copy.active_count(), 0);
        assert_eq!(copy.modules().len(), 1);
        assert!(copy.is_pooled());
    }

    #[test]
    fn large_batches_fill_every_slot() {
        use emission::PARALLEL_EMISSION_BATCH;
        let mut e = emitter(PARALLEL_EMISSION_BATCH * 2);
        assert_eq!(e.emit(PARALLEL_EMISSION_BATCH * 2), PARALLEL_EMISSION_BATCH * 2);
        assert!(e.active_particles().iter().all(|p| p.time_alive == 0.0));
        assert_eq!(e.buffer.new_indices.len(), PARALLEL_EMISSION_BATCH * 2);
    }
}
