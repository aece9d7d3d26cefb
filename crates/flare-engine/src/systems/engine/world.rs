//! Simulation state owned by the engine, and the per-frame step over it.
//!
//! A frame runs four passes in order: visibility culling, region/emitter
//! attachment, per-emitter update, and the timed-disposal sweep. The
//! attachment pass finishes before any emitter updates because updates read
//! each emitter's attached-region set.

use rayon::prelude::*;

use crate::api::types::{EmitterId, RegionId};
use crate::core::math::Bounds;
use crate::systems::area::AreaRegion;
use crate::systems::emitter::Emitter;

#[derive(Debug, Default)]
pub(crate) struct World {
    pub emitters: Vec<Emitter>,
    pub regions: Vec<AreaRegion>,
    /// Emitters awaiting disposal and their remaining time to live.
    pub pending_destroy: Vec<(EmitterId, f32)>,
}

impl World {
    pub fn emitter(&self, id: EmitterId) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.id == id)
    }

    pub fn emitter_mut(&mut self, id: EmitterId) -> Option<&mut Emitter> {
        self.emitters.iter_mut().find(|e| e.id == id)
    }

    pub fn region(&self, id: RegionId) -> Option<&AreaRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut AreaRegion> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    /// Live particles of enabled emitters.
    pub fn particle_count(&self) -> usize {
        self.emitters
            .iter()
            .filter(|e| e.enabled)
            .map(Emitter::active_count)
            .sum()
    }

    /// Run one frame. `parallel` fans the attachment and update passes out
    /// over the rayon pool; both still complete before this returns.
    pub fn step(&mut self, dt: f32, views: &[Bounds], parallel: bool) {
        self.find_visible(views);
        if parallel {
            self.attach_parallel();
            self.update_parallel(dt);
        } else {
            self.attach_serial();
            self.update_serial(dt);
        }
        self.sweep(dt);
    }

    /// With no views every emitter is visible. Otherwise emitters outside all
    /// views are hidden and lose their particles.
    fn find_visible(&mut self, views: &[Bounds]) {
        for emitter in &mut self.emitters {
            let bounds = emitter.bounds();
            emitter.visible = views.is_empty() || views.iter().any(|v| bounds.intersects(v));
            if !emitter.visible {
                emitter.clear();
            }
        }
    }

    /// Attachment over every emitter, not just visible ones, so regions
    /// already act on emitters that are about to come into view.
    fn attach_serial(&mut self) {
        let emitters = &self.emitters;
        for region in &mut self.regions {
            reconcile(region, emitters);
        }
    }

    fn attach_parallel(&mut self) {
        let emitters = &self.emitters;
        self.regions
            .par_iter_mut()
            .for_each(|region| reconcile(region, emitters));
    }

    fn update_serial(&mut self, dt: f32) {
        let regions = &self.regions;
        for emitter in self.emitters.iter_mut().filter(|e| e.enabled && e.visible) {
            emitter.update(dt, regions);
        }
    }

    fn update_parallel(&mut self, dt: f32) {
        let regions = &self.regions;
        self.emitters
            .par_iter_mut()
            .filter(|e| e.enabled && e.visible)
            .for_each(|emitter| emitter.update(dt, regions));
    }

    /// Count down timed disposals and dispose the ones that ran out.
    fn sweep(&mut self, dt: f32) {
        if self.pending_destroy.is_empty() {
            return;
        }
        let mut expired = Vec::new();
        self.pending_destroy.retain_mut(|(id, ttl)| {
            *ttl -= dt;
            if *ttl <= 0.0 {
                expired.push(*id);
                false
            } else {
                true
            }
        });
        for id in expired {
            self.dispose(id);
        }
    }

    /// Remove an emitter and every trace of it. Dropping the emitter hands
    /// pooled buffers back.
    pub fn dispose(&mut self, id: EmitterId) -> Option<Emitter> {
        let idx = self.emitters.iter().position(|e| e.id == id)?;
        let mut emitter = self.emitters.swap_remove(idx);
        self.detach_emitter(&mut emitter);
        self.pending_destroy.retain(|(pending, _)| *pending != id);
        log::debug!("disposed {id}");
        Some(emitter)
    }

    /// Drop `emitter` from every region and clear its own attached set.
    pub fn detach_emitter(&mut self, emitter: &mut Emitter) {
        let id = emitter.id;
        for region_id in emitter.attached_mut().drain() {
            if let Some(region) = self.regions.iter_mut().find(|r| r.id == region_id) {
                region.attached_mut().remove(&id);
            }
        }
    }

    /// Drop `region` from every emitter and clear its own attached set.
    pub fn detach_region(region: &mut AreaRegion, emitters: &mut [Emitter]) {
        let id = region.id;
        for emitter_id in region.attached_mut().drain() {
            if let Some(emitter) = emitters.iter_mut().find(|e| e.id == emitter_id) {
                emitter.attached_mut().remove(&id);
            }
        }
    }
}

/// Make `region` and every emitter agree on whether they overlap.
///
/// The region's own set is reached through `&mut`; emitter sets are shared
/// with other regions reconciling concurrently, so each is locked.
fn reconcile(region: &mut AreaRegion, emitters: &[Emitter]) {
    let region_id = region.id;
    let enabled = region.enabled;
    let shape = *region.shape();
    let attached = region.attached_mut();
    for emitter in emitters {
        let overlaps = enabled && emitter.enabled && shape.intersects(&emitter.bounds());
        if overlaps {
            attached.insert(emitter.id);
            emitter.lock_attached().insert(region_id);
        } else if attached.remove(&emitter.id) {
            emitter.lock_attached().remove(&region_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::shapes::{CircleShape, PointEmitterShape};
    use crate::systems::area::ForceEffect;
    use crate::systems::emitter::EmitterContext;
    use glam::Vec2;

    fn world_with(positions: &[Vec2]) -> World {
        let ctx = EmitterContext::default();
        let mut world = World::default();
        for (i, pos) in positions.iter().enumerate() {
            let mut e = Emitter::new(&ctx, 16, PointEmitterShape::new(), Vec2::splat(10.0))
                .unwrap()
                .with_position(*pos);
            e.id = EmitterId(i as u32 + 1);
            world.emitters.push(e);
        }
        world
    }

    fn add_region(world: &mut World, id: u32, center: Vec2) {
        let mut region = AreaRegion::new(CircleShape::new(20.0), ForceEffect::attract(0.0, 20.0))
            .with_position(center);
        region.id = RegionId(id);
        world.regions.push(region);
    }

    fn assert_symmetric(world: &World) {
        for region in &world.regions {
            for emitter in &world.emitters {
                assert_eq!(
                    region.is_attached(emitter.id),
                    emitter.is_attached(region.id),
                    "{} / {}",
                    region.id,
                    emitter.id
                );
            }
        }
    }

    #[test]
    fn attach_pass_links_overlapping_pairs() {
        let mut world = world_with(&[Vec2::ZERO, Vec2::new(500.0, 0.0)]);
        add_region(&mut world, 1, Vec2::ZERO);
        world.step(0.016, &[], false);
        assert_eq!(world.regions[0].attached_emitters(), vec![EmitterId(1)]);
        assert_eq!(world.emitters[0].attached_regions(), vec![RegionId(1)]);
        assert!(world.emitters[1].attached_regions().is_empty());
        assert_symmetric(&world);
    }

    #[test]
    fn moving_away_detaches() {
        let mut world = world_with(&[Vec2::ZERO]);
        add_region(&mut world, 1, Vec2::ZERO);
        world.step(0.016, &[], true);
        assert!(world.emitters[0].is_attached(RegionId(1)));
        world.emitters[0].set_position(Vec2::new(1000.0, 0.0));
        world.step(0.016, &[], true);
        assert!(!world.emitters[0].is_attached(RegionId(1)));
        assert_symmetric(&world);
    }

    #[test]
    fn views_cull_and_clear() {
        let mut world = world_with(&[Vec2::new(500.0, 500.0), Vec2::new(-500.0, 0.0), Vec2::ZERO]);
        for e in &mut world.emitters {
            e.emit(5);
        }
        let view = Bounds::new(-50.0, -50.0, 100.0, 100.0);
        world.step(0.016, &[view], false);
        assert_eq!(world.emitters[0].active_count(), 0);
        assert_eq!(world.emitters[1].active_count(), 0);
        assert_eq!(world.emitters[2].active_count(), 5);
        assert!(!world.emitters[0].is_visible());
        assert!(world.emitters[2].is_visible());
    }

    #[test]
    fn sweep_disposes_when_ttl_runs_out() {
        let mut world = world_with(&[Vec2::ZERO]);
        world.pending_destroy.push((EmitterId(1), 2.0));
        world.step(1.0, &[], false);
        assert_eq!(world.emitters.len(), 1);
        world.step(1.0, &[], false);
        assert!(world.emitters.is_empty());
        assert!(world.pending_destroy.is_empty());
    }

    #[test]
    fn dispose_detaches_from_regions() {
        let mut world = world_with(&[Vec2::ZERO]);
        add_region(&mut world, 7, Vec2::ZERO);
        world.step(0.016, &[], false);
        assert!(world.regions[0].is_attached(EmitterId(1)));
        assert!(world.dispose(EmitterId(1)).is_some());
        assert!(world.regions[0].attached_emitters().is_empty());
        assert!(world.dispose(EmitterId(1)).is_none());
    }
}
