//! Area-effect regions: shape-bound force fields applied to every particle of
//! the emitters they overlap.

mod force;

pub use force::{ForceEffect, ForceMode};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::api::types::{EmitterId, RegionId};
use crate::components::particle::Particle;
use crate::components::shapes::Shape;

/// What a region does to the particles inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AreaEffect {
    Force(ForceEffect),
}

impl From<ForceEffect> for AreaEffect {
    fn from(effect: ForceEffect) -> Self {
        AreaEffect::Force(effect)
    }
}

/// Shape-bound effect plus the set of emitters it currently overlaps.
///
/// The attached set is maintained by the engine's attachment pass and always
/// mirrors the regions recorded on the emitters.
#[derive(Debug)]
pub struct AreaRegion {
    pub(crate) id: RegionId,
    shape: Shape,
    pub effect: AreaEffect,
    pub(crate) enabled: bool,
    pub(crate) attached: Mutex<HashSet<EmitterId>>,
}

impl AreaRegion {
    pub fn new(shape: impl Into<Shape>, effect: impl Into<AreaEffect>) -> Self {
        Self {
            id: RegionId(0),
            shape: shape.into(),
            effect: effect.into(),
            enabled: true,
            attached: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.set_position(position);
        self
    }

    /// Id assigned on registration. `RegionId(0)` until then.
    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn position(&self) -> Vec2 {
        self.shape.center()
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.shape.set_center(position);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emitters this region currently affects.
    pub fn attached_emitters(&self) -> Vec<EmitterId> {
        let mut ids: Vec<EmitterId> = self.lock_attached().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_attached(&self, emitter: EmitterId) -> bool {
        self.lock_attached().contains(&emitter)
    }

    pub(crate) fn lock_attached(&self) -> std::sync::MutexGuard<'_, HashSet<EmitterId>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn attached_mut(&mut self) -> &mut HashSet<EmitterId> {
        self.attached.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply the effect to every particle inside the region's shape.
    pub fn process(&self, dt: f32, particles: &mut [Particle]) {
        let center = self.position();
        match &self.effect {
            AreaEffect::Force(force) => {
                for p in particles.iter_mut() {
                    if self.shape.contains(p.position) {
                        force.apply(center, dt, p);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::shapes::CircleShape;

    fn particle_at(position: Vec2) -> Particle {
        Particle {
            position,
            direction: Vec2::X,
            speed: 1.0,
            initial_life: 1.0,
            time_alive: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn region_moves_its_shape() {
        let region = AreaRegion::new(CircleShape::new(10.0), ForceEffect::attract(0.0, 10.0))
            .with_position(Vec2::new(100.0, 0.0));
        assert_eq!(region.position(), Vec2::new(100.0, 0.0));
        assert!(region.shape().contains(Vec2::new(105.0, 0.0)));
    }

    #[test]
    fn process_skips_particles_outside_shape() {
        let region = AreaRegion::new(CircleShape::new(10.0), ForceEffect::attract(0.0, 100.0));
        let mut particles = vec![particle_at(Vec2::new(0.0, 5.0)), particle_at(Vec2::new(0.0, 50.0))];
        region.process(0.1, &mut particles);
        assert!(particles[0].speed > 1.0);
        assert_eq!(particles[1].speed, 1.0);
        assert_eq!(particles[1].direction, Vec2::X);
    }

    #[test]
    fn new_region_has_no_attachments() {
        let region = AreaRegion::new(CircleShape::new(10.0), ForceEffect::repel(0.0, 10.0));
        assert!(region.attached_emitters().is_empty());
        assert!(!region.is_attached(EmitterId(1)));
        assert!(region.is_enabled());
    }
}
