use crate::api::error::Result;
use crate::api::types::EmitterId;
use crate::systems::engine::ParticleEngine;

/// A named group of emitters driven together, e.g. the smoke, sparks and
/// debris of one explosion.
///
/// The set only holds ids. Every bulk operation goes through the engine, so
/// ids of emitters that were disposed elsewhere are reported as
/// [`UnknownEmitter`](crate::ParticleError::UnknownEmitter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitterSet {
    ids: Vec<EmitterId>,
}

impl EmitterSet {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Builder pattern --

    pub fn with(mut self, id: EmitterId) -> Self {
        self.add(id);
        self
    }

    /// Add an id. Duplicates are ignored.
    pub fn add(&mut self, id: EmitterId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: EmitterId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|e| *e != id);
        self.ids.len() != before
    }

    pub fn ids(&self) -> &[EmitterId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    // -- Bulk operations --

    pub fn set_enabled(&self, engine: &mut ParticleEngine, enabled: bool) -> Result<()> {
        for &id in &self.ids {
            engine.set_emitter_enabled(id, enabled)?;
        }
        Ok(())
    }

    /// Emit `count` from every member. Returns the total emitted.
    pub fn emit(&self, engine: &mut ParticleEngine, count: usize) -> Result<usize> {
        let mut total = 0;
        for &id in &self.ids {
            total += engine.emitter_mut(id)?.emit(count);
        }
        Ok(total)
    }

    /// Deep-copy every member, register the copies, and return them as a
    /// new set in the same order.
    pub fn deep_copy(&self, engine: &mut ParticleEngine) -> Result<EmitterSet> {
        let mut copy = EmitterSet::new();
        for &id in &self.ids {
            let emitter = engine.emitter(id)?.deep_copy();
            copy.add(engine.add_emitter(emitter)?);
        }
        Ok(copy)
    }

    /// Dispose every member now and empty the set.
    ///
    /// Every member is attempted even if some fail; the first failure is
    /// returned once the set is empty.
    pub fn dispose(&mut self, engine: &mut ParticleEngine) -> Result<()> {
        let mut first_err = None;
        for id in self.ids.drain(..) {
            if let Err(err) = engine.dispose_emitter(id) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Schedule every member for disposal. See
    /// [`ParticleEngine::dispose_after`].
    pub fn dispose_after(&self, engine: &mut ParticleEngine, ttl: Option<f32>) -> Result<()> {
        for &id in &self.ids {
            engine.dispose_after(id, ttl)?;
        }
        Ok(())
    }
}

impl FromIterator<EmitterId> for EmitterSet {
    fn from_iter<I: IntoIterator<Item = EmitterId>>(iter: I) -> Self {
        let mut set = EmitterSet::new();
        for id in iter {
            set.add(id);
        }
        set
    }
}
