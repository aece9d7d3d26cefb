use crate::renderer::instance::{ParticleInstance, ParticleRenderBuffer};
use crate::systems::emitter::{BlendMode, Emitter};

/// Build the render buffer from a set of emitters.
/// Groups particles by their emitter's blend mode: alpha first, then
/// additive, then subtractive, and records the split offsets.
pub fn build_particle_buffer<'a>(emitters: impl Iterator<Item = &'a Emitter>, buffer: &mut ParticleRenderBuffer) {
    buffer.clear();

    let mut additive: Vec<ParticleInstance> = Vec::new();
    let mut subtractive: Vec<ParticleInstance> = Vec::new();

    for emitter in emitters {
        let target = match emitter.blend_mode {
            BlendMode::Alpha => &mut buffer.instances,
            BlendMode::Additive => &mut additive,
            BlendMode::Subtractive => &mut subtractive,
        };
        target.extend(emitter.active_particles().iter().map(ParticleInstance::from));
    }

    buffer.additive_split = buffer.instances.len() as u32;
    buffer.instances.append(&mut additive);
    buffer.subtractive_split = buffer.instances.len() as u32;
    buffer.instances.append(&mut subtractive);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::shapes::PointEmitterShape;
    use crate::systems::emitter::EmitterContext;
    use glam::Vec2;

    fn emitter(blend: BlendMode, count: usize) -> Emitter {
        let mut e = Emitter::new(&EmitterContext::default(), 8, PointEmitterShape::new(), Vec2::splat(4.0))
            .unwrap()
            .with_blend_mode(blend);
        e.emit(count);
        e
    }

    #[test]
    fn build_buffer_groups_by_blend_mode() {
        let emitters = vec![
            emitter(BlendMode::Subtractive, 1),
            emitter(BlendMode::Additive, 2),
            emitter(BlendMode::Alpha, 3),
            emitter(BlendMode::Additive, 1),
        ];
        let mut buffer = ParticleRenderBuffer::new();
        build_particle_buffer(emitters.iter(), &mut buffer);

        assert_eq!(buffer.instance_count(), 7);
        assert_eq!(buffer.additive_split, 3);
        assert_eq!(buffer.subtractive_split, 6);
        assert_eq!(buffer.alpha().len(), 3);
        assert_eq!(buffer.additive().len(), 3);
        assert_eq!(buffer.subtractive().len(), 1);
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut buffer = ParticleRenderBuffer::new();
        build_particle_buffer([emitter(BlendMode::Additive, 4)].iter(), &mut buffer);
        build_particle_buffer(std::iter::empty(), &mut buffer);
        assert_eq!(buffer.instance_count(), 0);
        assert_eq!(buffer.additive_split, 0);
        assert_eq!(buffer.subtractive_split, 0);
    }
}
