use bytemuck::{Pod, Zeroable};

use crate::components::particle::Particle;

/// Per-particle render data, laid out for direct upload as a vertex-instance
/// buffer: 13 floats = 52 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    /// X position in world space.
    pub x: f32,
    /// Y position in world space.
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Sprite rotation in radians.
    pub rotation: f32,
    /// Hue, 0.0..1.0.
    pub h: f32,
    pub s: f32,
    pub l: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque).
    pub a: f32,
    /// Source rectangle on the texture, in pixels.
    pub src_x: f32,
    pub src_y: f32,
    pub src_w: f32,
    pub src_h: f32,
}

impl ParticleInstance {
    pub const FLOATS: usize = 13;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

impl From<&Particle> for ParticleInstance {
    fn from(p: &Particle) -> Self {
        Self {
            x: p.position.x,
            y: p.position.y,
            scale_x: p.scale.x,
            scale_y: p.scale.y,
            rotation: p.sprite_rotation,
            h: p.color.x,
            s: p.color.y,
            l: p.color.z,
            a: p.color.w,
            src_x: p.source_rect.x,
            src_y: p.source_rect.y,
            src_w: p.source_rect.z,
            src_h: p.source_rect.w,
        }
    }
}

/// Every live particle of the visible emitters, grouped by blend mode.
///
/// Instances `[0..additive_split)` are alpha-blended,
/// `[additive_split..subtractive_split)` additive, and the rest subtractive.
#[derive(Debug, Clone)]
pub struct ParticleRenderBuffer {
    pub instances: Vec<ParticleInstance>,
    pub additive_split: u32,
    pub subtractive_split: u32,
}

impl ParticleRenderBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(4096),
            additive_split: 0,
            subtractive_split: 0,
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.additive_split = 0;
        self.subtractive_split = 0;
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn alpha(&self) -> &[ParticleInstance] {
        &self.instances[..self.additive_split as usize]
    }

    pub fn additive(&self) -> &[ParticleInstance] {
        &self.instances[self.additive_split as usize..self.subtractive_split as usize]
    }

    pub fn subtractive(&self) -> &[ParticleInstance] {
        &self.instances[self.subtractive_split as usize..]
    }

    /// Instance data as raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for ParticleRenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}
