use glam::Vec4;
use serde::{Deserialize, Serialize};

use super::{ParticleModule, UpdateContext};
use crate::api::error::{ParticleError, Result};
use crate::components::particle::Particle;

/// How frames advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// One pass through the sheet over the particle's life.
    #[default]
    OverLifetime,
    /// Repeating playback. Not implemented; selecting it is an error.
    Loop,
}

/// Steps each particle's source rectangle through a sprite sheet.
///
/// Frames are laid out row-major: frame `n` is at column `n % columns`,
/// row `n / columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAnimationModule {
    rows: u32,
    columns: u32,
    mode: AnimationMode,
    pub enabled: bool,
}

impl TextureAnimationModule {
    /// Play a `rows` x `columns` sheet once over each particle's life.
    pub fn over_lifetime(rows: u32, columns: u32) -> Self {
        Self {
            rows: rows.max(1),
            columns: columns.max(1),
            mode: AnimationMode::OverLifetime,
            enabled: true,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn total_frames(&self) -> u32 {
        self.rows.saturating_mul(self.columns)
    }

    pub fn mode(&self) -> AnimationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AnimationMode) -> Result<()> {
        if mode == AnimationMode::Loop {
            return Err(ParticleError::Unsupported("looping texture animation"));
        }
        self.mode = mode;
        Ok(())
    }

    pub fn with_mode(mut self, mode: AnimationMode) -> Result<Self> {
        self.set_mode(mode)?;
        Ok(self)
    }

    /// Frame shown at `life_ratio`.
    pub fn frame_at(&self, life_ratio: f32) -> u32 {
        let frames = self.total_frames();
        ((life_ratio.max(0.0) * frames as f32).floor() as u32).min(frames - 1)
    }

    /// Source rectangle of `frame` on a sheet of `texture_size` pixels.
    pub fn frame_rect(&self, frame: u32, texture_size: glam::Vec2) -> Vec4 {
        let w = texture_size.x / self.columns as f32;
        let h = texture_size.y / self.rows as f32;
        let col = frame % self.columns;
        let row = frame / self.columns;
        Vec4::new(col as f32 * w, row as f32 * h, w, h)
    }
}

impl ParticleModule for TextureAnimationModule {
    fn on_update(&mut self, ctx: &UpdateContext, particles: &mut [Particle]) {
        match self.mode {
            AnimationMode::OverLifetime => {
                for p in particles.iter_mut() {
                    let frame = self.frame_at(p.life_ratio());
                    p.source_rect = self.frame_rect(frame, ctx.texture_size);
                }
            }
            AnimationMode::Loop => {
                debug_assert!(false, "looping texture animation is rejected by set_mode");
            }
        }
    }
}
