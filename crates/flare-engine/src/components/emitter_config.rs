//! Start-value policies for newly emitted particles.
//!
//! Each attribute family (speed, scale, color, life) picks one of three
//! policies: a fixed value, a uniform random value between two bounds, or a
//! uniform random input mapped through a response curve.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::core::curve::{Curve, SharedCurve};
use crate::core::math::between;
use crate::core::rng::Rng;

/// Policy for a single float attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarStart {
    Fixed(f32),
    Random { min: f32, max: f32 },
    Curve(SharedCurve),
}

impl ScalarStart {
    pub fn sample(&self, rng: &mut Rng) -> f32 {
        match self {
            ScalarStart::Fixed(v) => *v,
            ScalarStart::Random { min, max } => between(*min, *max, rng.next_f32()),
            ScalarStart::Curve(curve) => curve.evaluate(rng.next_f32()),
        }
    }

    /// Largest value this policy can produce.
    pub fn max_value(&self) -> f32 {
        match self {
            ScalarStart::Fixed(v) => *v,
            ScalarStart::Random { min, max } => min.max(*max),
            ScalarStart::Curve(curve) => curve.lock().max_value(),
        }
    }

    fn deep_copy(&self) -> Self {
        match self {
            ScalarStart::Curve(curve) => ScalarStart::Curve(curve.deep_clone()),
            other => other.clone(),
        }
    }
}

/// Policy for particle scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStart {
    Fixed(Vec2),
    /// With `two_dimensions` off, one random draw drives both axes.
    Random {
        min: Vec2,
        max: Vec2,
        #[serde(default)]
        two_dimensions: bool,
    },
    Curve {
        x: SharedCurve,
        y: SharedCurve,
        #[serde(default)]
        two_dimensions: bool,
    },
}

impl ScaleStart {
    /// Uniform scale driven by a single curve on both axes.
    pub fn curve(curve: Curve) -> Self {
        let shared = SharedCurve::new(curve);
        ScaleStart::Curve {
            x: shared.clone(),
            y: shared,
            two_dimensions: false,
        }
    }

    pub fn sample(&self, rng: &mut Rng) -> Vec2 {
        match self {
            ScaleStart::Fixed(v) => *v,
            ScaleStart::Random {
                min,
                max,
                two_dimensions,
            } => {
                let (tx, ty) = draw_pair(rng, *two_dimensions);
                Vec2::new(between(min.x, max.x, tx), between(min.y, max.y, ty))
            }
            ScaleStart::Curve {
                x,
                y,
                two_dimensions,
            } => {
                let (tx, ty) = draw_pair(rng, *two_dimensions);
                Vec2::new(x.evaluate(tx), y.evaluate(ty))
            }
        }
    }

    fn deep_copy(&self) -> Self {
        match self {
            ScaleStart::Curve {
                x,
                y,
                two_dimensions,
            } => ScaleStart::Curve {
                x: x.deep_clone(),
                y: y.deep_clone(),
                two_dimensions: *two_dimensions,
            },
            other => other.clone(),
        }
    }
}

fn draw_pair(rng: &mut Rng, independent: bool) -> (f32, f32) {
    let tx = rng.next_f32();
    let ty = if independent { rng.next_f32() } else { tx };
    (tx, ty)
}

/// Policy for particle color. Channels are drawn independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorStart {
    Fixed(Vec4),
    Random { min: Vec4, max: Vec4 },
    Curve([SharedCurve; 4]),
}

impl ColorStart {
    pub fn sample(&self, rng: &mut Rng) -> Vec4 {
        match self {
            ColorStart::Fixed(v) => *v,
            ColorStart::Random { min, max } => Vec4::new(
                between(min.x, max.x, rng.next_f32()),
                between(min.y, max.y, rng.next_f32()),
                between(min.z, max.z, rng.next_f32()),
                between(min.w, max.w, rng.next_f32()),
            ),
            ColorStart::Curve([h, s, l, a]) => Vec4::new(
                h.evaluate(rng.next_f32()),
                s.evaluate(rng.next_f32()),
                l.evaluate(rng.next_f32()),
                a.evaluate(rng.next_f32()),
            ),
        }
    }

    fn deep_copy(&self) -> Self {
        match self {
            ColorStart::Curve(curves) => ColorStart::Curve(curves.each_ref().map(SharedCurve::deep_clone)),
            other => other.clone(),
        }
    }
}

/// Start-value configuration of an emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub speed: ScalarStart,
    pub scale: ScaleStart,
    /// Hue (degrees), saturation, lightness, alpha.
    pub color: ColorStart,
    /// Lifetime in seconds.
    pub life: ScalarStart,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            speed: ScalarStart::Fixed(50.0),
            scale: ScaleStart::Fixed(Vec2::ONE),
            color: ColorStart::Fixed(Vec4::new(0.0, 0.0, 1.0, 1.0)),
            life: ScalarStart::Fixed(1.0),
        }
    }
}

impl EmitterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speed(mut self, speed: ScalarStart) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_scale(mut self, scale: ScaleStart) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_color(mut self, color: ColorStart) -> Self {
        self.color = color;
        self
    }

    pub fn with_life(mut self, life: ScalarStart) -> Self {
        self.life = life;
        self
    }

    pub fn sample_speed(&self, rng: &mut Rng) -> f32 {
        self.speed.sample(rng)
    }

    pub fn sample_scale(&self, rng: &mut Rng) -> Vec2 {
        self.scale.sample(rng)
    }

    pub fn sample_color(&self, rng: &mut Rng) -> Vec4 {
        self.color.sample(rng)
    }

    pub fn sample_life(&self, rng: &mut Rng) -> f32 {
        self.life.sample(rng)
    }

    /// Longest lifetime a particle can be given. Used as the default delay
    /// for timed disposal so in-flight particles can finish.
    pub fn max_life(&self) -> f32 {
        self.life.max_value()
    }

    /// Copy that shares no curves with `self`.
    pub fn deep_copy(&self) -> Self {
        Self {
            speed: self.speed.deep_copy(),
            scale: self.scale.deep_copy(),
            color: self.color.deep_copy(),
            life: self.life.deep_copy(),
        }
    }
}
