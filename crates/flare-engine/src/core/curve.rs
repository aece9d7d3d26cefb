//! Response curves: keyed float functions used by emission policies and
//! color transitions.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::extensions::easing::{ease, Easing};

/// A single key on a [`Curve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Input position of the key.
    pub position: f32,
    /// Output value at `position`.
    pub value: f32,
    /// Shape of the segment leaving this key.
    #[serde(default)]
    pub easing: Easing,
}

/// Piecewise function over sorted keys.
///
/// Inputs before the first key return the first value, inputs after the last
/// key return the last value. An empty curve evaluates to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct Curve {
    keys: Vec<CurveKey>,
}

impl From<Vec<CurveKey>> for Curve {
    fn from(keys: Vec<CurveKey>) -> Self {
        let mut curve = Curve { keys };
        curve.sort();
        curve
    }
}

impl From<Curve> for Vec<CurveKey> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constant curve.
    pub fn constant(value: f32) -> Self {
        Self::new().with_key(0.0, value)
    }

    /// Straight line from `(0, from)` to `(1, to)`.
    pub fn linear(from: f32, to: f32) -> Self {
        Self::new().with_key(0.0, from).with_key(1.0, to)
    }

    pub fn with_key(mut self, position: f32, value: f32) -> Self {
        self.add_key(position, value, Easing::Linear);
        self
    }

    pub fn with_eased_key(mut self, position: f32, value: f32, easing: Easing) -> Self {
        self.add_key(position, value, easing);
        self
    }

    /// Insert a key, keeping keys sorted by position.
    pub fn add_key(&mut self, position: f32, value: f32, easing: Easing) {
        let idx = self.keys.partition_point(|k| k.position <= position);
        self.keys.insert(idx, CurveKey { position, value, easing });
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn sort(&mut self) {
        self.keys.sort_by(|a, b| a.position.total_cmp(&b.position));
    }

    /// Evaluate the curve at `t`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if t <= first.position {
            return first.value;
        }
        if t >= last.position {
            return last.value;
        }

        // First key strictly after t; t > first.position guarantees idx >= 1.
        let idx = self.keys.partition_point(|k| k.position <= t);
        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let span = b.position - a.position;
        if span <= f32::EPSILON {
            return b.value;
        }
        ease(a.value, b.value, (t - a.position) / span, a.easing)
    }

    /// Largest value any key produces. Zero for an empty curve.
    pub fn max_value(&self) -> f32 {
        self.keys
            .iter()
            .map(|k| k.value)
            .reduce(f32::max)
            .unwrap_or(0.0)
    }
}

/// Curve shared between emitters and modules.
///
/// Every evaluation takes the curve's lock, so the host may edit a curve while
/// a frame is running on the thread pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Curve", into = "Curve")]
pub struct SharedCurve(Arc<Mutex<Curve>>);

impl From<Curve> for SharedCurve {
    fn from(curve: Curve) -> Self {
        SharedCurve(Arc::new(Mutex::new(curve)))
    }
}

impl From<SharedCurve> for Curve {
    fn from(shared: SharedCurve) -> Self {
        shared.lock().clone()
    }
}

impl SharedCurve {
    pub fn new(curve: Curve) -> Self {
        curve.into()
    }

    /// Lock the curve for reading or editing.
    pub fn lock(&self) -> MutexGuard<'_, Curve> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate under the lock.
    pub fn evaluate(&self, t: f32) -> f32 {
        self.lock().evaluate(t)
    }

    /// Run `f` with the curve locked once, for batches of evaluations.
    pub fn with<R>(&self, f: impl FnOnce(&Curve) -> R) -> R {
        f(&self.lock())
    }

    /// Independent copy that no longer shares edits with `self`.
    pub fn deep_clone(&self) -> SharedCurve {
        SharedCurve::new(self.lock().clone())
    }

    /// Whether both handles point at the same curve.
    pub fn ptr_eq(&self, other: &SharedCurve) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
