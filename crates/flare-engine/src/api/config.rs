use serde::{Deserialize, Serialize};

use crate::api::error::Result;

/// How particle buffers for new emitters are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Every emitter owns freshly allocated arrays. Best when emitters are
    /// long-lived or pooled by the game itself.
    Dedicated,
    /// Arrays are rented from the engine's buffer pool and returned on
    /// disposal. Best when many emitters are created and destroyed at runtime.
    #[default]
    Pooled,
}

/// How invalid configuration values are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Clamp invalid values into range and carry on.
    #[default]
    Stability,
    /// Reject invalid values with [`ParticleError::InvalidValue`](crate::ParticleError::InvalidValue).
    Throw,
}

/// How a frame update is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Everything runs on the calling thread.
    Synchronous,
    /// Attachment and update passes run on the thread pool; `update` blocks
    /// until both are done.
    ParallelSynchronous,
    /// The whole frame runs as a background task. Call
    /// `wait_for_completion()` before reading particles (e.g. before rendering).
    #[default]
    ParallelAsynchronous,
}

/// Configuration for the particle engine, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Buffer allocation strategy for new emitters (default: pooled).
    pub allocation_mode: AllocationMode,
    /// Treatment of invalid emitter values (default: stability).
    pub error_handling: ErrorHandling,
    /// Scheduling mode used by `update` (default: parallel asynchronous).
    pub update_mode: UpdateMode,
    /// Base seed for emitter random number generators (default: 42).
    pub seed: u64,
    /// Maximum number of idle buffers the pool keeps per buffer kind (default: 64).
    pub max_pooled_buffers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allocation_mode: AllocationMode::default(),
            error_handling: ErrorHandling::default(),
            update_mode: UpdateMode::default(),
            seed: 42,
            max_pooled_buffers: 64,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // -- Builder pattern --

    pub fn with_allocation_mode(mut self, mode: AllocationMode) -> Self {
        self.allocation_mode = mode;
        self
    }

    pub fn with_error_handling(mut self, handling: ErrorHandling) -> Self {
        self.error_handling = handling;
        self
    }

    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_pooled_buffers(mut self, max: usize) -> Self {
        self.max_pooled_buffers = max;
        self
    }
}
