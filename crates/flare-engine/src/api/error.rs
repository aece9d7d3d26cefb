//! Error types for flare-engine.

use thiserror::Error;

use crate::api::types::{EmitterId, RegionId};

/// Everything that can go wrong while configuring or driving the particle engine.
#[derive(Debug, Error)]
pub enum ParticleError {
    /// A configuration setter received a value outside its valid range.
    /// Only raised under [`ErrorHandling::Throw`](crate::ErrorHandling::Throw).
    #[error("invalid emitter value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the rejected setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The engine configuration could not be parsed.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The engine was used before `initialize()`.
    #[error("particle engine has not been initialized; call ParticleEngine::initialize() first")]
    NotInitialized,

    /// A particle index outside `[0, active)`.
    #[error("particle index {index} is outside the active range 0..{active}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Active particle count at the time of the call.
        active: usize,
    },

    /// No emitter with this id is registered.
    #[error("unknown {0}")]
    UnknownEmitter(EmitterId),

    /// No region with this id is registered.
    #[error("unknown {0}")]
    UnknownRegion(RegionId),

    /// A module kind name that does not name a particle module.
    #[error("`{0}` is not a particle module kind")]
    UnknownModuleKind(String),

    /// A recognised but unimplemented mode was selected.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// Simulation state was read while an asynchronous frame is still running.
    #[error("an asynchronous frame is still in flight; call wait_for_completion() first")]
    FrameInFlight,

    /// The background frame worker went away without returning the simulation state.
    #[error("the background frame worker was lost; simulation state is gone")]
    WorkerLost,
}

impl ParticleError {
    /// Whether this error signals a programming mistake by the caller rather
    /// than noisy input data or a broken engine invariant.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ParticleError::NotInitialized
                | ParticleError::IndexOutOfRange { .. }
                | ParticleError::UnknownEmitter(_)
                | ParticleError::UnknownRegion(_)
                | ParticleError::UnknownModuleKind(_)
                | ParticleError::Unsupported(_)
                | ParticleError::FrameInFlight
        )
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ParticleError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParticleError>;
