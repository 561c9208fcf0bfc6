//! Error types for the rendering engine.

use overtone_patch::PatchError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced at the engine's call boundary.
///
/// Numeric edge cases (near-zero divisors, levels under the zero floor,
/// quantizer overflow) are clamped inside the stages and never reach here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// FFT length is not a supported power of two.
    #[error("unsupported FFT length {len}: expected a power of two in {min}..={max}")]
    UnsupportedFftLength {
        /// Requested length.
        len: usize,
        /// Smallest supported length.
        min: usize,
        /// Largest supported length.
        max: usize,
    },

    /// Two buffers that must pair up have different lengths.
    #[error("buffer length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Sample rate is zero, negative or not finite.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: f64,
    },

    /// Invalid parameter value passed to an engine entry point.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// The patch failed validation.
    #[error("invalid patch: {0}")]
    Patch(#[from] PatchError),
}

impl EngineError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns a stable short code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnsupportedFftLength { .. } => "ENGINE_001",
            EngineError::LengthMismatch { .. } => "ENGINE_002",
            EngineError::InvalidSampleRate { .. } => "ENGINE_003",
            EngineError::InvalidParameter { .. } => "ENGINE_004",
            EngineError::Patch(_) => "ENGINE_005",
        }
    }
}

/// Checks that a sample rate is usable.
pub fn check_sample_rate(rate: f64) -> EngineResult<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(EngineError::InvalidSampleRate { rate })
    }
}
