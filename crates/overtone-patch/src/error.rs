//! Error types for patch parsing and validation.

use thiserror::Error;

/// Errors raised while loading or validating a [`Patch`](crate::Patch).
#[derive(Debug, Error)]
pub enum PatchError {
    /// The document declares a schema version this crate does not understand.
    #[error("unsupported patch version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Version supported by this crate.
        expected: u32,
    },

    /// A numeric field lies outside its documented range.
    #[error("field '{field}' = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Field name as it appears in JSON.
        field: &'static str,
        /// Offending value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A numeric field is NaN or infinite.
    #[error("field '{field}' is not a finite number")]
    NotFinite {
        /// Field name as it appears in JSON.
        field: &'static str,
    },

    /// A field violates a constraint that is not a plain range.
    #[error("invalid field '{field}': {message}")]
    Invalid {
        /// Field name as it appears in JSON.
        field: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// The JSON document could not be parsed.
    #[error("failed to parse patch JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PatchError {
    /// Creates an [`PatchError::Invalid`] error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    /// Returns a stable short code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            PatchError::UnsupportedVersion { .. } => "PATCH_001",
            PatchError::OutOfRange { .. } => "PATCH_002",
            PatchError::NotFinite { .. } => "PATCH_003",
            PatchError::Invalid { .. } => "PATCH_004",
            PatchError::Json(_) => "PATCH_005",
        }
    }
}
