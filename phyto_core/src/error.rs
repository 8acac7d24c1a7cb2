//! Error types for engine operations
//!
//! None of these are fatal to the stream. The co-training loop turns every
//! variant into "skip this tick's learning or classification".

use std::fmt;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Error type for engine operations
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A label name outside the six classifiable states
    UnknownState { name: String },

    /// An organism name with no registered profile
    UnknownOrganism { name: String },

    /// Profile data that cannot initialise a classifier
    InvalidProfile { profile: String, reason: String },

    /// Vector length does not match what the classifier expects
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// Not enough samples to derive a feature record
    InsufficientSamples { required: usize, got: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnknownState { name } => {
                write!(f, "Unknown state '{}': expected one of the six classifiable states", name)
            }
            EngineError::UnknownOrganism { name } => {
                write!(f, "Unknown organism '{}': no profile registered under that name", name)
            }
            EngineError::InvalidProfile { profile, reason } => {
                write!(f, "Invalid organism profile '{}': {}", profile, reason)
            }
            EngineError::DimensionMismatch {
                expected,
                got,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch in {}: expected {} dimensions, got {}",
                    context, expected, got
                )
            }
            EngineError::InsufficientSamples { required, got } => {
                write!(
                    f,
                    "Insufficient samples: {} required, {} available",
                    required, got
                )
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    pub fn invalid_profile(profile: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidProfile {
            profile: profile.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<phyto_shared::ParseStateError> for EngineError {
    fn from(err: phyto_shared::ParseStateError) -> Self {
        EngineError::UnknownState { name: err.name }
    }
}
