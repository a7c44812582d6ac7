//! Typed errors for record validation.

use thiserror::Error;

/// Reasons a content record is rejected before scoring or storage.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required field is absent or blank
    #[error("record missing required field: {0}")]
    MissingField(&'static str),

    /// Content is below the configured minimum length
    #[error("content too short: {length} chars (minimum {minimum})")]
    ContentTooShort { length: usize, minimum: usize },
}

/// Result type alias for record validation.
pub type RecordResult<T> = std::result::Result<T, RecordError>;
