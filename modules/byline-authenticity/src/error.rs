use thiserror::Error;

/// Why a record could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("content record has no author")]
    MissingAuthor,

    #[error("no trust profile configured for author: {0}")]
    UnknownAuthor(String),

    #[error("malformed URL {url}: {reason}")]
    MalformedUrl { url: String, reason: String },
}

/// Result type alias for scoring operations.
pub type ScoringResult<T> = std::result::Result<T, ScoringError>;
