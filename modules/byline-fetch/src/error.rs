//! Typed errors for fetch operations.

use thiserror::Error;

/// Why a fetch did not produce a usable response.
///
/// Retryable conditions never appear here directly: they are retried inside
/// the gateway and only surface as [`FetchError::RetriesExhausted`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Robots.txt disallows crawling
    #[error("robots.txt disallows: {url}")]
    PolicyBlocked { url: String },

    /// Non-retryable HTTP status
    #[error("fatal failure fetching {url}: {reason}")]
    Fatal {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// Every attempt hit a retryable failure
    #[error("gave up on {url} after {attempts} attempts: {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: Option<u16>,
        reason: String,
    },

    /// Aborted by a cancellation signal while waiting
    #[error("fetch cancelled: {url}")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url }
            | Self::PolicyBlocked { url }
            | Self::Fatal { url, .. }
            | Self::RetriesExhausted { url, .. }
            | Self::Cancelled { url } => url,
        }
    }

    /// HTTP status of the last response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fatal { status, .. } | Self::RetriesExhausted { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_policy_blocked(&self) -> bool {
        matches!(self, Self::PolicyBlocked { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Transport-level failures. All of them are treated as retryable.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
