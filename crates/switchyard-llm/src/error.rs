//! Error types for switchyard-llm

use thiserror::Error;

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// The call was cancelled before the provider answered
    #[error("provider call cancelled")]
    Cancelled,
}

impl Error {
    /// Whether a retry of the same call could plausibly succeed.
    ///
    /// Only connection-level failures, timeouts and rate limits qualify.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_) | Self::RateLimit)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
