//! Jaburu error types

use std::time::Duration;

/// Jaburu error types
#[derive(Debug, thiserror::Error)]
pub enum JaburuError {
    // Transport/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("upstream API error ({status}) on {endpoint}")]
    Api { status: u16, endpoint: String },

    #[error("upstream request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Upstream returned 2xx but the body did not decode into the
    /// expected `{ dados, links }` envelope.
    #[error("malformed envelope from {endpoint}: {reason}")]
    Envelope { endpoint: String, reason: String },

    // Admission errors — the upstream was never contacted
    #[error("rate limit exceeded, no token accrued within {waited:?}")]
    RateLimited { waited: Duration },

    #[error("circuit breaker open, retry in {retry_in:?}")]
    BreakerOpen { retry_in: Duration },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl JaburuError {
    /// Whether a caller could reasonably retry this request later.
    ///
    /// Admission failures, timeouts, transport errors, and upstream 5xx
    /// responses are retryable. Upstream 4xx responses and malformed
    /// envelopes are not — repeating the same request will not help.
    /// Nothing is retried inside the pipeline itself; this classification
    /// exists for the caller's retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            JaburuError::RateLimited { .. }
            | JaburuError::BreakerOpen { .. }
            | JaburuError::Timeout { .. }
            | JaburuError::Http(_) => true,
            JaburuError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Suggested wait before retrying, when the error carries one.
    ///
    /// `BreakerOpen` knows how long remains of the reset window. Other
    /// errors carry no hint and return `None`.
    pub fn retry_in(&self) -> Option<Duration> {
        match self {
            JaburuError::BreakerOpen { retry_in } => Some(*retry_in),
            _ => None,
        }
    }
}

/// Result type alias for jaburu operations
pub type Result<T> = std::result::Result<T, JaburuError>;
