//! Error types for the fetch layer
//!
//! The taxonomy drives the retry policy: transient network failures retry
//! with backoff, everything else fails the current unit of work immediately.
//! Configuration mistakes (bad selector, missing adapter config) and
//! resource-acquisition failures (browser launch) are surfaced to the
//! caller instead of being swallowed per unit.

use thiserror::Error;

/// Fetch-layer error type
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded its configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure (reset, DNS, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Headless browser session failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Pre-fetch authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Adapter misconfiguration (invalid selector, missing API shape)
    #[error("Adapter configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Whether the error is worth retrying with backoff.
    ///
    /// Timeouts, connection failures, and 5xx responses are transient;
    /// 4xx, parse, auth, and configuration errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map a reqwest error onto the taxonomy
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_split() {
        assert!(FetchError::Timeout("t".into()).is_retryable());
        assert!(FetchError::Network("n".into()).is_retryable());
        assert!(FetchError::Status { status: 503, url: "u".into() }.is_retryable());
        assert!(!FetchError::Status { status: 404, url: "u".into() }.is_retryable());
        assert!(!FetchError::Parse("p".into()).is_retryable());
        assert!(!FetchError::Config("c".into()).is_retryable());
        assert!(!FetchError::Browser("b".into()).is_retryable());
    }
}
