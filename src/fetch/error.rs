//! Fetch error taxonomy.
//!
//! Every variant is retryable inside the pipeline; none of them escape the
//! resolution engine, which converts exhaustion into the fallback chain.

use std::time::Duration;
use thiserror::Error;

/// Errors from a single fetch attempt or an exhausted pipeline run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The per-attempt deadline elapsed. Treated identically to a transport
    /// failure by retry policy.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Provider answered with a non-success status.
    #[error("provider returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Body parsed but carried no recognizable rate table.
    #[error("malformed provider response: {0}")]
    Validation(String),

    /// No endpoints were configured; nothing was attempted.
    #[error("no rate provider endpoints configured")]
    NoEndpoints,
}

impl FetchError {
    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Timeout(_) => "timeout",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Validation(_) => "validation",
            FetchError::NoEndpoints => "no_endpoints",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::Timeout(Duration::from_secs(10));
        assert!(err.to_string().contains("10s"));

        let err = FetchError::Validation("missing rates field".into());
        assert!(err.to_string().contains("missing rates field"));
        assert_eq!(err.reason(), "validation");
    }
}
