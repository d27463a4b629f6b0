//! # Client Error Types
//!
//! Error types for retail platform API calls, and their mapping into the
//! pipeline-level [`ReportError`].
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Error Flow                                │
//! │                                                                         │
//! │  429 response ──► handled inside the pagination loop (backoff+retry)    │
//! │                   only the exhausted retry budget escapes as an error   │
//! │                                                                         │
//! │  other non-2xx ──► Status { status, url } ──► ReportError::Upstream     │
//! │  network/decode ─► Request / Decode ────────► ReportError::Upstream     │
//! │                                               (502, nothing usable     │
//! │                                                came back)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use tally_core::ReportError;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Retail platform API client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client could not be constructed from the given configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// The request never produced a response (connect/timeout/TLS).
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The platform answered with a non-success, non-429 status.
    #[error("Upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body was not the expected JSON shape.
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Consecutive 429 responses exhausted the retry budget.
    #[error("Rate-limit retry budget exhausted after {retries} attempts at offset {offset}")]
    RetryBudgetExhausted { retries: u32, offset: usize },
}

impl ClientError {
    /// True when retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Request { .. } => true,
            ClientError::RetryBudgetExhausted { .. } => true,
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::InvalidConfig(_) | ClientError::Decode { .. } => false,
        }
    }
}

/// Escalates a failed fetch into the pipeline error the caller sees.
///
/// Upstream statuses pass through unchanged; failures with no usable
/// upstream status surface as 502, and an exhausted rate-limit budget
/// surfaces as the 429 that caused it.
impl From<ClientError> for ReportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, url } => {
                ReportError::upstream(status, format!("upstream error for {}", url))
            }
            ClientError::RetryBudgetExhausted { .. } => ReportError::upstream(429, err.to_string()),
            other => ReportError::upstream(502, other.to_string()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_upstream_with_same_code() {
        let err = ClientError::Status {
            status: 503,
            url: "https://api.test/search".into(),
        };
        let report_err: ReportError = err.into();
        assert_eq!(report_err.status_code(), 503);
    }

    #[test]
    fn test_exhausted_retry_budget_surfaces_as_429() {
        let err = ClientError::RetryBudgetExhausted {
            retries: 10,
            offset: 400,
        };
        let report_err: ReportError = err.into();
        assert_eq!(report_err.status_code(), 429);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Status { status: 500, url: String::new() }.is_retryable());
        assert!(!ClientError::Status { status: 404, url: String::new() }.is_retryable());
        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
    }
}
