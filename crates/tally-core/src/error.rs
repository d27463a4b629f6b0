//! # Pipeline Error Types
//!
//! Error types for the report pipeline.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Report Error Flow                                │
//! │                                                                         │
//! │  window::resolve ──► InvalidPeriod ──┐                                  │
//! │                                      ├──► ErrorResponse ──► HTTP view   │
//! │  client fetch ─────► Upstream ───────┘    {"error", "status_code"}      │
//! │                                                                         │
//! │  Malformed records never reach here: they are coerced to defaults      │
//! │  inside types/aggregate and reporting continues.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

/// Result type alias for report pipeline operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Report pipeline errors.
///
/// ## Design Principles
/// - Per-record data problems are absorbed by coercion, never surfaced here
/// - Pipeline-level problems (bad input, upstream failure) always are
/// - Every variant maps to a caller-facing [`ErrorResponse`]
#[derive(Debug, Error)]
pub enum ReportError {
    /// Unknown period kind or unparsable date input. Not retried.
    #[error("Invalid report period: {0}")]
    InvalidPeriod(String),

    /// The retail platform returned a non-success, non-rate-limit response,
    /// or rate-limit backoff exhausted its page budget. The whole report is
    /// aborted - partial results are never returned.
    #[error("Upstream request failed with status {status}: {message}")]
    Upstream { status: u16, message: String },
}

impl ReportError {
    /// Convenience constructor for upstream failures.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        ReportError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// HTTP-ish status code for the caller-facing error object.
    ///
    /// Upstream failures carry the upstream status through unchanged so the
    /// caller can see what the platform actually said.
    pub fn status_code(&self) -> u16 {
        match self {
            ReportError::InvalidPeriod(_) => 400,
            ReportError::Upstream { status, .. } => *status,
        }
    }
}

// =============================================================================
// Caller-Facing Error Object
// =============================================================================

/// The uniform error shape handed to callers of `generate_report`.
///
/// No panic or raw error ever crosses the report boundary; everything is
/// converted to this object and mapped to a transport-level failure by the
/// HTTP view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable failure description.
    pub error: String,
    /// Status code the transport layer should respond with.
    pub status_code: u16,
}

impl From<&ReportError> for ErrorResponse {
    fn from(err: &ReportError) -> Self {
        ErrorResponse {
            error: err.to_string(),
            status_code: err.status_code(),
        }
    }
}

impl From<ReportError> for ErrorResponse {
    fn from(err: ReportError) -> Self {
        ErrorResponse::from(&err)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_period_maps_to_400() {
        let err = ReportError::InvalidPeriod("unknown period 'yearly'".into());
        let resp = ErrorResponse::from(err);
        assert_eq!(resp.status_code, 400);
        assert!(resp.error.contains("yearly"));
    }

    #[test]
    fn test_upstream_status_passes_through() {
        let err = ReportError::upstream(503, "service unavailable");
        assert_eq!(err.status_code(), 503);
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.status_code, 503);
        assert!(resp.error.contains("503"));
    }
}
