//! Gateway error taxonomy
//!
//! Every failure crossing a component boundary is expressed in these terms;
//! raw driver errors are wrapped before they leave the pool layer, so
//! handlers never leak connection details to callers.

use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No connection became free within the acquire timeout
    #[error("Connection pool exhausted: no connection available within {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    /// The pool has been shut down
    #[error("Connection pool is closed")]
    PoolClosed,

    /// I/O-level failure talking to the database; the connection was discarded
    #[error("Database connection lost: {0}")]
    ConnectionLost(String),

    /// Caller input rejected before any work was done
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced row does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The statement itself failed (constraint violation, bad column, ...)
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The statement exceeded its execution deadline
    #[error("Statement timed out after {timeout_ms}ms")]
    StatementTimeout { timeout_ms: u64 },

    /// A transactional workflow failed and was rolled back
    #[error("Transaction rolled back: {message} ({rows_affected} rows affected)")]
    TransactionFailed { message: String, rows_affected: u64 },

    /// Configuration errors surfaced at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else; the source is logged, not serialized
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl GatewayError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::Validation(_) => 400,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 503 Service Unavailable (caller may retry)
            Self::PoolExhausted { .. } | Self::PoolClosed => 503,

            // 504 Gateway Timeout
            Self::StatementTimeout { .. } => 504,

            // 500 Internal Server Error
            Self::ConnectionLost(_)
            | Self::QueryFailed(_)
            | Self::TransactionFailed { .. }
            | Self::Config(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PoolExhausted { .. } => "POOL_EXHAUSTED",
            Self::PoolClosed => "POOL_CLOSED",
            Self::ConnectionLost(_) => "CONNECTION_LOST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::StatementTimeout { .. } => "STATEMENT_TIMEOUT",
            Self::TransactionFailed { .. } => "TRANSACTION_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can usefully retry the same request
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. } | Self::ConnectionLost(_) | Self::StatementTimeout { .. }
        )
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a not found error for a resource
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error response structure for API responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: err.to_string(),
            code: err.error_code().to_string(),
            retryable: err.is_retryable().then_some(true),
        }
    }
}

impl From<GatewayError> for ErrorResponse {
    fn from(err: GatewayError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GatewayError::PoolExhausted { waited_ms: 100 }.status_code(), 503);
        assert_eq!(GatewayError::PoolClosed.status_code(), 503);
        assert_eq!(GatewayError::Validation("x".into()).status_code(), 400);
        assert_eq!(GatewayError::NotFound("employee 1".into()).status_code(), 404);
        assert_eq!(GatewayError::QueryFailed("x".into()).status_code(), 500);
        assert_eq!(GatewayError::StatementTimeout { timeout_ms: 50 }.status_code(), 504);
        assert_eq!(
            GatewayError::TransactionFailed {
                message: "x".into(),
                rows_affected: 0
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GatewayError::PoolExhausted { waited_ms: 100 }.error_code(),
            "POOL_EXHAUSTED"
        );
        assert_eq!(
            GatewayError::ConnectionLost("reset".into()).error_code(),
            "CONNECTION_LOST"
        );
        assert_eq!(
            GatewayError::Validation("x".into()).error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_retryability() {
        assert!(GatewayError::PoolExhausted { waited_ms: 1 }.is_retryable());
        assert!(GatewayError::ConnectionLost("reset".into()).is_retryable());
        assert!(!GatewayError::Validation("x".into()).is_retryable());
        assert!(!GatewayError::QueryFailed("x".into()).is_retryable());
        assert!(!GatewayError::TransactionFailed {
            message: "x".into(),
            rows_affected: 0
        }
        .is_retryable());
    }

    #[test]
    fn test_client_vs_server_error() {
        assert!(GatewayError::Validation("x".into()).is_client_error());
        assert!(GatewayError::NotFound("x".into()).is_client_error());
        assert!(GatewayError::QueryFailed("x".into()).is_server_error());
        assert!(!GatewayError::Validation("x".into()).is_server_error());
    }

    #[test]
    fn test_error_response_shape() {
        let err = GatewayError::PoolExhausted { waited_ms: 250 };
        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, "POOL_EXHAUSTED");
        assert_eq!(body.retryable, Some(true));
        assert!(body.error.contains("250ms"));

        let err = GatewayError::Validation("amount must be positive".into());
        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.retryable, None);
    }

    #[test]
    fn test_internal_error_hides_source() {
        let err = GatewayError::internal(anyhow::anyhow!("password=secret host=10.0.0.1"));
        // The serialized message must not carry the source details
        assert_eq!(err.to_string(), "Internal server error");
    }
}
