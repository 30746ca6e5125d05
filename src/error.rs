//! Error types for the category service
//!
//! Two layers: `CacheError` stays inside the cache subsystem and is never
//! shown to clients, `ServiceError` is what handlers and the message
//! dispatcher report.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Failures raised by the cache store or a cache backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Key is empty, too long, or contains whitespace
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// TTL of zero seconds
    #[error("Invalid TTL for key {0}: must be at least one second")]
    InvalidTtl(String),

    /// Serialized value exceeds the size limit
    #[error("Value too large for key {key}: {size} bytes")]
    ValueTooLarge { key: String, size: usize },

    /// Backend could not be reached or misbehaved
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

// == Service Error Enum ==
/// Errors surfaced to HTTP and message-bus callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Entity does not exist (or is soft-deleted)
    #[error("{0}")]
    NotFound(String),

    /// Duplicate name/slug, or a state transition that is not allowed
    #[error("{0}")]
    Conflict(String),

    /// Malformed request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence accessor failure
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Repository(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Result type for cache-layer operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Repository("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ServiceError::Conflict("Slug taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::ValueTooLarge {
            key: "categories:all".into(),
            size: 10,
        };
        assert_eq!(err.to_string(), "Value too large for key categories:all: 10 bytes");
    }
}
