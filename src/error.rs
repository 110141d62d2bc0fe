//! Error types for the storefront cache
//!
//! Provides unified error handling using thiserror. Cache reads never
//! surface these to callers (a failed read is a miss); they flow through
//! the storage engine and the admin API only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the storefront cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// LMDB reported a failure (open, transaction, put, delete)
    #[error("Storage error: {0}")]
    Storage(#[from] heed::Error),

    /// Filesystem failure while preparing the cache directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage engine could not be opened and the cache runs disabled
    #[error("Storage unavailable")]
    Unavailable,

    /// The expiry sweeper was started twice
    #[error("Expiry sweeper already running")]
    SweeperAlreadyRunning,

    /// A configuration value the storage engine cannot use
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error (blocking task panicked or was cancelled)
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::SweeperAlreadyRunning => StatusCode::CONFLICT,
            CacheError::Storage(_)
            | CacheError::Config(_)
            | CacheError::Io(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storefront cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let response = CacheError::InvalidRequest("empty owner".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = CacheError::Unavailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = CacheError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(CacheError::Unavailable.to_string(), "Storage unavailable");
        assert_eq!(
            CacheError::SweeperAlreadyRunning.to_string(),
            "Expiry sweeper already running"
        );
    }
}
