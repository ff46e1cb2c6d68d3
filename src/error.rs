//! Error types for the cache core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache core and its admin API.
///
/// Producer failures are never wrapped in this type; they reach callers
/// unchanged as the producer's own error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A registered cache (or other named item) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// An argument could not be folded into a cache key
    #[error("Unhashable argument: {0}")]
    Unhashable(String),

    /// Capacity or TTL misconfiguration, fatal at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A cache with the same name is already registered
    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Unhashable(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            CacheError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache core.
pub type Result<T> = std::result::Result<T, CacheError>;
