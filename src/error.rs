//! Error types for the person registry
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::{ErrorResponse, UniqueField};
use crate::repository::RepoError;

// == Cache Error Enum ==
/// Failures raised by the cache store and cache service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value exceeds the per-entry size limit
    #[error("Value exceeds maximum size of {limit} bytes (got {size})")]
    ValueTooLarge { size: usize, limit: usize },

    /// TTL must be strictly positive
    #[error("TTL must be greater than zero")]
    InvalidTtl,

    /// Cached payload could not be (de)serialized
    #[error("Corrupted cache payload: {0}")]
    Payload(#[from] serde_json::Error),
}

// == App Error Enum ==
/// Unified error type surfaced to the HTTP boundary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Lookup by id, email or phone yielded no row
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation on create or update
    #[error("{field} '{value}' is already registered")]
    Duplicate { field: UniqueField, value: String },

    /// Malformed input rejected before reaching the core
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Anything else: store unavailable, serialization, cache failures
    #[error("Internal error: {0}")]
    Unexpected(String),
}

impl AppError {
    /// Returns the HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate { .. } => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Unexpected(format!("cache: {err}"))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Person not found".to_string()),
            RepoError::Duplicate { field, value } => AppError::Duplicate { field, value },
            RepoError::Persistence(msg) => AppError::Unexpected(format!("persistence: {msg}")),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Unexpected(format!("serialization: {err}"))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Full detail always goes to the log; the body below may be masked later.
        let body = match &self {
            AppError::Unexpected(detail) => {
                error!(status = status.as_u16(), "{}", detail);
                ErrorResponse::new("Internal server error")
            }
            AppError::Duplicate { field, .. } => {
                warn!(status = status.as_u16(), "{}", self);
                ErrorResponse::with_field(self.to_string(), field.as_str())
            }
            _ => {
                warn!(status = status.as_u16(), "{}", self);
                ErrorResponse::new(self.to_string())
            }
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the person registry.
pub type Result<T> = std::result::Result<T, AppError>;
