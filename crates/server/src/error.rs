// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cogtrain_core::ValidationError;
use cogtrain_db::DbError;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Database(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_response = match &self {
            ApiError::Unauthenticated(reason) => {
                tracing::warn!(reason = %reason, "Unauthenticated request");
                ErrorResponse::new("Not authenticated")
            }
            ApiError::Forbidden(msg) => {
                tracing::warn!(message = %msg, "Forbidden");
                ErrorResponse::with_details("Forbidden", msg.clone())
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                ErrorResponse::with_details("Bad request", msg.clone())
            }
            ApiError::Validation(err) => {
                tracing::warn!(error = %err, "Validation failed");
                ErrorResponse::with_details("Bad request", err.to_string())
            }
            ApiError::NotFound(what) => {
                tracing::warn!(resource = %what, "Not found");
                ErrorResponse::with_details("Not found", what.clone())
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(message = %msg, "Conflict");
                ErrorResponse::with_details("Conflict", msg.clone())
            }
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                ErrorResponse::with_details("Database error", db_err.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                ErrorResponse::new("Internal server error")
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
