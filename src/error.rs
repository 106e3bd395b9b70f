//! Error types shared across layers.
//!
//! - [`RepositoryError`] - failures of the persistence collaborator
//! - [`AppError`] - HTTP-facing errors rendered as JSON

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::utils::code_generator::CodeGenError;

/// Errors raised by [`crate::domain::repositories::LinkRepository`] implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("short code already exists: {0}")]
    Conflict(String),

    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// JSON error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    Unavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Conflict { message, details } => ("conflict", message, details),
            AppError::Unavailable { message, details } => {
                ("service_unavailable", message, details)
            }
            AppError::Internal { message, details } => ("internal_error", message, details),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(code) => {
                AppError::conflict("Short code already exists", json!({ "code": code }))
            }
            RepositoryError::Unavailable(reason) => {
                AppError::unavailable("Link store unavailable", json!({ "reason": reason }))
            }
            RepositoryError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                AppError::internal("Database error", json!({}))
            }
        }
    }
}

impl From<CodeGenError> for AppError {
    fn from(e: CodeGenError) -> Self {
        match e {
            CodeGenError::ExistenceCheck(inner) => inner.into(),
            CodeGenError::CollisionExhausted { attempts } => AppError::unavailable(
                "Could not allocate a short code, retry later",
                json!({ "attempts": attempts }),
            ),
            other => AppError::internal(
                "Short code generation failed",
                json!({ "reason": other.to_string() }),
            ),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Request validation failed", json!(e))
    }
}

/// Maps a `sqlx` error, turning unique violations into [`RepositoryError::Conflict`].
pub fn map_sqlx_error(e: sqlx::Error, code: &str) -> RepositoryError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return RepositoryError::Conflict(code.to_string());
    }

    RepositoryError::Database(e)
}
