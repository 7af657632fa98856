use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::forms::FieldErrors;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    RateLimited(String),
    Validation(FieldErrors),
    Internal(String),
    Database(sqlx::Error),
}

impl AppError {
    /// Map constraint violations to client errors; anything else stays a
    /// database error.
    pub fn from_constraint(err: sqlx::Error, conflict_msg: &str) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(conflict_msg.to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest("Referenced record does not exist".to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
                AppError::BadRequest("Value violates a schema constraint".to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {errors}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(errors) => json!({
                "error": "Validation failed",
                "fields": errors,
            }),
            // Server-side detail stays in the log
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                json!({ "error": "Internal server error" })
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                json!({ "error": "Internal server error" })
            }
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimited(msg) => json!({ "error": msg }),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(format!("File storage failed: {err}"))
    }
}
