use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{mail::MailError, storage::StorageError};

/// FieldError
///
/// One entry of the structured error list returned on validation failure.
#[derive(Debug, Clone, Serialize, PartialEq, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// AppError
///
/// The single error type returned by handlers and the repository layer.
/// Implements [`IntoResponse`] to produce `{"error", "code", "details"}` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias used by handlers and repositories alike.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Authentication required".to_string())
    }

    pub fn admin_only() -> Self {
        AppError::Forbidden("Administrator role required".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(err) if is_unique_violation(err) => StatusCode::BAD_REQUEST,
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid {}", e.code)),
                })
            })
            .collect();
        // HashMap iteration order is unstable; keep responses deterministic.
        details.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
        AppError::Validation(details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match &self {
            AppError::Validation(details) => ("VALIDATION_ERROR", self.to_string(), details.clone()),
            AppError::BadRequest(msg) => ("BAD_REQUEST", msg.clone(), vec![]),
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string(), vec![]),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone(), vec![]),
            AppError::Forbidden(msg) => ("FORBIDDEN", msg.clone(), vec![]),
            AppError::Database(err) if is_unique_violation(err) => {
                let constraint = match err {
                    sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or("unique").to_string(),
                    _ => "unique".to_string(),
                };
                ("BAD_REQUEST", format!("Duplicate value violates {constraint}"), vec![])
            }
            AppError::Database(sqlx::Error::RowNotFound) => ("NOT_FOUND", "Resource not found".to_string(), vec![]),
            other => {
                tracing::error!(error = %other, "request failed");
                ("INTERNAL_ERROR", "An internal error occurred".to_string(), vec![])
            }
        };

        let body = json!({
            "error": message,
            "code": code,
            "details": details,
        });

        (status, Json(body)).into_response()
    }
}

// PostgreSQL unique_violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
