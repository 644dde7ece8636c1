//! Audit Error Types

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Activity type outside the closed set (strict mode only)
    #[error("Invalid activity type: {0}")]
    InvalidActivityType(String),

    /// Store is not accepting writes
    #[error("Activity store unavailable")]
    Unavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuditError::InvalidActivityType(_) => ErrorKind::BadRequest,
            AuditError::Unavailable => ErrorKind::ServiceUnavailable,
            AuditError::Database(_) | AuditError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    fn log(&self) {
        match self {
            AuditError::Database(e) => {
                tracing::error!(error = %e, "Audit database error");
            }
            AuditError::Internal(msg) => {
                tracing::error!(message = %msg, "Audit internal error");
            }
            AuditError::Unavailable => {
                tracing::error!("Audit store unavailable");
            }
            AuditError::InvalidActivityType(code) => {
                tracing::debug!(activity_type = %code, "Rejected unknown activity type");
            }
        }
    }
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
