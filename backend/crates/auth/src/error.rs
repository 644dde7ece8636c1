//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Messages are user-facing.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    // ------------------------------------------------------------------
    // Account lifecycle
    // ------------------------------------------------------------------
    #[error("User already exists")]
    UserAlreadyExists,

    /// Wrong, expired, already used, or never issued
    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    /// Unknown email, inactive account, or wrong password
    #[error("Invalid credentials or inactive account")]
    InvalidCredentials,

    #[error("Please confirm your email before logging in.")]
    EmailNotConfirmed,

    #[error("Email already confirmed")]
    AlreadyConfirmed,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    InvalidInput(String),

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------
    #[error("No token, authorization denied")]
    MissingToken,

    /// Bad signature, malformed, expired, or revoked
    #[error("Token is not valid")]
    InvalidToken,

    #[error("User not found or inactive")]
    InactiveOrUnknownUser,

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------
    #[error("Access denied: insufficient role")]
    InsufficientRole,

    #[error("Only Developer can assign Developer role.")]
    DeveloperRoleRestricted,

    #[error("Admin cannot modify Developer accounts")]
    DeveloperAccountProtected,

    #[error("You do not have permission to modify this user")]
    TargetForbidden,

    #[error("{0}")]
    SelfModification(&'static str),

    // ------------------------------------------------------------------
    // Development tooling
    // ------------------------------------------------------------------
    #[error("Not available in production")]
    NotAvailable,

    #[error("No emails found for this address")]
    NoEmailsFound,

    // ------------------------------------------------------------------
    // Infrastructure
    // ------------------------------------------------------------------
    #[error(transparent)]
    Activity(#[from] audit::AuditError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserAlreadyExists => ErrorKind::Conflict,
            AuthError::InvalidOrExpiredCode
            | AuthError::EmailNotConfirmed
            | AuthError::AlreadyConfirmed
            | AuthError::InvalidInput(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::InactiveOrUnknownUser => ErrorKind::Unauthorized,
            AuthError::InsufficientRole
            | AuthError::DeveloperRoleRestricted
            | AuthError::DeveloperAccountProtected
            | AuthError::TargetForbidden
            | AuthError::SelfModification(_) => ErrorKind::Forbidden,
            AuthError::UserNotFound | AuthError::NotAvailable | AuthError::NoEmailsFound => {
                ErrorKind::NotFound
            }
            AuthError::Activity(e) => e.kind(),
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self.action() {
            Some(action) => err.with_action(action),
            None => err,
        }
    }

    /// What the caller can do about it, when the next step is obvious
    fn action(&self) -> Option<&'static str> {
        match self {
            AuthError::InvalidOrExpiredCode => Some("Request a new code and try again"),
            AuthError::EmailNotConfirmed => Some("Confirm your email with the code sent at signup"),
            AuthError::MissingToken | AuthError::InvalidToken => Some("Log in again"),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Activity(e) if e.kind().is_server_error() => {
                tracing::error!(error = %e, "Activity store error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken | AuthError::InactiveOrUnknownUser => {
                tracing::warn!(error = %self, "Rejected bearer token");
            }
            AuthError::InsufficientRole
            | AuthError::DeveloperRoleRestricted
            | AuthError::DeveloperAccountProtected
            | AuthError::TargetForbidden
            | AuthError::SelfModification(_) => {
                tracing::warn!(error = %self, "Authorization denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// Value objects validate into `AppError`; client errors keep their message.
impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.is_client_error() {
            AuthError::InvalidInput(err.message().to_string())
        } else {
            AuthError::Internal(err.to_string())
        }
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::InvalidInput(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
