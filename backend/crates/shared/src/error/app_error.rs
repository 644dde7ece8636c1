//! [`AppError`]: the error every context renders at the HTTP boundary

use std::borrow::Cow;
use std::fmt;

use super::kind::ErrorKind;

/// Replaces the message of any 5xx error in response bodies.
pub const GENERIC_SERVER_MESSAGE: &str = "Server error";

/// Classified, caller-facing failure.
///
/// Value objects build these directly; the context error enums
/// (`AuthError`, `AuditError`) convert into one just before responding.
/// `action` tells the caller what to do next, when there is something.
///
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::BadRequest, "Invalid or expired code")
///     .with_action("Request a new confirmation code");
/// assert_eq!(err.status_code(), 400);
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    action: Option<Cow<'static, str>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
        }
    }

    /// Shorthand for input validation failures
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message for response bodies; 5xx detail stays in the logs.
    pub fn public_message(&self) -> &str {
        if self.kind.is_server_error() {
            GENERIC_SERVER_MESSAGE
        } else {
            &self.message
        }
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn is_client_error(&self) -> bool {
        self.kind.is_client_error()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}
