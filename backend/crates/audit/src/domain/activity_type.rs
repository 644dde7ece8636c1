use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{AuditError, AuditResult};

/// Kind of recorded action
///
/// A closed set. [`ActivityType::Unrecognized`] only exists so that
/// tolerant mode can keep a record whose type came from outside the
/// server (client submissions, rows written by a newer build).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityType {
    // Authentication
    Login,
    Logout,
    Signup,
    PasswordReset,
    ConfirmationResend,

    // User management
    UserCreated,
    UserUpdated,
    UserDeleted,
    RoleChanged,
    StatusChanged,
    UserManagement,

    // Content
    TestStarted,
    TestSubmitted,
    QuestionAdded,
    QuestionUpdated,
    QuestionDeleted,

    // Educational
    ChapterViewed,
    ChapterCompleted,
    ProgressUpdated,

    Unrecognized(String),
}

impl ActivityType {
    pub const ALL: [ActivityType; 19] = [
        ActivityType::Login,
        ActivityType::Logout,
        ActivityType::Signup,
        ActivityType::PasswordReset,
        ActivityType::ConfirmationResend,
        ActivityType::UserCreated,
        ActivityType::UserUpdated,
        ActivityType::UserDeleted,
        ActivityType::RoleChanged,
        ActivityType::StatusChanged,
        ActivityType::UserManagement,
        ActivityType::TestStarted,
        ActivityType::TestSubmitted,
        ActivityType::QuestionAdded,
        ActivityType::QuestionUpdated,
        ActivityType::QuestionDeleted,
        ActivityType::ChapterViewed,
        ActivityType::ChapterCompleted,
        ActivityType::ProgressUpdated,
    ];

    pub fn code(&self) -> &str {
        use ActivityType::*;
        match self {
            Login => "login",
            Logout => "logout",
            Signup => "signup",
            PasswordReset => "password_reset",
            ConfirmationResend => "confirmation_resend",
            UserCreated => "user_created",
            UserUpdated => "user_updated",
            UserDeleted => "user_deleted",
            RoleChanged => "role_changed",
            StatusChanged => "status_changed",
            UserManagement => "user_management",
            TestStarted => "test_started",
            TestSubmitted => "test_submitted",
            QuestionAdded => "question_added",
            QuestionUpdated => "question_updated",
            QuestionDeleted => "question_deleted",
            ChapterViewed => "chapter_viewed",
            ChapterCompleted => "chapter_completed",
            ProgressUpdated => "progress_updated",
            Unrecognized(code) => code,
        }
    }

    /// Known type for `code`, if any
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Parse a type supplied from outside the server.
    ///
    /// Strict mode rejects unknown codes; tolerant mode keeps them as
    /// [`ActivityType::Unrecognized`] and logs a warning.
    pub fn parse(code: &str, strict: bool) -> AuditResult<Self> {
        let code = code.trim();
        if let Some(known) = Self::from_code(code) {
            return Ok(known);
        }

        if strict || code.is_empty() {
            return Err(AuditError::InvalidActivityType(code.to_string()));
        }

        tracing::warn!(activity_type = %code, "Storing unrecognized activity type");
        Ok(ActivityType::Unrecognized(code.to_string()))
    }

    /// Restore from a stored value; never fails
    pub fn from_db(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| ActivityType::Unrecognized(code.to_string()))
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ActivityType::Unrecognized(_))
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ActivityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
