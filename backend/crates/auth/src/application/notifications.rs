//! Code Emails
//!
//! Dispatch never fails the calling flow. The returned flag says whether
//! the message left, and callers put it into their audit details.

use platform::mail::{EmailMessage, MailTransport, Mailer};

use crate::domain::value_object::{confirmation_code::ConfirmationCode, email::Email};

pub const CONFIRMATION_SUBJECT: &str = "Confirm Your JEE/NEET Prep Account";
pub const RESET_SUBJECT: &str = "Reset Your Password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeEmail {
    Confirmation,
    ConfirmationResend,
    PasswordReset,
}

impl CodeEmail {
    fn message(self, to: &Email, code: &ConfirmationCode) -> EmailMessage {
        let (subject, lead) = match self {
            CodeEmail::Confirmation => (CONFIRMATION_SUBJECT, "Your confirmation code is"),
            CodeEmail::ConfirmationResend => (CONFIRMATION_SUBJECT, "Your new confirmation code is"),
            CodeEmail::PasswordReset => (RESET_SUBJECT, "Your password reset code is"),
        };
        let body = format!(
            "{lead}: {code}\n\nThis code expires in 30 minutes.",
            code = code.as_str()
        );
        EmailMessage::new(to.as_str(), subject, body)
    }
}

/// Send a code email; returns whether it was dispatched
pub async fn send_code(mailer: &Mailer, kind: CodeEmail, to: &Email, code: &ConfirmationCode) -> bool {
    match mailer.send(&kind.message(to, code)).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, to = %to, kind = ?kind, "Code email not dispatched");
            false
        }
    }
}

/// Digits following "code is: " in a code email body
pub fn extract_code(body: &str) -> Option<&str> {
    let (_, rest) = body.split_once("code is: ")?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}
