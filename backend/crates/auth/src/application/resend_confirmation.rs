//! Resend Confirmation Use Case

use std::sync::Arc;

use audit::{ActivityLogRepository, ActivityType, AuditEntry, AuditRecorder};
use chrono::Utc;
use platform::client::RequestContext;
use platform::mail::Mailer;
use serde_json::json;

use crate::application::notifications::{CodeEmail, send_code};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub struct ResendConfirmationUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    recorder: AuditRecorder<A>,
    mailer: Mailer,
}

impl<U, A> ResendConfirmationUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, recorder: AuditRecorder<A>, mailer: Mailer) -> Self {
        Self {
            user_repo,
            recorder,
            mailer,
        }
    }

    /// Replace the outstanding code and mail the new one.
    ///
    /// Returns whether the email was dispatched.
    pub async fn execute(&self, email: &str, context: &RequestContext) -> AuthResult<bool> {
        let email = Email::new(email)?;
        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }

        let code = user.issue_code(Utc::now());
        self.user_repo.update(&user).await?;

        let email_dispatched =
            send_code(&self.mailer, CodeEmail::ConfirmationResend, &user.email, &code).await;

        self.recorder.record(
            AuditEntry::by_self(user.user_id, ActivityType::ConfirmationResend)
                .details(json!({
                    "email": user.email.as_str(),
                    "emailDispatched": email_dispatched,
                }))
                .context(context),
        );

        tracing::info!(user_id = %user.user_id, "Confirmation code reissued");
        Ok(email_dispatched)
    }
}
