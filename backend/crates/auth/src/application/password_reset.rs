//! Password Reset Use Cases
//!
//! The reset code shares the confirmation code slot, so requesting a
//! reset replaces any outstanding signup code and vice versa.

use std::sync::Arc;

use audit::{ActivityLogRepository, ActivityType, AuditEntry, AuditRecorder};
use chrono::Utc;
use platform::client::RequestContext;
use platform::mail::Mailer;
use serde_json::json;

use crate::application::config::AuthConfig;
use crate::application::credentials::CredentialService;
use crate::application::notifications::{CodeEmail, send_code};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// What happened to a reset request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    /// A code was issued; whether it was mailed
    CodeIssued { email_dispatched: bool },
    /// Nothing was done, but the caller gets the same answer
    Suppressed,
}

pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub struct PasswordResetUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    recorder: AuditRecorder<A>,
    mailer: Mailer,
    config: Arc<AuthConfig>,
}

impl<U, A> PasswordResetUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        recorder: AuditRecorder<A>,
        mailer: Mailer,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            recorder,
            mailer,
            config,
        }
    }

    /// Issue a reset code for a confirmed account.
    ///
    /// Unknown and unconfirmed emails are reported as errors only when
    /// `reset_discloses_unknown_email` is set.
    pub async fn request(&self, email: &str, context: &RequestContext) -> AuthResult<ResetRequestOutcome> {
        let disclose = self.config.reset_discloses_unknown_email;
        let email = Email::new(email)?;

        let Some(mut user) = self.user_repo.find_by_email(&email).await? else {
            if disclose {
                return Err(AuthError::UserNotFound);
            }
            tracing::debug!("Password reset requested for unknown email");
            return Ok(ResetRequestOutcome::Suppressed);
        };

        // An unconfirmed account keeps its signup code
        if !user.is_confirmed {
            if disclose {
                return Err(AuthError::EmailNotConfirmed);
            }
            return Ok(ResetRequestOutcome::Suppressed);
        }

        let code = user.issue_code(Utc::now());
        self.user_repo.update(&user).await?;

        let email_dispatched =
            send_code(&self.mailer, CodeEmail::PasswordReset, &user.email, &code).await;

        self.recorder.record(
            AuditEntry::by_self(user.user_id, ActivityType::PasswordReset)
                .details(json!({
                    "requested": true,
                    "emailDispatched": email_dispatched,
                }))
                .context(context),
        );

        tracing::info!(user_id = %user.user_id, "Password reset requested");
        Ok(ResetRequestOutcome::CodeIssued { email_dispatched })
    }

    /// Consume a reset code and store the new password
    pub async fn reset(&self, input: ResetPasswordInput, context: &RequestContext) -> AuthResult<()> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidOrExpiredCode)?;
        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .filter(|u| u.is_confirmed)
            .ok_or(AuthError::InvalidOrExpiredCode)?;

        // Code before hashing, so a wrong guess costs no Argon2 work.
        // The code is only consumed once the password passes policy.
        let now = Utc::now();
        if !user.code_matches(&input.code, now) {
            return Err(AuthError::InvalidOrExpiredCode);
        }
        let password_hash = CredentialService::new(self.config.clone()).hash_password(input.new_password)?;
        if !user.consume_code(&input.code, now) {
            return Err(AuthError::InvalidOrExpiredCode);
        }
        user.set_password(password_hash, now);
        self.user_repo.update(&user).await?;

        self.recorder.record(
            AuditEntry::by_self(user.user_id, ActivityType::PasswordReset)
                .details(json!({ "completed": true }))
                .context(context),
        );

        tracing::info!(user_id = %user.user_id, "Password reset completed");
        Ok(())
    }
}
