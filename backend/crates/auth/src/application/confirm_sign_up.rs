//! Confirm Sign Up Use Case
//!
//! Consumes the signup code. Every failure looks the same to the caller:
//! unknown email, wrong code, expired code and replay all answer
//! `InvalidOrExpiredCode`.

use std::sync::Arc;

use audit::{ActivityLogRepository, ActivityType, AuditEntry, AuditRecorder};
use chrono::Utc;
use platform::client::RequestContext;
use serde_json::json;

use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub struct ConfirmSignUpInput {
    pub email: String,
    pub code: String,
}

pub struct ConfirmSignUpUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    recorder: AuditRecorder<A>,
}

impl<U, A> ConfirmSignUpUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, recorder: AuditRecorder<A>) -> Self {
        Self {
            user_repo,
            recorder,
        }
    }

    pub async fn execute(&self, input: ConfirmSignUpInput, context: &RequestContext) -> AuthResult<()> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidOrExpiredCode)?;
        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidOrExpiredCode)?;

        if !user.confirm(&input.code, Utc::now()) {
            tracing::debug!(user_id = %user.user_id, "Confirmation code rejected");
            return Err(AuthError::InvalidOrExpiredCode);
        }

        self.user_repo.update(&user).await?;

        self.recorder.record(
            AuditEntry::by_self(user.user_id, ActivityType::Signup)
                .details(json!({ "confirmed": true }))
                .context(context),
        );

        tracing::info!(user_id = %user.user_id, "Signup confirmed");
        Ok(())
    }
}
