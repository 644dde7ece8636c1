//! Sign In Use Case
//!
//! Authenticates by email and password and issues a session token.
//!
//! Checks run in a fixed order: account exists and is active, email is
//! confirmed, password matches. Only the confirmation failure has its own
//! message; the others are indistinguishable, in content and in the
//! password hashing work done before answering.

use std::sync::Arc;

use audit::{ActivityLogRepository, ActivityType, AuditEntry, AuditRecorder};
use chrono::Utc;
use platform::client::RequestContext;
use serde_json::json;

use crate::application::config::AuthConfig;
use crate::application::credentials::{CredentialService, IssuedToken};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user: User,
    pub token: IssuedToken,
}

/// Sign in use case
pub struct SignInUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    recorder: AuditRecorder<A>,
    config: Arc<AuthConfig>,
}

impl<U, A> SignInUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, recorder: AuditRecorder<A>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            recorder,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        context: &RequestContext,
    ) -> AuthResult<SignInOutput> {
        let credentials = CredentialService::new(self.config.clone());

        let account = match Email::new(&input.email) {
            Ok(email) => self.user_repo.find_by_email(&email).await?,
            Err(_) => None,
        };
        let Some(mut user) = account.filter(|u| u.is_active) else {
            credentials.verify_against_decoy(input.password);
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        if !credentials.verify_password(&user.password_hash, input.password.clone()) {
            tracing::warn!(user_id = %user.user_id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();

        // Cost parameters changed since this hash was made
        if let Some(rehashed) = credentials.rehash_if_needed(&user.password_hash, input.password) {
            user.set_password(rehashed, now);
            self.user_repo.update(&user).await?;
            tracing::info!(user_id = %user.user_id, "Password hash upgraded");
        }

        let token = credentials.issue_token(&user, now)?;

        self.recorder.record(
            AuditEntry::by_self(user.user_id, ActivityType::Login)
                .details(json!({
                    "ipAddress": context.ip_string(),
                    "userAgent": context.user_agent,
                }))
                .context(context),
        );

        tracing::info!(
            user_id = %user.user_id,
            role = %user.role,
            "User signed in"
        );

        Ok(SignInOutput { user, token })
    }
}
