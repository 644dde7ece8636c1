//! Sign Up Use Case
//!
//! Registers an unconfirmed account and mails its confirmation code.

use std::sync::Arc;

use audit::{ActivityLogRepository, ActivityType, AuditEntry, AuditRecorder};
use chrono::Utc;
use platform::client::RequestContext;
use platform::mail::Mailer;
use serde_json::json;

use crate::application::config::AuthConfig;
use crate::application::credentials::CredentialService;
use crate::application::notifications::{CodeEmail, send_code};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user: User,
    pub email_dispatched: bool,
}

/// Sign up use case
pub struct SignUpUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    recorder: AuditRecorder<A>,
    mailer: Mailer,
    config: Arc<AuthConfig>,
}

impl<U, A> SignUpUseCase<U, A>
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

    pub async fn execute(
        &self,
        input: SignUpInput,
        context: &RequestContext,
    ) -> AuthResult<SignUpOutput> {
        let name = UserName::new(&input.name)?;
        let email = Email::new(&input.email)?;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let role = self.requested_role(&email);
        let password_hash = CredentialService::new(self.config.clone()).hash_password(input.password)?;

        let mut user = User::register(name, email, password_hash, role, Utc::now());
        user.role = self.user_repo.create_claiming_first(&user).await?;

        let email_dispatched = match &user.confirmation {
            Some(code) => send_code(&self.mailer, CodeEmail::Confirmation, &user.email, code).await,
            None => false,
        };

        self.recorder.record(
            AuditEntry::by_self(user.user_id, ActivityType::Signup)
                .details(json!({
                    "name": user.name.as_str(),
                    "email": user.email.as_str(),
                    "emailDispatched": email_dispatched,
                }))
                .context(context),
        );

        tracing::info!(
            user_id = %user.user_id,
            role = %user.role,
            "User registered"
        );

        Ok(SignUpOutput {
            user,
            email_dispatched,
        })
    }

    /// Developer for an allow-listed email. The store promotes the very
    /// first account itself.
    fn requested_role(&self, email: &Email) -> UserRole {
        if email.is_listed_in(&self.config.developer_emails) {
            UserRole::Developer
        } else {
            UserRole::Student
        }
    }
}
