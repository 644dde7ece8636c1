//! Developer Seeding
//!
//! Creates a confirmed Developer account at startup so an in-memory
//! deployment can be administered without going through signup.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::credentials::CredentialService;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName, user_role::UserRole};
use crate::error::AuthResult;

pub const SEED_DEVELOPER_NAME: &str = "Developer";

/// Returns false when an account with `email` already exists
pub async fn seed_developer<U>(
    user_repo: &U,
    config: Arc<AuthConfig>,
    email: &str,
    password: String,
) -> AuthResult<bool>
where
    U: UserRepository,
{
    let email = Email::new(email)?;
    if user_repo.find_by_email(&email).await?.is_some() {
        return Ok(false);
    }

    let password_hash = CredentialService::new(config).hash_password(password)?;
    let now = Utc::now();
    let mut user = User::register(
        UserName::new(SEED_DEVELOPER_NAME)?,
        email,
        password_hash,
        UserRole::Developer,
        now,
    );
    user.is_confirmed = true;
    user.confirmation = None;

    user_repo.create(&user).await?;
    tracing::info!(user_id = %user.user_id, "Seeded developer account");
    Ok(true)
}
