//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::AuthResult;

/// User listing filter; `None` fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring over name and email
    pub search: Option<String>,
}

impl UserFilter {
    pub fn role(role: UserRole) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        let search_hit = self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            user.name.contains_ignore_case(&needle) || user.email.as_str().contains(&needle)
        });

        self.role.is_none_or(|r| r == user.role)
            && self.is_active.is_none_or(|a| a == user.is_active)
            && search_hit
    }
}

/// Identity Store
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user; a taken email yields `AuthError::UserAlreadyExists`
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Like [`create`](LocalUserRepository::create), but the user is stored
    /// as Developer when no other user exists yet. Checking for emptiness
    /// and inserting happen as one step, so concurrent signups cannot both
    /// claim the first account. Returns the role actually stored.
    async fn create_claiming_first(&self, user: &User) -> AuthResult<UserRole>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Users among `ids`; missing ids are skipped
    async fn find_by_ids(&self, ids: &[UserId]) -> AuthResult<Vec<User>>;

    /// Matching users, newest registration first
    async fn list(&self, filter: &UserFilter) -> AuthResult<Vec<User>>;

    /// Per-role totals; roles without users are omitted
    async fn count_by_role(&self) -> AuthResult<Vec<(UserRole, u64)>>;

    /// Registrations per UTC day since `since`, oldest day first
    async fn registrations_since(&self, since: DateTime<Utc>) -> AuthResult<Vec<(NaiveDate, u64)>>;

    /// The single write path for every change after creation
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Returns false when no such user existed
    async fn delete(&self, user_id: &UserId) -> AuthResult<bool>;
}

/// Denylist of logged-out session tokens, keyed by token id
#[trait_variant::make(RevokedTokenRepository: Send)]
pub trait LocalRevokedTokenRepository {
    /// Keep `jti` revoked until `expires_at`
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AuthResult<()>;

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool>;

    /// Drop entries whose token has expired anyway
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::{ClearTextPassword, HashCost};
    use crate::domain::value_object::user_name::UserName;

    fn user(name: &str, email: &str, role: UserRole) -> User {
        let hash = ClearTextPassword::new("pw".into(), 1)
            .unwrap()
            .hash(HashCost::minimal(), None)
            .unwrap();
        User::register(
            UserName::new(name).unwrap(),
            Email::new(email).unwrap(),
            hash,
            role,
            Utc::now(),
        )
    }

    #[test]
    fn test_filter_by_role_and_status() {
        let mut teacher = user("Ravi", "ravi@school.in", UserRole::Teacher);
        assert!(UserFilter::role(UserRole::Teacher).matches(&teacher));
        assert!(!UserFilter::role(UserRole::Student).matches(&teacher));

        teacher.is_active = false;
        let active_only = UserFilter {
            is_active: Some(true),
            ..Default::default()
        };
        assert!(!active_only.matches(&teacher));
    }

    #[test]
    fn test_search_over_name_and_email() {
        let u = user("Kavya Menon", "kavya@prep.org", UserRole::Student);
        let by = |s: &str| UserFilter {
            search: Some(s.to_string()),
            ..Default::default()
        };
        assert!(by("MENON").matches(&u));
        assert!(by("prep.org").matches(&u));
        assert!(!by("rahul").matches(&u));
    }
}
