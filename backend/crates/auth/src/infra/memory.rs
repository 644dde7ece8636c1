//! In-memory Store
//!
//! Fallback when no database is reachable at startup, and the store the
//! HTTP tests run against. Same contract and error shapes as `PgStore`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use audit::{
    ActivityFilter, ActivityLog, ActivityLogRepository, AuditResult,
    InMemoryActivityLogRepository, Page,
};
use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::UserId;
use tokio::sync::RwLock;

use crate::domain::entity::user::User;
use crate::domain::repository::{RevokedTokenRepository, UserFilter, UserRepository};
use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    /// jti -> token expiry
    revoked: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    activity: InMemoryActivityLogRepository,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The activity half, e.g. to simulate an outage
    pub fn activity(&self) -> &InMemoryActivityLogRepository {
        &self.activity
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) || users.contains_key(&user.user_id) {
            return Err(AuthError::UserAlreadyExists);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn create_claiming_first(&self, user: &User) -> AuthResult<UserRole> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) || users.contains_key(&user.user_id) {
            return Err(AuthError::UserAlreadyExists);
        }
        let mut stored = user.clone();
        if users.is_empty() {
            stored.role = UserRole::Developer;
        }
        let role = stored.role;
        users.insert(stored.user_id, stored);
        Ok(role)
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> AuthResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list(&self, filter: &UserFilter) -> AuthResult<Vec<User>> {
        let mut matched: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(matched)
    }

    async fn count_by_role(&self) -> AuthResult<Vec<(UserRole, u64)>> {
        let users = self.users.read().await;
        Ok(UserRole::ALL
            .into_iter()
            .map(|role| (role, users.values().filter(|u| u.role == role).count() as u64))
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn registrations_since(&self, since: DateTime<Utc>) -> AuthResult<Vec<(NaiveDate, u64)>> {
        let users = self.users.read().await;
        let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for user in users.values().filter(|u| u.registered_at >= since) {
            *per_day.entry(user.registered_at.date_naive()).or_default() += 1;
        }
        Ok(per_day.into_iter().collect())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        let slot = users.get_mut(&user.user_id).ok_or(AuthError::UserNotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        Ok(self.users.write().await.remove(user_id).is_some())
    }
}

// ============================================================================
// Revoked Token Repository Implementation
// ============================================================================

impl RevokedTokenRepository for MemoryStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        self.revoked.write().await.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        Ok(self.revoked.read().await.contains_key(jti))
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut revoked = self.revoked.write().await;
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - revoked.len()) as u64)
    }
}

// ============================================================================
// Activity Log Repository (delegated)
// ============================================================================

impl ActivityLogRepository for MemoryStore {
    async fn append(&self, log: &ActivityLog) -> AuditResult<()> {
        self.activity.append(log).await
    }

    async fn find(&self, filter: &ActivityFilter, page: Page) -> AuditResult<Vec<ActivityLog>> {
        self.activity.find(filter, page).await
    }

    async fn count(&self, filter: &ActivityFilter) -> AuditResult<u64> {
        self.activity.count(filter).await
    }

    async fn recent(&self, limit: u64) -> AuditResult<Vec<ActivityLog>> {
        self.activity.recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_name::UserName;
    use chrono::Duration;
    use platform::password::{ClearTextPassword, HashCost};

    fn user(name: &str, email: &str, role: UserRole, at: DateTime<Utc>) -> User {
        let hash = ClearTextPassword::new("pw".into(), 1)
            .unwrap()
            .hash(HashCost::minimal(), None)
            .unwrap();
        User::register(
            UserName::new(name).unwrap(),
            Email::new(email).unwrap(),
            hash,
            role,
            at,
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let now = Utc::now();
        UserRepository::create(&store, &user("A", "a@x.com", UserRole::Student, now))
            .await
            .unwrap();

        let dup = UserRepository::create(&store, &user("B", "A@X.com", UserRole::Student, now)).await;
        assert!(matches!(dup, Err(AuthError::UserAlreadyExists)));
        let all = UserRepository::list(&store, &UserFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_only_first_insert_claims_developer() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let first = UserRepository::create_claiming_first(
            &store,
            &user("A", "a@x.com", UserRole::Student, now),
        )
        .await
        .unwrap();
        let second = UserRepository::create_claiming_first(
            &store,
            &user("B", "b@x.com", UserRole::Student, now),
        )
        .await
        .unwrap();
        assert_eq!(first, UserRole::Developer);
        assert_eq!(second, UserRole::Student);

        let stored = UserRepository::find_by_email(&store, &Email::new("a@x.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, UserRole::Developer);

        let dup = UserRepository::create_claiming_first(
            &store,
            &user("C", "A@x.com", UserRole::Student, now),
        )
        .await;
        assert!(matches!(dup, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_counts() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (i, role) in [UserRole::Student, UserRole::Student, UserRole::Teacher]
            .into_iter()
            .enumerate()
        {
            let u = user(
                &format!("U{i}"),
                &format!("u{i}@x.com"),
                role,
                now - Duration::days(i as i64),
            );
            UserRepository::create(&store, &u).await.unwrap();
        }

        let all = UserRepository::list(&store, &UserFilter::default()).await.unwrap();
        assert_eq!(all[0].name.as_str(), "U0");
        assert_eq!(all[2].name.as_str(), "U2");

        let counts = UserRepository::count_by_role(&store).await.unwrap();
        assert_eq!(counts, vec![(UserRole::Teacher, 1), (UserRole::Student, 2)]);

        let days = UserRepository::registrations_since(&store, now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(days.iter().map(|(_, c)| c).sum::<u64>(), 3);
        assert!(days.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_update_requires_existing_user() {
        let store = MemoryStore::new();
        let ghost = user("G", "g@x.com", UserRole::Student, Utc::now());
        assert!(matches!(
            UserRepository::update(&store, &ghost).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(!UserRepository::delete(&store, &ghost.user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_revocation_expires() {
        let store = MemoryStore::new();
        let now = Utc::now();
        RevokedTokenRepository::revoke(&store, "live", now + Duration::hours(1))
            .await
            .unwrap();
        RevokedTokenRepository::revoke(&store, "stale", now - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(RevokedTokenRepository::cleanup_expired(&store).await.unwrap(), 1);
        assert!(RevokedTokenRepository::is_revoked(&store, "live").await.unwrap());
        assert!(!RevokedTokenRepository::is_revoked(&store, "stale").await.unwrap());
    }
}
