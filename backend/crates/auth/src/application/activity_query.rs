//! Activity Queries
//!
//! Read side of the audit trail for the admin surface. Records come back
//! newest first with their subject and actor resolved to users where
//! those still exist.

use std::collections::HashMap;
use std::sync::Arc;

use audit::{ActivityFilter, ActivityLog, ActivityLogRepository, Page};
use chrono::{Duration, NaiveDate, Utc};
use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::UserRole;
use crate::error::AuthResult;

pub const DEFAULT_USER_ACTIVITY_LIMIT: u64 = 50;
pub const DEFAULT_ACTIVITY_PAGE_LIMIT: u64 = 100;
pub const MAX_ACTIVITY_LIMIT: u64 = 1000;
pub const DASHBOARD_RECENT: u64 = 10;
pub const DASHBOARD_REGISTRATION_DAYS: i64 = 30;

/// A record with its subject and actor looked up
#[derive(Debug, Clone)]
pub struct PopulatedLog {
    pub log: ActivityLog,
    /// `None` once the user has been deleted
    pub subject: Option<User>,
    pub performed_by: Option<User>,
}

/// One page of the global trail
#[derive(Debug, Clone)]
pub struct ActivityPage {
    pub logs: Vec<PopulatedLog>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl ActivityPage {
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(self.limit.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub user_counts: Vec<(UserRole, u64)>,
    pub recent_activity: Vec<PopulatedLog>,
    pub registrations: Vec<(NaiveDate, u64)>,
}

pub struct ActivityQueryUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository,
{
    user_repo: Arc<U>,
    activity_repo: Arc<A>,
}

impl<U, A> ActivityQueryUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository,
{
    pub fn new(user_repo: Arc<U>, activity_repo: Arc<A>) -> Self {
        Self {
            user_repo,
            activity_repo,
        }
    }

    /// Records about one user
    pub async fn for_user(
        &self,
        subject: UserId,
        mut filter: ActivityFilter,
        limit: u64,
    ) -> AuthResult<Vec<PopulatedLog>> {
        filter.subject = Some(subject);
        let logs = self
            .activity_repo
            .find(&filter, Page::first(clamp_limit(limit)))
            .await?;
        self.populate(logs).await
    }

    /// Paginated trail across all users; `page` is 1-based
    pub async fn all(&self, filter: &ActivityFilter, page: u64, limit: u64) -> AuthResult<ActivityPage> {
        let page = page.max(1);
        let limit = clamp_limit(limit);

        let logs = self
            .activity_repo
            .find(filter, Page::numbered(page, limit))
            .await?;
        let total = self.activity_repo.count(filter).await?;

        Ok(ActivityPage {
            logs: self.populate(logs).await?,
            total,
            page,
            limit,
        })
    }

    pub async fn dashboard(&self) -> AuthResult<Dashboard> {
        let user_counts = self.user_repo.count_by_role().await?;
        let recent = self.activity_repo.recent(DASHBOARD_RECENT).await?;
        let since = Utc::now() - Duration::days(DASHBOARD_REGISTRATION_DAYS);
        let registrations = self.user_repo.registrations_since(since).await?;

        Ok(Dashboard {
            user_counts,
            recent_activity: self.populate(recent).await?,
            registrations,
        })
    }

    async fn populate(&self, logs: Vec<ActivityLog>) -> AuthResult<Vec<PopulatedLog>> {
        let mut ids: Vec<UserId> = logs
            .iter()
            .flat_map(|log| [log.subject_user_id(), log.performed_by()])
            .collect();
        ids.sort_by_key(|id| *id.as_uuid());
        ids.dedup();

        let users: HashMap<UserId, User> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.user_id, u))
            .collect();

        Ok(logs
            .into_iter()
            .map(|log| PopulatedLog {
                subject: users.get(&log.subject_user_id()).cloned(),
                performed_by: users.get(&log.performed_by()).cloned(),
                log,
            })
            .collect())
    }
}

/// 1..=MAX_ACTIVITY_LIMIT
pub fn clamp_limit(limit: u64) -> u64 {
    limit.clamp(1, MAX_ACTIVITY_LIMIT)
}
