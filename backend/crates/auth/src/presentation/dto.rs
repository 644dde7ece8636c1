//! API DTOs (Data Transfer Objects)

use audit::{ActivityFilter, ActivityLog, ActivityType};
use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::activity_query::{ActivityPage, Dashboard, PopulatedLog};
use crate::domain::entity::user::User;
use crate::domain::repository::UserFilter;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Generic
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Account lifecycle
// ============================================================================

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmSignUpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of reset request and confirmation resend
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub token: String,
}

// ============================================================================
// Users
// ============================================================================

/// Short form used in login responses and populated activity records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
        }
    }
}

/// Full profile; never carries the password hash or a code
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_confirmed: bool,
    pub registration_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            is_active: user.is_active,
            is_confirmed: user.is_confirmed,
            registration_date: user.registered_at,
            updated_at: user.updated_at,
        }
    }
}

pub fn user_responses(users: &[User]) -> Vec<UserResponse> {
    users.iter().map(UserResponse::from).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub is_active: bool,
}

/// `GET /admin/users` query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub role: Option<String>,
    /// Only the literal `"true"` means active
    pub is_active: Option<String>,
    pub search: Option<String>,
}

impl UserListQuery {
    pub fn to_filter(&self) -> AuthResult<UserFilter> {
        let role = non_empty(&self.role)
            .map(|r| r.parse::<UserRole>())
            .transpose()?;

        Ok(UserFilter {
            role,
            is_active: self.is_active.as_deref().map(|v| v == "true"),
            search: non_empty(&self.search).map(str::to_string),
        })
    }
}

// ============================================================================
// Activity
// ============================================================================

/// A user reference that is populated when the user still exists
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Populated(UserSummary),
    Id(String),
}

impl UserRef {
    fn new(id: UserId, user: Option<&User>) -> Self {
        match user {
            Some(user) => UserRef::Populated(user.into()),
            None => UserRef::Id(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogResponse {
    pub id: String,
    pub user_id: UserRef,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub details: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub performed_by: UserRef,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLogResponse {
    fn build(log: &ActivityLog, subject: Option<&User>, actor: Option<&User>) -> Self {
        Self {
            id: log.id().to_string(),
            user_id: UserRef::new(log.subject_user_id(), subject),
            activity_type: log.activity_type().clone(),
            details: Value::Object(log.details().clone()),
            ip_address: log.ip_address().map(str::to_string),
            user_agent: log.user_agent().map(str::to_string),
            performed_by: UserRef::new(log.performed_by(), actor),
            timestamp: log.timestamp(),
        }
    }

    /// Subject and actor as bare ids
    pub fn plain(log: &ActivityLog) -> Self {
        Self::build(log, None, None)
    }

    /// Only the actor populated, as the per-user listing shows it
    pub fn with_actor(populated: &PopulatedLog) -> Self {
        Self::build(&populated.log, None, populated.performed_by.as_ref())
    }

    pub fn populated(populated: &PopulatedLog) -> Self {
        Self::build(
            &populated.log,
            populated.subject.as_ref(),
            populated.performed_by.as_ref(),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityPageResponse {
    pub logs: Vec<ActivityLogResponse>,
    pub pagination: Pagination,
}

impl From<&ActivityPage> for ActivityPageResponse {
    fn from(page: &ActivityPage) -> Self {
        Self {
            logs: page.logs.iter().map(ActivityLogResponse::populated).collect(),
            pagination: Pagination {
                total: page.total,
                page: page.page,
                limit: page.limit,
                pages: page.pages(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleCount {
    pub role: UserRole,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user_counts: Vec<RoleCount>,
    pub recent_activity: Vec<ActivityLogResponse>,
    pub registrations: Vec<DailyCount>,
}

impl From<&Dashboard> for DashboardResponse {
    fn from(dashboard: &Dashboard) -> Self {
        Self {
            user_counts: dashboard
                .user_counts
                .iter()
                .map(|&(role, count)| RoleCount { role, count })
                .collect(),
            recent_activity: dashboard
                .recent_activity
                .iter()
                .map(ActivityLogResponse::populated)
                .collect(),
            registrations: dashboard
                .registrations
                .iter()
                .map(|&(date, count)| DailyCount { date, count })
                .collect(),
        }
    }
}

/// `GET /admin/users/{id}/activity` query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityQuery {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u64>,
}

impl UserActivityQuery {
    pub fn to_filter(&self) -> AuthResult<ActivityFilter> {
        Ok(ActivityFilter {
            subject: None,
            activity_type: non_empty(&self.activity_type).map(ActivityType::from_db),
            since: parse_date_param(&self.start_date)?,
            until: parse_date_param(&self.end_date)?,
        })
    }
}

/// `GET /admin/activity` query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub user: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ActivityQuery {
    pub fn to_filter(&self) -> AuthResult<ActivityFilter> {
        let subject = non_empty(&self.user)
            .map(|id| {
                id.parse::<UserId>()
                    .map_err(|_| AuthError::InvalidInput(format!("Invalid user id: {id}")))
            })
            .transpose()?;

        Ok(ActivityFilter {
            subject,
            activity_type: non_empty(&self.activity_type).map(ActivityType::from_db),
            since: parse_date_param(&self.start_date)?,
            until: parse_date_param(&self.end_date)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitActivityRequest {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitActivityResponse {
    pub message: String,
    pub log: ActivityLogResponse,
}

// ============================================================================
// Development outbox
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestCodeResponse {
    pub email: String,
    pub subject: String,
    pub code: Option<String>,
    pub sent_at: DateTime<Utc>,
}

// ============================================================================
// Helpers
// ============================================================================

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// RFC 3339, or a bare `YYYY-MM-DD` meaning midnight UTC
pub fn parse_date(raw: &str) -> AuthResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AuthError::InvalidInput(format!("Invalid date: {raw}")))
}

fn parse_date_param(value: &Option<String>) -> AuthResult<Option<DateTime<Utc>>> {
    non_empty(value).map(parse_date).transpose()
}
