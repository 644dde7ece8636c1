//! PostgreSQL Activity Log Store

use chrono::{DateTime, Utc};
use kernel::id::{ActivityLogId, UserId};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::activity_log::{ActivityLog, Details, details_from_value};
use crate::domain::activity_type::ActivityType;
use crate::domain::filter::{ActivityFilter, Page};
use crate::domain::repository::ActivityLogRepository;
use crate::error::AuditResult;

#[derive(Clone)]
pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Unset filter fields bind as NULL and drop out of the predicate.
const FILTER_PREDICATE: &str = r#"
    ($1::uuid IS NULL OR subject_user_id = $1)
    AND ($2::text IS NULL OR activity_type = $2)
    AND ($3::timestamptz IS NULL OR occurred_at >= $3)
    AND ($4::timestamptz IS NULL OR occurred_at <= $4)
"#;

impl ActivityLogRepository for PgActivityLogRepository {
    async fn append(&self, log: &ActivityLog) -> AuditResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (
                activity_log_id,
                subject_user_id,
                activity_type,
                details,
                ip_address,
                user_agent,
                performed_by,
                occurred_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id().as_uuid())
        .bind(log.subject_user_id().as_uuid())
        .bind(log.activity_type().code())
        .bind(Json(log.details()))
        .bind(log.ip_address())
        .bind(log.user_agent())
        .bind(log.performed_by().as_uuid())
        .bind(log.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, filter: &ActivityFilter, page: Page) -> AuditResult<Vec<ActivityLog>> {
        let sql = format!(
            r#"
            SELECT
                activity_log_id,
                subject_user_id,
                activity_type,
                details,
                ip_address,
                user_agent,
                performed_by,
                occurred_at
            FROM activity_logs
            WHERE {FILTER_PREDICATE}
            ORDER BY occurred_at DESC
            OFFSET $5
            LIMIT $6
            "#
        );

        let rows = sqlx::query_as::<_, ActivityLogRow>(&sql)
            .bind(filter.subject.map(|s| s.into_uuid()))
            .bind(filter.activity_type.as_ref().map(|t| t.code().to_string()))
            .bind(filter.since)
            .bind(filter.until)
            .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
            .bind(i64::try_from(page.limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ActivityLogRow::into_log).collect())
    }

    async fn count(&self, filter: &ActivityFilter) -> AuditResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM activity_logs WHERE {FILTER_PREDICATE}");

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.subject.map(|s| s.into_uuid()))
            .bind(filter.activity_type.as_ref().map(|t| t.code().to_string()))
            .bind(filter.since)
            .bind(filter.until)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn recent(&self, limit: u64) -> AuditResult<Vec<ActivityLog>> {
        self.find(&ActivityFilter::default(), Page::first(limit)).await
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct ActivityLogRow {
    activity_log_id: Uuid,
    subject_user_id: Uuid,
    activity_type: String,
    details: Json<serde_json::Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    performed_by: Uuid,
    occurred_at: DateTime<Utc>,
}

impl ActivityLogRow {
    fn into_log(self) -> ActivityLog {
        let details: Details = details_from_value(self.details.0);

        ActivityLog::from_db(
            ActivityLogId::from_uuid(self.activity_log_id),
            UserId::from_uuid(self.subject_user_id),
            ActivityType::from_db(&self.activity_type),
            details,
            self.ip_address,
            self.user_agent,
            UserId::from_uuid(self.performed_by),
            self.occurred_at,
        )
    }
}
