//! PostgreSQL Repository Implementations

use audit::{
    ActivityFilter, ActivityLog, ActivityLogRepository, AuditResult, Page,
    PgActivityLogRepository,
};
use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::User;
use crate::domain::repository::{RevokedTokenRepository, UserFilter, UserRepository};
use crate::domain::value_object::{
    confirmation_code::ConfirmationCode, email::Email, user_name::UserName, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    activity: PgActivityLogRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            activity: PgActivityLogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Whether the database answers right now
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Advisory lock held while a signup decides whether it is the first account
const SIGNUP_LOCK_KEY: i64 = 0x6a65_655f_6e65_6574;

const USER_COLUMNS: &str = r#"
    user_id,
    name,
    email,
    password_hash,
    user_role,
    is_active,
    is_confirmed,
    confirmation_code,
    confirmation_expires_at,
    registered_at,
    updated_at
"#;

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let (code, expires_at) = confirmation_columns(user);

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                name,
                email,
                password_hash,
                user_role,
                is_active,
                is_confirmed,
                confirmation_code,
                confirmation_expires_at,
                registered_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.role.rank())
        .bind(user.is_active)
        .bind(user.is_confirmed)
        .bind(code)
        .bind(expires_at)
        .bind(user.registered_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(())
    }

    async fn create_claiming_first(&self, user: &User) -> AuthResult<UserRole> {
        let (code, expires_at) = confirmation_columns(user);

        // Serializes signups so the emptiness check cannot interleave
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SIGNUP_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let rank = sqlx::query_scalar::<_, i16>(
            r#"
            INSERT INTO users (
                user_id,
                name,
                email,
                password_hash,
                user_role,
                is_active,
                is_confirmed,
                confirmation_code,
                confirmation_expires_at,
                registered_at,
                updated_at
            )
            SELECT
                $1, $2, $3, $4,
                CASE WHEN EXISTS (SELECT 1 FROM users) THEN $5::smallint ELSE $12::smallint END,
                $6, $7, $8, $9, $10, $11
            RETURNING user_role
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.role.rank())
        .bind(user.is_active)
        .bind(user.is_confirmed)
        .bind(code)
        .bind(expires_at)
        .bind(user.registered_at)
        .bind(user.updated_at)
        .bind(UserRole::Developer.rank())
        .fetch_one(&mut *tx)
        .await
        .map_err(insert_error)?;

        tx.commit().await?;

        role_from_rank(rank)
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> AuthResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ANY($1)");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uuids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn list(&self, filter: &UserFilter) -> AuthResult<Vec<User>> {
        // Unset filter fields bind as NULL and drop out of the predicate
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::smallint IS NULL OR user_role = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
              AND ($3::text IS NULL OR name ILIKE $3 OR email ILIKE $3)
            ORDER BY registered_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(filter.role.map(|r| r.rank()))
            .bind(filter.is_active)
            .bind(filter.search.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn count_by_role(&self) -> AuthResult<Vec<(UserRole, u64)>> {
        let rows = sqlx::query_as::<_, (i16, i64)>(
            r#"
            SELECT user_role, COUNT(*)
            FROM users
            GROUP BY user_role
            ORDER BY user_role DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(rank, count)| Ok((role_from_rank(rank)?, count.max(0) as u64)))
            .collect()
    }

    async fn registrations_since(&self, since: DateTime<Utc>) -> AuthResult<Vec<(NaiveDate, u64)>> {
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT (registered_at AT TIME ZONE 'UTC')::date AS day, COUNT(*)
            FROM users
            WHERE registered_at >= $1
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(day, count)| (day, count.max(0) as u64))
            .collect())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let (code, expires_at) = confirmation_columns(user);

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                password_hash = $3,
                user_role = $4,
                is_active = $5,
                is_confirmed = $6,
                confirmation_code = $7,
                confirmation_expires_at = $8,
                updated_at = $9
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.role.rank())
        .bind(user.is_active)
        .bind(user.is_confirmed)
        .bind(code)
        .bind(expires_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Revoked Token Repository Implementation
// ============================================================================

impl RevokedTokenRepository for PgStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(revocations_deleted = deleted, "Cleaned up expired token revocations");

        Ok(deleted)
    }
}

// ============================================================================
// Activity Log Repository (delegated)
// ============================================================================

impl ActivityLogRepository for PgStore {
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

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    user_role: i16,
    is_active: bool,
    is_confirmed: bool,
    confirmation_code: Option<String>,
    confirmation_expires_at: Option<DateTime<Utc>>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        let confirmation = match (self.confirmation_code, self.confirmation_expires_at) {
            (Some(code), Some(expires_at)) => Some(ConfirmationCode::from_db(code, expires_at)),
            _ => None,
        };

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            name: UserName::from_db(self.name),
            email: Email::from_db(self.email),
            password_hash,
            role: role_from_rank(self.user_role)?,
            is_active: self.is_active,
            is_confirmed: self.is_confirmed,
            confirmation,
            registered_at: self.registered_at,
            updated_at: self.updated_at,
        })
    }
}

fn role_from_rank(rank: i16) -> AuthResult<UserRole> {
    UserRole::from_rank(rank).ok_or_else(|| AuthError::Internal(format!("Invalid user_role: {}", rank)))
}

fn insert_error(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::UserAlreadyExists,
        _ => AuthError::Database(e),
    }
}

fn confirmation_columns(user: &User) -> (Option<&str>, Option<DateTime<Utc>>) {
    match &user.confirmation {
        Some(code) => (Some(code.as_str()), Some(code.expires_at())),
        None => (None, None),
    }
}

/// `%needle%` with LIKE metacharacters escaped
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
