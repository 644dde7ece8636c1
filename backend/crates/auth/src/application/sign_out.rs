//! Sign Out Use Case
//!
//! Revokes the presented token until its natural expiry.

use std::sync::Arc;

use audit::{ActivityLogRepository, ActivityType, AuditEntry, AuditRecorder};
use platform::client::RequestContext;
use serde_json::json;

use crate::application::credentials::SessionClaims;
use crate::domain::repository::RevokedTokenRepository;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<S, A>
where
    S: RevokedTokenRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    revoked_repo: Arc<S>,
    recorder: AuditRecorder<A>,
}

impl<S, A> SignOutUseCase<S, A>
where
    S: RevokedTokenRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(revoked_repo: Arc<S>, recorder: AuditRecorder<A>) -> Self {
        Self {
            revoked_repo,
            recorder,
        }
    }

    /// Sign out the session described by `claims`
    pub async fn execute(&self, claims: &SessionClaims, context: &RequestContext) -> AuthResult<()> {
        self.revoked_repo
            .revoke(&claims.jti, claims.expires_at())
            .await?;

        let user_id = claims.user_id();
        self.recorder.record(
            AuditEntry::by_self(user_id, ActivityType::Logout)
                .details(json!({
                    "ipAddress": context.ip_string(),
                    "userAgent": context.user_agent,
                }))
                .context(context),
        );

        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }
}
