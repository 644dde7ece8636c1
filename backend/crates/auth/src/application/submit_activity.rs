//! Client Activity Submission
//!
//! Lets an authenticated client add a record about itself, e.g. a
//! finished test or a viewed chapter. The type is parsed strictly in
//! development and tolerantly otherwise.

use std::sync::Arc;

use audit::{ActivityLog, ActivityLogRepository, ActivityType, AuditRecorder, details_from_value};
use kernel::id::UserId;
use platform::client::RequestContext;
use serde_json::Value;

use crate::application::config::AuthConfig;
use crate::error::AuthResult;

pub struct SubmitActivityUseCase<A>
where
    A: ActivityLogRepository + Send + Sync + 'static,
{
    recorder: AuditRecorder<A>,
    config: Arc<AuthConfig>,
}

impl<A> SubmitActivityUseCase<A>
where
    A: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(recorder: AuditRecorder<A>, config: Arc<AuthConfig>) -> Self {
        Self { recorder, config }
    }

    /// Build the record and hand it to the recorder.
    ///
    /// The write is best-effort like every other audit write; the record
    /// is returned either way.
    pub async fn execute(
        &self,
        actor: UserId,
        activity_type: &str,
        details: Value,
        context: &RequestContext,
    ) -> AuthResult<ActivityLog> {
        let activity_type = ActivityType::parse(activity_type, self.config.development)?;
        let log = ActivityLog::new(
            actor,
            activity_type,
            details_from_value(details),
            actor,
            context,
        );

        self.recorder.record_log(log.clone());
        Ok(log)
    }
}
