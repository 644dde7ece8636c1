//! Audit Recorder
//!
//! `record` returns immediately. The write runs on its own task, so it
//! completes even if the client disconnects, and a failed write is only
//! reported on the `audit` tracing target.

use std::sync::Arc;

use kernel::id::UserId;
use platform::client::RequestContext;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::domain::activity_log::{ActivityLog, Details, details_from_value};
use crate::domain::activity_type::ActivityType;
use crate::domain::repository::ActivityLogRepository;

/// What to record
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub subject: UserId,
    pub activity_type: ActivityType,
    pub details: Details,
    pub performed_by: UserId,
    pub context: RequestContext,
}

impl AuditEntry {
    /// An action a user performed on their own account
    pub fn by_self(user: UserId, activity_type: ActivityType) -> Self {
        Self::by(user, user, activity_type)
    }

    /// An action `actor` performed on `subject`
    pub fn by(actor: UserId, subject: UserId, activity_type: ActivityType) -> Self {
        Self {
            subject,
            activity_type,
            details: Details::new(),
            performed_by: actor,
            context: RequestContext::default(),
        }
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details_from_value(details);
        self
    }

    pub fn details_map(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    pub fn context(mut self, context: &RequestContext) -> Self {
        self.context = context.clone();
        self
    }
}

pub struct AuditRecorder<R> {
    repo: Arc<R>,
}

impl<R> Clone for AuditRecorder<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R> AuditRecorder<R>
where
    R: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Record an entry in the background.
    ///
    /// Callers should invoke this after their mutation has completed.
    /// Awaiting the handle is optional and never yields an error.
    pub fn record(&self, entry: AuditEntry) -> JoinHandle<()> {
        self.record_log(ActivityLog::new(
            entry.subject,
            entry.activity_type,
            entry.details,
            entry.performed_by,
            &entry.context,
        ))
    }

    /// Record an already built log in the background
    pub fn record_log(&self, log: ActivityLog) -> JoinHandle<()> {
        let repo = self.repo.clone();

        tokio::spawn(async move {
            match repo.append(&log).await {
                Ok(()) => {
                    tracing::debug!(
                        target: "audit",
                        activity_type = %log.activity_type(),
                        subject = %log.subject_user_id(),
                        performed_by = %log.performed_by(),
                        "Activity recorded"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        target: "audit",
                        error = %e,
                        activity_type = %log.activity_type(),
                        subject = %log.subject_user_id(),
                        "Failed to write activity log"
                    );
                }
            }
        })
    }
}
