//! Repository Traits
//!
//! Audit Store interface. Append-only: there is no update or delete.

use crate::domain::activity_log::ActivityLog;
use crate::domain::filter::{ActivityFilter, Page};
use crate::error::AuditResult;

#[trait_variant::make(ActivityLogRepository: Send)]
pub trait LocalActivityLogRepository {
    /// Persist a new record
    async fn append(&self, log: &ActivityLog) -> AuditResult<()>;

    /// Matching records, newest first
    async fn find(&self, filter: &ActivityFilter, page: Page) -> AuditResult<Vec<ActivityLog>>;

    /// Number of matching records
    async fn count(&self, filter: &ActivityFilter) -> AuditResult<u64>;

    /// The `limit` newest records
    async fn recent(&self, limit: u64) -> AuditResult<Vec<ActivityLog>>;
}
