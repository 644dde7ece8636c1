//! In-memory Activity Log Store
//!
//! Used when no database is reachable, and by tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::domain::activity_log::ActivityLog;
use crate::domain::filter::{ActivityFilter, Page};
use crate::domain::repository::ActivityLogRepository;
use crate::error::{AuditError, AuditResult};

#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityLogRepository {
    logs: Arc<RwLock<Vec<ActivityLog>>>,
    outage: Arc<AtomicBool>,
}

impl InMemoryActivityLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unavailable store: every call fails with
    /// [`AuditError::Unavailable`] while set.
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> AuditResult<()> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(AuditError::Unavailable);
        }
        Ok(())
    }

    async fn matching(&self, filter: &ActivityFilter) -> Vec<ActivityLog> {
        let logs = self.logs.read().await;
        let mut matched: Vec<ActivityLog> = logs
            .iter()
            .rev()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect();
        // Stable: equal timestamps keep newest-appended first
        matched.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        matched
    }
}

impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn append(&self, log: &ActivityLog) -> AuditResult<()> {
        self.ensure_available()?;
        self.logs.write().await.push(log.clone());
        Ok(())
    }

    async fn find(&self, filter: &ActivityFilter, page: Page) -> AuditResult<Vec<ActivityLog>> {
        self.ensure_available()?;
        let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);

        Ok(self
            .matching(filter)
            .await
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count(&self, filter: &ActivityFilter) -> AuditResult<u64> {
        self.ensure_available()?;
        let logs = self.logs.read().await;
        Ok(logs.iter().filter(|log| filter.matches(log)).count() as u64)
    }

    async fn recent(&self, limit: u64) -> AuditResult<Vec<ActivityLog>> {
        self.find(&ActivityFilter::default(), Page::first(limit)).await
    }
}
