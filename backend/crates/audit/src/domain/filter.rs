use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::activity_log::ActivityLog;
use crate::domain::activity_type::ActivityType;

/// Query over activity records; every `None` matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    pub subject: Option<UserId>,
    pub activity_type: Option<ActivityType>,
    /// Inclusive lower bound
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub until: Option<DateTime<Utc>>,
}

impl ActivityFilter {
    pub fn for_subject(subject: UserId) -> Self {
        Self {
            subject: Some(subject),
            ..Default::default()
        }
    }

    pub fn matches(&self, log: &ActivityLog) -> bool {
        self.subject.is_none_or(|s| s == log.subject_user_id())
            && self
                .activity_type
                .as_ref()
                .is_none_or(|t| t == log.activity_type())
            && self.since.is_none_or(|since| log.timestamp() >= since)
            && self.until.is_none_or(|until| log.timestamp() <= until)
    }
}

/// Offset pagination, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    /// 1-based page number
    pub fn numbered(page: u64, limit: u64) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }
}
