//! ActivityLog Entity
//!
//! One immutable audit record. Fields are private to keep it that way
//! outside of construction and restoration from storage.

use chrono::{DateTime, Utc};
use kernel::id::{ActivityLogId, UserId};
use platform::client::RequestContext;
use serde_json::{Map, Value};

use crate::domain::activity_type::ActivityType;

/// Free-form attributes attached to a record
pub type Details = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLog {
    id: ActivityLogId,
    subject_user_id: UserId,
    activity_type: ActivityType,
    details: Details,
    ip_address: Option<String>,
    user_agent: Option<String>,
    performed_by: UserId,
    timestamp: DateTime<Utc>,
}

impl ActivityLog {
    /// New record stamped with the current time
    pub fn new(
        subject_user_id: UserId,
        activity_type: ActivityType,
        details: Details,
        performed_by: UserId,
        context: &RequestContext,
    ) -> Self {
        Self {
            id: ActivityLogId::new(),
            subject_user_id,
            activity_type,
            details,
            ip_address: context.ip_string(),
            user_agent: context.user_agent.clone(),
            performed_by,
            timestamp: Utc::now(),
        }
    }

    /// Restore from storage
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: ActivityLogId,
        subject_user_id: UserId,
        activity_type: ActivityType,
        details: Details,
        ip_address: Option<String>,
        user_agent: Option<String>,
        performed_by: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject_user_id,
            activity_type,
            details,
            ip_address,
            user_agent,
            performed_by,
            timestamp,
        }
    }

    pub fn id(&self) -> ActivityLogId {
        self.id
    }

    pub fn subject_user_id(&self) -> UserId {
        self.subject_user_id
    }

    pub fn activity_type(&self) -> &ActivityType {
        &self.activity_type
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn performed_by(&self) -> UserId {
        self.performed_by
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Coerce any JSON value into a details map.
///
/// Objects pass through, `null` becomes empty, anything else is kept
/// under `"value"`.
pub fn details_from_value(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        Value::Null => Details::new(),
        other => {
            let mut map = Details::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
