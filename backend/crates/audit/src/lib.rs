//! Audit (Activity Log) Backend Module
//!
//! - `domain/` - ActivityLog entity, activity types, query filter, store trait
//! - `infra/` - In-memory and PostgreSQL stores
//! - `recorder` - Best-effort, non-blocking writes
//! - `hook` - Route completion hook that records after the handler returns
//!
//! Records are append-only. Nothing in this crate updates or deletes a
//! written record.

pub mod domain;
pub mod error;
pub mod hook;
pub mod infra;
pub mod recorder;

pub use domain::activity_log::{ActivityLog, Details, details_from_value};
pub use domain::activity_type::ActivityType;
pub use domain::filter::{ActivityFilter, Page};
pub use domain::repository::ActivityLogRepository;
pub use error::{AuditError, AuditResult};
pub use hook::{AuditActor, AuditDetails, CompletionHook, record_on_completion};
pub use infra::memory::InMemoryActivityLogRepository;
pub use infra::postgres::PgActivityLogRepository;
pub use recorder::{AuditEntry, AuditRecorder};
