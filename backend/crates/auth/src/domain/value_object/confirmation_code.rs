//! Confirmation Code Value Object
//!
//! Six-digit one-time code used for both email confirmation and password
//! reset. A user holds at most one at a time; issuing a new one replaces
//! the old.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::constant_time_eq;
use rand::Rng;
use std::fmt;

pub const CODE_MIN: u32 = 100_000;
pub const CODE_MAX: u32 = 999_999;

/// Minutes a code stays valid after issuance
pub const CODE_TTL_MINUTES: i64 = 30;

#[derive(Clone, PartialEq, Eq)]
pub struct ConfirmationCode {
    code: String,
    expires_at: DateTime<Utc>,
}

impl ConfirmationCode {
    /// Fresh code, uniform over `[100000, 999999]`
    pub fn issue(now: DateTime<Utc>) -> Self {
        let value = rand::rng().random_range(CODE_MIN..=CODE_MAX);
        Self {
            code: value.to_string(),
            expires_at: now + Duration::minutes(CODE_TTL_MINUTES),
        }
    }

    pub fn from_db(code: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            expires_at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Constant-time comparison plus expiry check
    pub fn matches(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        let same = constant_time_eq(self.code.as_bytes(), candidate.trim().as_bytes());
        same && !self.is_expired(now)
    }
}

impl fmt::Debug for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationCode")
            .field("code", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
