//! User Name Value Object
//!
//! The display name given at signup. Not unique and not used for login.
//!
//! ## Invariants
//! - NFKC normalized and trimmed
//! - 1 to 100 characters
//! - No control characters

use kernel::error::app_error::{AppError, AppResult};
use serde::{Serialize, Serializer};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

pub const USER_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserName(String);

impl UserName {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let normalized: String = raw.as_ref().nfkc().collect();
        let name = normalized.trim();

        if name.is_empty() {
            return Err(AppError::bad_request("Name is required"));
        }
        if name.chars().count() > USER_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Name must be at most {USER_NAME_MAX_LENGTH} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::bad_request("Name contains invalid characters"));
        }

        Ok(Self(name.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring match, used by user search
    pub fn contains_ignore_case(&self, needle_lower: &str) -> bool {
        self.0.to_lowercase().contains(needle_lower)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for UserName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
