//! Email Value Object
//!
//! Trimmed and lowercased on construction, so equality is
//! case-insensitive everywhere an `Email` is compared or stored.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// RFC 5321 path limit
const EMAIL_MAX_LENGTH: usize = 254;
const LOCAL_PART_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let email = raw.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::bad_request("Email is required"));
        }
        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Email must be at most {EMAIL_MAX_LENGTH} characters"
            )));
        }

        let Some((local, domain)) = email.split_once('@') else {
            return Err(AppError::bad_request("Invalid email format"));
        };
        if !valid_local_part(local) || !valid_domain(domain) {
            return Err(AppError::bad_request("Invalid email format"));
        }

        Ok(Self(email))
    }

    /// Trust a stored value
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Membership in a list of already-lowercased addresses
    pub fn is_listed_in(&self, list: &[String]) -> bool {
        list.iter().any(|entry| entry == &self.0)
    }
}

fn valid_local_part(local: &str) -> bool {
    !local.is_empty() && local.len() <= LOCAL_PART_MAX_LENGTH && !local.contains(char::is_whitespace)
}

fn valid_domain(domain: &str) -> bool {
    domain.contains('.')
        && !domain.starts_with(['.', '-'])
        && !domain.ends_with(['.', '-'])
        && !domain.contains("..")
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Email {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("student@example.com").is_ok());
        assert!(Email::new("first.last+jee@school.co.in").is_ok());
        assert!(Email::new("  padded@example.com ").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        for bad in ["", "no-at-sign.com", "user@", "@example.com", "a@@example.com", "a@localhost", "a b@x.com", "a@-x.com", "a@x..com"] {
            assert!(Email::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_email_case_insensitive() {
        let a = Email::new("Teacher@Example.COM").unwrap();
        let b = Email::new("teacher@example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "teacher@example.com");
    }

    #[test]
    fn test_allow_list_membership() {
        let list = vec!["dev@example.com".to_string()];
        assert!(Email::new("DEV@example.com").unwrap().is_listed_in(&list));
        assert!(!Email::new("other@example.com").unwrap().is_listed_in(&list));
    }
}
