//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::crypto::random_bytes;
use platform::password::HashCost;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC signing key for session tokens
    pub token_secret: Vec<u8>,
    /// Session token lifetime (7 days)
    pub token_ttl: Duration,
    /// Emails that are registered as Developer (lowercase)
    pub developer_emails: Vec<String>,
    /// Argon2id cost
    pub hash_cost: HashCost,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Minimum password length in code points
    pub password_min_length: usize,
    /// Answer 404 for an unknown email on password reset request
    pub reset_discloses_unknown_email: bool,
    /// Development mode: strict activity types, outbox inspection routes
    pub development: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: vec![0u8; 32],
            token_ttl: Duration::from_secs(7 * 24 * 3600), // 7 days
            developer_emails: Vec::new(),
            hash_cost: HashCost::default(),
            password_pepper: None,
            password_min_length: 1,
            reset_discloses_unknown_email: true,
            development: false,
        }
    }
}

impl AuthConfig {
    /// Create config with a random token secret
    pub fn with_random_secret() -> Self {
        Self {
            token_secret: random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self {
            development: true,
            ..Self::with_random_secret()
        }
    }

    /// Development config with the cheapest password hash
    pub fn for_tests() -> Self {
        Self {
            hash_cost: HashCost::minimal(),
            ..Self::development()
        }
    }

    /// Replace the developer allow-list; entries are trimmed and lowercased
    pub fn with_developer_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.developer_emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Get token TTL as a chrono duration
    pub fn token_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.token_ttl).unwrap_or(chrono::Duration::days(7))
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("developer_emails", &self.developer_emails)
            .field("hash_cost", &self.hash_cost)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("password_min_length", &self.password_min_length)
            .field("reset_discloses_unknown_email", &self.reset_discloses_unknown_email)
            .field("development", &self.development)
            .finish()
    }
}
