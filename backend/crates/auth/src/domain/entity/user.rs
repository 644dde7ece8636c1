//! User Entity
//!
//! Identity record with credentials, role and confirmation state.
//!
//! ## Invariants
//! - An unconfirmed user always holds a confirmation code
//! - A consumed code is gone; it cannot be matched a second time
//! - `registered_at` never changes after creation

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::value_object::{
    confirmation_code::ConfirmationCode, email::Email, user_name::UserName, user_role::UserRole,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub name: UserName,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: UserRole,
    /// Inactive users are rejected at authentication
    pub is_active: bool,
    pub is_confirmed: bool,
    /// Shared by signup confirmation and password reset
    pub confirmation: Option<ConfirmationCode>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New unconfirmed, active account holding a fresh confirmation code
    pub fn register(
        name: UserName,
        email: Email,
        password_hash: HashedPassword,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: UserId::new(),
            name,
            email,
            password_hash,
            role,
            is_active: true,
            is_confirmed: false,
            confirmation: Some(ConfirmationCode::issue(now)),
            registered_at: now,
            updated_at: now,
        }
    }

    /// Replace any outstanding code with a new one and return it
    pub fn issue_code(&mut self, now: DateTime<Utc>) -> ConfirmationCode {
        let code = ConfirmationCode::issue(now);
        self.confirmation = Some(code.clone());
        self.updated_at = now;
        code
    }

    /// Whether `candidate` is the outstanding, unexpired code
    pub fn code_matches(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        self.confirmation
            .as_ref()
            .is_some_and(|code| code.matches(candidate, now))
    }

    /// Clear the code if `candidate` matches and has not expired.
    ///
    /// Returns false, leaving state untouched, on any mismatch.
    pub fn consume_code(&mut self, candidate: &str, now: DateTime<Utc>) -> bool {
        let matched = self.code_matches(candidate, now);
        if matched {
            self.confirmation = None;
            self.updated_at = now;
        }
        matched
    }

    /// Consume a signup code and mark the email confirmed
    pub fn confirm(&mut self, candidate: &str, now: DateTime<Utc>) -> bool {
        if self.is_confirmed || !self.consume_code(candidate, now) {
            return false;
        }
        self.is_confirmed = true;
        true
    }

    pub fn set_password(&mut self, password_hash: HashedPassword, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.updated_at = now;
    }

    pub fn set_role(&mut self, role: UserRole, now: DateTime<Utc>) {
        self.role = role;
        self.updated_at = now;
    }

    pub fn set_active(&mut self, is_active: bool, now: DateTime<Utc>) {
        self.is_active = is_active;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use platform::password::{ClearTextPassword, HashCost};

    fn user(now: DateTime<Utc>) -> User {
        let hash = ClearTextPassword::new("pw".into(), 1)
            .unwrap()
            .hash(HashCost::minimal(), None)
            .unwrap();
        User::register(
            UserName::new("Asha").unwrap(),
            Email::new("a@x.com").unwrap(),
            hash,
            UserRole::Student,
            now,
        )
    }

    #[test]
    fn test_registered_user_is_unconfirmed_with_code() {
        let now = Utc::now();
        let u = user(now);
        assert!(u.is_active);
        assert!(!u.is_confirmed);
        assert!(u.confirmation.is_some());
        assert_eq!(u.registered_at, now);
    }

    #[test]
    fn test_confirm_clears_code_and_blocks_replay() {
        let now = Utc::now();
        let mut u = user(now);
        let code = u.confirmation.clone().unwrap();

        assert!(u.confirm(code.as_str(), now + Duration::minutes(1)));
        assert!(u.is_confirmed);
        assert!(u.confirmation.is_none());

        assert!(!u.consume_code(code.as_str(), now + Duration::minutes(2)));
    }

    #[test]
    fn test_code_check_does_not_consume() {
        let now = Utc::now();
        let mut u = user(now);
        let code = u.confirmation.clone().unwrap();

        assert!(u.code_matches(code.as_str(), now));
        assert!(u.confirmation.is_some());
        assert!(u.consume_code(code.as_str(), now));
        assert!(!u.code_matches(code.as_str(), now));
    }

    #[test]
    fn test_expired_code_never_confirms() {
        let now = Utc::now();
        let mut u = user(now);
        let code = u.confirmation.clone().unwrap();

        assert!(!u.confirm(code.as_str(), now + Duration::minutes(31)));
        assert!(!u.is_confirmed);
        assert!(u.confirmation.is_some());
    }

    #[test]
    fn test_new_code_replaces_old() {
        let now = Utc::now();
        let mut u = user(now);
        let old = u.confirmation.clone().unwrap();
        let new = u.issue_code(now);

        if old.as_str() != new.as_str() {
            assert!(!u.consume_code(old.as_str(), now));
        }
        assert!(u.consume_code(new.as_str(), now));
    }
}
