//! Credential Service
//!
//! Password hashing and session tokens.
//!
//! ## Token format
//! `base64url(claims JSON) "." base64url(HMAC-SHA256(secret, first segment))`
//!
//! Tokens are stateless. Logout places the `jti` on the revocation list
//! until `exp`, which the authentication middleware consults after the
//! signature and expiry checks.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use kernel::id::UserId;
use platform::crypto::{
    from_base64url, hmac_sha256, random_bytes, to_base64url, verify_hmac_sha256,
};
use platform::password::{ClearTextPassword, HashCost, HashedPassword};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// Signed session claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub role: UserRole,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Token id, the revocation key
    pub jti: String,
}

impl SessionClaims {
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// A freshly issued token and the claims it carries
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

#[derive(Clone)]
pub struct CredentialService {
    config: Arc<AuthConfig>,
}

impl CredentialService {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    // ------------------------------------------------------------------
    // Passwords
    // ------------------------------------------------------------------

    /// Apply the password policy and hash
    pub fn hash_password(&self, raw: String) -> AuthResult<HashedPassword> {
        let password = ClearTextPassword::new(raw, self.config.password_min_length)?;
        Ok(password.hash(self.config.hash_cost, self.config.pepper())?)
    }

    /// Check a login attempt against the stored hash
    pub fn verify_password(&self, stored: &HashedPassword, raw: String) -> bool {
        stored.verify(&ClearTextPassword::unchecked(raw), self.config.pepper())
    }

    /// Burn one verification's worth of work when there is no account to
    /// check against, so unknown and inactive emails take as long to reject
    /// as a wrong password.
    pub fn verify_against_decoy(&self, raw: String) {
        if let Some(decoy) = decoy_hash(self.config.hash_cost) {
            let _ = decoy.verify(&ClearTextPassword::unchecked(raw), self.config.pepper());
        }
    }

    /// Re-hash `raw` when the stored hash used other cost parameters
    pub fn rehash_if_needed(&self, stored: &HashedPassword, raw: String) -> Option<HashedPassword> {
        if !stored.needs_rehash(self.config.hash_cost) {
            return None;
        }
        ClearTextPassword::unchecked(raw)
            .hash(self.config.hash_cost, self.config.pepper())
            .map_err(|e| tracing::warn!(error = %e, "Password rehash failed"))
            .ok()
    }

    // ------------------------------------------------------------------
    // Session tokens
    // ------------------------------------------------------------------

    pub fn issue_token(&self, user: &User, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let claims = SessionClaims {
            sub: user.user_id.into_uuid(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.config.token_ttl_chrono()).timestamp(),
            jti: to_base64url(&random_bytes(16)),
        };

        let payload = serde_json::to_vec(&claims)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))?;
        let payload_b64 = to_base64url(&payload);
        let signature = hmac_sha256(&self.config.token_secret, payload_b64.as_bytes());

        Ok(IssuedToken {
            token: format!("{}.{}", payload_b64, to_base64url(&signature)),
            claims,
        })
    }

    /// Check signature, then expiry. Revocation is the caller's next step.
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> AuthResult<SessionClaims> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(AuthError::InvalidToken)?;

        let signature = from_base64url(signature_b64).map_err(|_| AuthError::InvalidToken)?;
        if !verify_hmac_sha256(&self.config.token_secret, payload_b64.as_bytes(), &signature) {
            return Err(AuthError::InvalidToken);
        }

        let payload = from_base64url(payload_b64).map_err(|_| AuthError::InvalidToken)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;

        if claims.is_expired(now) {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

/// A hash of a random secret at `cost`, made once per cost setting
fn decoy_hash(cost: HashCost) -> Option<HashedPassword> {
    static DECOYS: LazyLock<Mutex<HashMap<(u32, u32, u32), HashedPassword>>> =
        LazyLock::new(Mutex::default);

    let key = (cost.memory_kib, cost.iterations, cost.parallelism);
    let mut decoys = DECOYS.lock().ok()?;
    if let Some(hash) = decoys.get(&key) {
        return Some(hash.clone());
    }
    let hash = ClearTextPassword::unchecked(to_base64url(&random_bytes(24)))
        .hash(cost, None)
        .map_err(|e| tracing::warn!(error = %e, "Decoy hash failed"))
        .ok()?;
    decoys.insert(key, hash.clone());
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{email::Email, user_name::UserName};
    use chrono::Duration;

    fn service() -> CredentialService {
        CredentialService::new(Arc::new(AuthConfig::for_tests()))
    }

    fn user(service: &CredentialService) -> User {
        User::register(
            UserName::new("Meera").unwrap(),
            Email::new("meera@x.com").unwrap(),
            service.hash_password("hunter2".into()).unwrap(),
            UserRole::Teacher,
            Utc::now(),
        )
    }

    #[test]
    fn test_password_roundtrip() {
        let service = service();
        let hash = service.hash_password("hunter2".into()).unwrap();
        assert!(service.verify_password(&hash, "hunter2".into()));
        assert!(!service.verify_password(&hash, "hunter3".into()));
    }

    #[test]
    fn test_decoy_hash_is_reused_per_cost() {
        let cost = AuthConfig::for_tests().hash_cost;
        let first = decoy_hash(cost).unwrap();
        let second = decoy_hash(cost).unwrap();
        assert_eq!(first.as_phc_string(), second.as_phc_string());
        assert!(!first.needs_rehash(cost));

        // Nothing to match, nothing to panic on
        service().verify_against_decoy("hunter2".into());
    }

    #[test]
    fn test_password_policy_applies() {
        assert!(matches!(
            service().hash_password("   ".into()),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_token_roundtrip() {
        let service = service();
        let user = user(&service);
        let now = Utc::now();

        let issued = service.issue_token(&user, now).unwrap();
        let claims = service.verify_token(&issued.token, now).unwrap();

        assert_eq!(claims.user_id(), user.user_id);
        assert_eq!(claims.role, UserRole::Teacher);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
        assert_eq!(claims, issued.claims);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let service = service();
        let user = user(&service);
        let a = service.issue_token(&user, Utc::now()).unwrap();
        let b = service.issue_token(&user, Utc::now()).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue_token(&user(&service), now).unwrap();

        let later = now + Duration::days(7) + Duration::seconds(1);
        assert!(matches!(
            service.verify_token(&issued.token, later),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue_token(&user(&service), now).unwrap();

        let mut forged = issued.claims.clone();
        forged.role = UserRole::Developer;
        let forged_payload = to_base64url(&serde_json::to_vec(&forged).unwrap());
        let (_, signature) = issued.token.split_once('.').unwrap();
        let forged_token = format!("{}.{}", forged_payload, signature);

        assert!(service.verify_token(&forged_token, now).is_err());
        assert!(service.verify_token("garbage", now).is_err());
        assert!(service.verify_token("a.b", now).is_err());
    }

    #[test]
    fn test_other_secret_rejected() {
        let now = Utc::now();
        let issuer = service();
        let issued = issuer.issue_token(&user(&issuer), now).unwrap();
        assert!(service().verify_token(&issued.token, now).is_err());
    }

    #[test]
    fn test_issued_token_debug_redacted() {
        let service = service();
        let issued = service.issue_token(&user(&service), Utc::now()).unwrap();
        assert!(!format!("{:?}", issued).contains(&issued.token));
    }
}
