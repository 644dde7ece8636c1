//! Auth Middleware
//!
//! Per-request authorization pipeline, one `from_fn` stage per step:
//!
//! 1. [`authenticate`]: bearer token, signature, expiry, revocation, then
//!    the stored user, which must exist and be active
//! 2. [`require_role`]: route allow-list over the stored role
//! 3. [`resolve_target`]: the `{id}` path user, checked with the role
//!    policy for the request method
//!
//! A failing stage answers directly; the handler never runs.

use audit::AuditActor;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use kernel::id::UserId;

use crate::application::credentials::{CredentialService, SessionClaims};
use crate::domain::entity::user::User;
use crate::domain::policy::{RoleGate, TargetAction, can_act_on_target};
use crate::error::{AuthError, AuthResult};
use crate::infra::Store;
use crate::presentation::handlers::AuthAppState;

/// The authenticated user, as stored when the request arrived
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub claims: SessionClaims,
}

/// The user named by the `{id}` path segment
#[derive(Debug, Clone)]
pub struct TargetUser(pub User);

/// `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the acting user from the bearer token
pub async fn authenticate<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response>
where
    R: Store,
{
    let token = extract_bearer(req.headers()).ok_or(AuthError::MissingToken)?;

    let claims = CredentialService::new(state.config.clone()).verify_token(token, Utc::now())?;

    if state.store.is_revoked(&claims.jti).await? {
        return Err(AuthError::InvalidToken);
    }

    let user = state
        .store
        .find_by_id(&claims.user_id())
        .await?
        .filter(|u| u.is_active)
        .ok_or(AuthError::InactiveOrUnknownUser)?;

    req.extensions_mut().insert(AuditActor(user.user_id));
    req.extensions_mut().insert(CurrentUser { user, claims });

    Ok(next.run(req).await)
}

/// Route allow-list; use with `from_fn_with_state(RoleGate::ADMINS, require_role)`
pub async fn require_role(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> AuthResult<Response> {
    let role = current_user(&req)?.user.role;
    if !gate.admits(role) {
        return Err(AuthError::InsufficientRole);
    }
    Ok(next.run(req).await)
}

/// Load the path user and apply the hierarchy rule for the method
pub async fn resolve_target<R>(
    State(state): State<AuthAppState<R>>,
    Path(id): Path<String>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response>
where
    R: Store,
{
    let target_id: UserId = id.parse().map_err(|_| AuthError::UserNotFound)?;
    let target = state
        .store
        .find_by_id(&target_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let acting = current_user(&req)?.user.role;
    let action = TargetAction::from_method(req.method());
    if !can_act_on_target(acting, target.role, action) {
        return Err(AuthError::TargetForbidden);
    }

    req.extensions_mut().insert(TargetUser(target));
    Ok(next.run(req).await)
}

fn current_user(req: &Request) -> AuthResult<&CurrentUser> {
    req.extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(&headers("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer(&headers("Basic abc")), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
