//! Role Policy
//!
//! Pure decisions over `(acting role, target role, action)`. Nothing here
//! touches storage or the request.

use axum::http::Method;

use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// What the acting user wants to do to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAction {
    Read,
    Modify,
}

impl TargetAction {
    /// Safe methods read, everything else modifies
    pub fn from_method(method: &Method) -> Self {
        if method == Method::GET || method == Method::HEAD {
            TargetAction::Read
        } else {
            TargetAction::Modify
        }
    }
}

/// May `acting` give someone `requested`?
///
/// Only a Developer may hand out the Developer role.
pub fn can_assign_role(acting: UserRole, requested: UserRole) -> bool {
    requested != UserRole::Developer || acting == UserRole::Developer
}

/// May `acting` perform `action` on a user holding `target`?
pub fn can_act_on_target(acting: UserRole, target: UserRole, action: TargetAction) -> bool {
    match acting {
        UserRole::Developer => true,
        UserRole::Admin => target != UserRole::Developer,
        UserRole::Teacher => target == UserRole::Student && action == TargetAction::Read,
        UserRole::Student => false,
    }
}

/// Role change check with the specific denial reason.
///
/// Target hierarchy first, so an Admin touching a Developer is always
/// refused whatever role was requested.
pub fn check_role_change(acting: UserRole, target: UserRole, requested: UserRole) -> AuthResult<()> {
    if acting == UserRole::Admin && target == UserRole::Developer {
        return Err(AuthError::DeveloperAccountProtected);
    }
    if !can_act_on_target(acting, target, TargetAction::Modify) {
        return Err(AuthError::TargetForbidden);
    }
    if !can_assign_role(acting, requested) {
        return Err(AuthError::DeveloperRoleRestricted);
    }
    Ok(())
}

/// Route-level allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    allowed: &'static [UserRole],
}

impl RoleGate {
    pub const DEVELOPER: RoleGate = RoleGate::new(&[UserRole::Developer]);
    pub const ADMINS: RoleGate = RoleGate::new(&[UserRole::Developer, UserRole::Admin]);
    pub const STAFF: RoleGate =
        RoleGate::new(&[UserRole::Developer, UserRole::Admin, UserRole::Teacher]);

    pub const fn new(allowed: &'static [UserRole]) -> Self {
        Self { allowed }
    }

    pub fn admits(&self, role: UserRole) -> bool {
        self.allowed.contains(&role)
    }
}
