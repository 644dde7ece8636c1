//! User Administration Use Cases
//!
//! Route gates and target resolution have already run by the time these
//! are called; what remains is the assignment rule, the self-modification
//! rules, the write and its audit record.

use std::sync::Arc;

use audit::{ActivityLogRepository, ActivityType, AuditEntry, AuditRecorder};
use chrono::Utc;
use platform::client::RequestContext;
use serde_json::json;

use crate::domain::entity::user::User;
use crate::domain::policy::check_role_change;
use crate::domain::repository::{UserFilter, UserRepository};
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

pub struct UserAdminUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    recorder: AuditRecorder<A>,
}

impl<U, A> UserAdminUseCase<U, A>
where
    U: UserRepository,
    A: ActivityLogRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, recorder: AuditRecorder<A>) -> Self {
        Self {
            user_repo,
            recorder,
        }
    }

    /// Newest registration first
    pub async fn list(&self, filter: &UserFilter) -> AuthResult<Vec<User>> {
        self.user_repo.list(filter).await
    }

    /// All students, by name
    pub async fn students(&self) -> AuthResult<Vec<User>> {
        let mut students = self.user_repo.list(&UserFilter::role(UserRole::Student)).await?;
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    pub async fn change_role(
        &self,
        actor: &User,
        mut target: User,
        requested: UserRole,
        context: &RequestContext,
    ) -> AuthResult<User> {
        if actor.user_id == target.user_id {
            return Err(AuthError::SelfModification("You cannot change your own role"));
        }
        check_role_change(actor.role, target.role, requested)?;

        let old_role = target.role;
        target.set_role(requested, Utc::now());
        self.user_repo.update(&target).await?;

        self.recorder.record(
            AuditEntry::by(actor.user_id, target.user_id, ActivityType::RoleChanged)
                .details(json!({ "oldRole": old_role, "newRole": requested }))
                .context(context),
        );

        tracing::info!(
            actor = %actor.user_id,
            target = %target.user_id,
            old_role = %old_role,
            new_role = %requested,
            "Role changed"
        );
        Ok(target)
    }

    pub async fn change_status(
        &self,
        actor: &User,
        mut target: User,
        is_active: bool,
        context: &RequestContext,
    ) -> AuthResult<User> {
        if actor.user_id == target.user_id && !is_active {
            tracing::warn!(user_id = %actor.user_id, "User is deactivating their own account");
        }

        let old_status = target.is_active;
        target.set_active(is_active, Utc::now());
        self.user_repo.update(&target).await?;

        self.recorder.record(
            AuditEntry::by(actor.user_id, target.user_id, ActivityType::StatusChanged)
                .details(json!({ "oldStatus": old_status, "newStatus": is_active }))
                .context(context),
        );

        tracing::info!(
            actor = %actor.user_id,
            target = %target.user_id,
            is_active,
            "User status changed"
        );
        Ok(target)
    }

    pub async fn delete(&self, actor: &User, target: User, context: &RequestContext) -> AuthResult<()> {
        if actor.user_id == target.user_id {
            return Err(AuthError::SelfModification("You cannot delete your own account"));
        }

        if !self.user_repo.delete(&target.user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        self.recorder.record(
            AuditEntry::by(actor.user_id, target.user_id, ActivityType::UserDeleted)
                .details(json!({
                    "deletedUser": {
                        "id": target.user_id.to_string(),
                        "email": target.email.as_str(),
                        "role": target.role,
                    }
                }))
                .context(context),
        );

        tracing::info!(actor = %actor.user_id, target = %target.user_id, "User deleted");
        Ok(())
    }
}
