//! HTTP Handlers: user administration and activity
//!
//! Role gates and target checks run as route layers before these.

use audit::AuditDetails;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use platform::client::RequestContext;
use serde_json::json;

use crate::application::activity_query::{
    DEFAULT_ACTIVITY_PAGE_LIMIT, DEFAULT_USER_ACTIVITY_LIMIT,
};
use crate::application::{ActivityQueryUseCase, SubmitActivityUseCase, UserAdminUseCase};
use crate::domain::value_object::user_role::UserRole;
use crate::error::AuthResult;
use crate::infra::Store;
use crate::presentation::dto::{
    ActivityLogResponse, ActivityPageResponse, ActivityQuery, ChangeRoleRequest,
    ChangeStatusRequest, DashboardResponse, SubmitActivityRequest, SubmitActivityResponse,
    UserActivityQuery, UserListQuery, UserMessageResponse, UserResponse, user_responses,
};
use crate::presentation::handlers::AuthAppState;
use crate::presentation::middleware::{CurrentUser, TargetUser};

// ============================================================================
// Users
// ============================================================================

/// GET /api/admin/users
pub async fn list_users<R: Store>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<UserListQuery>,
) -> AuthResult<Response> {
    let filter = query.to_filter()?;
    let users = UserAdminUseCase::new(state.store.clone(), state.recorder.clone())
        .list(&filter)
        .await?;

    let details = json!({ "filter": query, "returned": users.len() });
    Ok(AuditDetails(audit::details_from_value(details)).attach(Json(user_responses(&users))))
}

/// GET /api/admin/users/{id}
pub async fn get_user(Extension(TargetUser(target)): Extension<TargetUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&target))
}

/// PUT /api/admin/users/{id}/role
pub async fn change_role<R: Store>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    Extension(TargetUser(target)): Extension<TargetUser>,
    context: RequestContext,
    Json(req): Json<ChangeRoleRequest>,
) -> AuthResult<Json<UserMessageResponse>> {
    let requested: UserRole = req.role.parse()?;

    let user = UserAdminUseCase::new(state.store.clone(), state.recorder.clone())
        .change_role(&current.user, target, requested, &context)
        .await?;

    Ok(Json(UserMessageResponse {
        message: "Role updated".into(),
        user: UserResponse::from(&user),
    }))
}

/// PUT /api/admin/users/{id}/status
pub async fn change_status<R: Store>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    Extension(TargetUser(target)): Extension<TargetUser>,
    context: RequestContext,
    Json(req): Json<ChangeStatusRequest>,
) -> AuthResult<Json<UserMessageResponse>> {
    let user = UserAdminUseCase::new(state.store.clone(), state.recorder.clone())
        .change_status(&current.user, target, req.is_active, &context)
        .await?;

    Ok(Json(UserMessageResponse {
        message: "User status updated".into(),
        user: UserResponse::from(&user),
    }))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user<R: Store>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    Extension(TargetUser(target)): Extension<TargetUser>,
    context: RequestContext,
) -> AuthResult<Json<UserMessageResponse>> {
    let deleted = UserResponse::from(&target);

    UserAdminUseCase::new(state.store.clone(), state.recorder.clone())
        .delete(&current.user, target, &context)
        .await?;

    Ok(Json(UserMessageResponse {
        message: "User deleted".into(),
        user: deleted,
    }))
}

/// GET /api/admin/teacher/students
pub async fn teacher_students<R: Store>(
    State(state): State<AuthAppState<R>>,
) -> AuthResult<Json<Vec<UserResponse>>> {
    let students = UserAdminUseCase::new(state.store.clone(), state.recorder.clone())
        .students()
        .await?;

    Ok(Json(user_responses(&students)))
}

// ============================================================================
// Activity
// ============================================================================

/// GET /api/admin/users/{id}/activity
pub async fn user_activity<R: Store>(
    State(state): State<AuthAppState<R>>,
    Extension(TargetUser(target)): Extension<TargetUser>,
    Query(query): Query<UserActivityQuery>,
) -> AuthResult<Json<Vec<ActivityLogResponse>>> {
    let filter = query.to_filter()?;
    let limit = query.limit.unwrap_or(DEFAULT_USER_ACTIVITY_LIMIT);

    let logs = ActivityQueryUseCase::new(state.store.clone(), state.store.clone())
        .for_user(target.user_id, filter, limit)
        .await?;

    Ok(Json(logs.iter().map(ActivityLogResponse::with_actor).collect()))
}

/// GET /api/admin/activity
pub async fn all_activity<R: Store>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<ActivityQuery>,
) -> AuthResult<Json<ActivityPageResponse>> {
    let filter = query.to_filter()?;
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_PAGE_LIMIT);

    let page = ActivityQueryUseCase::new(state.store.clone(), state.store.clone())
        .all(&filter, page, limit)
        .await?;

    Ok(Json(ActivityPageResponse::from(&page)))
}

/// GET /api/admin/dashboard
pub async fn dashboard<R: Store>(
    State(state): State<AuthAppState<R>>,
) -> AuthResult<Json<DashboardResponse>> {
    let dashboard = ActivityQueryUseCase::new(state.store.clone(), state.store.clone())
        .dashboard()
        .await?;

    Ok(Json(DashboardResponse::from(&dashboard)))
}

/// POST /api/activity-log
pub async fn submit_activity<R: Store>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    context: RequestContext,
    Json(req): Json<SubmitActivityRequest>,
) -> AuthResult<impl IntoResponse> {
    let log = SubmitActivityUseCase::new(state.recorder.clone(), state.config.clone())
        .execute(current.user.user_id, &req.activity_type, req.details, &context)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitActivityResponse {
            message: "Activity logged".into(),
            log: ActivityLogResponse::plain(&log),
        }),
    ))
}
