//! Auth Router
//!
//! Route layers run outermost-last: `authenticate` wraps every protected
//! route, then each route adds its role gate, then its target check or
//! completion hook closest to the handler.

use audit::{ActivityType, CompletionHook, record_on_completion};
use axum::middleware::from_fn_with_state;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::domain::policy::RoleGate;
use crate::infra::Store;
use crate::presentation::middleware::{authenticate, require_role, resolve_target};
use crate::presentation::{admin_handlers as admin, handlers};
use crate::presentation::handlers::AuthAppState;

/// `/auth`: account lifecycle
pub fn auth_router<R: Store>(state: AuthAppState<R>) -> Router {
    let protected = Router::new()
        .route("/logout", post(handlers::logout::<R>))
        .route("/me", get(handlers::me))
        .route_layer(from_fn_with_state(state.clone(), authenticate::<R>));

    Router::new()
        .route("/signup", post(handlers::sign_up::<R>))
        .route("/confirm-signup", post(handlers::confirm_sign_up::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/request-password-reset", post(handlers::request_password_reset::<R>))
        .route("/reset-password", post(handlers::reset_password::<R>))
        .route("/resend-confirmation", post(handlers::resend_confirmation::<R>))
        .route("/mock-emails", get(handlers::mock_emails::<R>))
        .route("/latest-code", get(handlers::latest_code::<R>))
        .merge(protected)
        .with_state(state)
}

/// `/admin`: user administration and the audit trail
pub fn admin_router<R: Store>(state: AuthAppState<R>) -> Router {
    let list_hook = CompletionHook::new(
        state.recorder.clone(),
        ActivityType::UserManagement,
        "list_users",
    );

    Router::new()
        .route(
            "/users",
            get(admin::list_users::<R>)
                .route_layer(from_fn_with_state(list_hook, record_on_completion::<R>))
                .route_layer(from_fn_with_state(RoleGate::ADMINS, require_role)),
        )
        .route(
            "/users/{id}",
            get(admin::get_user)
                .route_layer(from_fn_with_state(state.clone(), resolve_target::<R>))
                .merge(
                    delete(admin::delete_user::<R>)
                        .route_layer(from_fn_with_state(state.clone(), resolve_target::<R>))
                        .route_layer(from_fn_with_state(RoleGate::DEVELOPER, require_role)),
                ),
        )
        .route(
            "/users/{id}/role",
            put(admin::change_role::<R>)
                .route_layer(from_fn_with_state(state.clone(), resolve_target::<R>))
                .route_layer(from_fn_with_state(RoleGate::ADMINS, require_role)),
        )
        .route(
            "/users/{id}/status",
            put(admin::change_status::<R>)
                .route_layer(from_fn_with_state(state.clone(), resolve_target::<R>))
                .route_layer(from_fn_with_state(RoleGate::ADMINS, require_role)),
        )
        .route(
            "/users/{id}/activity",
            get(admin::user_activity::<R>).route_layer(from_fn_with_state(state.clone(), resolve_target::<R>)),
        )
        .route(
            "/activity",
            get(admin::all_activity::<R>).route_layer(from_fn_with_state(RoleGate::ADMINS, require_role)),
        )
        .route(
            "/dashboard",
            get(admin::dashboard::<R>).route_layer(from_fn_with_state(RoleGate::ADMINS, require_role)),
        )
        .route(
            "/teacher/students",
            get(admin::teacher_students::<R>).route_layer(from_fn_with_state(RoleGate::STAFF, require_role)),
        )
        .route_layer(from_fn_with_state(state.clone(), authenticate::<R>))
        .with_state(state)
}

/// `/activity-log`: client submissions
pub fn activity_log_router<R: Store>(state: AuthAppState<R>) -> Router {
    Router::new()
        .route("/", post(admin::submit_activity::<R>))
        .route_layer(from_fn_with_state(state.clone(), authenticate::<R>))
        .with_state(state)
}

/// Everything above, nested the way the API serves it
pub fn api_router<R: Store>(state: AuthAppState<R>) -> Router {
    Router::new()
        .nest("/auth", auth_router(state.clone()))
        .nest("/admin", admin_router(state.clone()))
        .nest("/activity-log", activity_log_router(state))
}
