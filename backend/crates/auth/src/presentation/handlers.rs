//! HTTP Handlers: account lifecycle

use std::sync::Arc;

use audit::AuditRecorder;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use platform::client::RequestContext;
use platform::mail::{Mailer, Outbox};

use crate::application::config::AuthConfig;
use crate::application::notifications::extract_code;
use crate::application::{
    ConfirmSignUpInput, ConfirmSignUpUseCase, PasswordResetUseCase, ResendConfirmationUseCase,
    ResetPasswordInput, SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::Store;
use crate::presentation::dto::{
    ConfirmSignUpRequest, EmailQuery, EmailRequest, LatestCodeResponse, LoginRequest,
    LoginResponse, MessageResponse, ResetPasswordRequest, SignUpRequest, UserResponse,
    UserSummary,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: Store,
{
    pub store: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub mailer: Mailer,
    pub recorder: AuditRecorder<R>,
}

impl<R> AuthAppState<R>
where
    R: Store,
{
    pub fn new(store: R, config: AuthConfig, mailer: Mailer) -> Self {
        let store = Arc::new(store);
        Self {
            recorder: AuditRecorder::new(store.clone()),
            store,
            config: Arc::new(config),
            mailer,
        }
    }

    /// The outbox, when outbox inspection is enabled
    fn dev_outbox(&self) -> AuthResult<&Outbox> {
        if !self.config.development {
            return Err(AuthError::NotAvailable);
        }
        self.mailer.outbox().ok_or(AuthError::NotAvailable)
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R: Store>(
    State(state): State<AuthAppState<R>>,
    context: RequestContext,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<impl IntoResponse> {
    let use_case = SignUpUseCase::new(
        state.store.clone(),
        state.recorder.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let input = SignUpInput {
        name: req.name,
        email: req.email,
        password: req.password,
    };
    use_case.execute(input, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "User registered. Please check your email for confirmation code.",
        )),
    ))
}

/// POST /api/auth/confirm-signup
pub async fn confirm_sign_up<R: Store>(
    State(state): State<AuthAppState<R>>,
    context: RequestContext,
    Json(req): Json<ConfirmSignUpRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = ConfirmSignUpUseCase::new(state.store.clone(), state.recorder.clone());

    let input = ConfirmSignUpInput {
        email: req.email,
        code: req.code,
    };
    use_case.execute(input, &context).await?;

    Ok(Json(MessageResponse::new("Signup confirmed. You can now log in.")))
}

/// POST /api/auth/resend-confirmation
pub async fn resend_confirmation<R: Store>(
    State(state): State<AuthAppState<R>>,
    context: RequestContext,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = ResendConfirmationUseCase::new(
        state.store.clone(),
        state.recorder.clone(),
        state.mailer.clone(),
    );
    use_case.execute(&req.email, &context).await?;

    Ok(Json(MessageResponse::new("New confirmation code sent to your email")))
}

// ============================================================================
// Sign In / Sign Out
// ============================================================================

/// POST /api/auth/login
pub async fn login<R: Store>(
    State(state): State<AuthAppState<R>>,
    context: RequestContext,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<LoginResponse>> {
    let use_case = SignInUseCase::new(
        state.store.clone(),
        state.recorder.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
    };
    let output = use_case.execute(input, &context).await?;

    Ok(Json(LoginResponse {
        user: UserSummary::from(&output.user),
        token: output.token.token,
    }))
}

/// POST /api/auth/logout
pub async fn logout<R: Store>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    context: RequestContext,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = SignOutUseCase::new(state.store.clone(), state.recorder.clone());
    use_case.execute(&current.claims, &context).await?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// GET /api/auth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&current.user))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/auth/request-password-reset
pub async fn request_password_reset<R: Store>(
    State(state): State<AuthAppState<R>>,
    context: RequestContext,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = PasswordResetUseCase::new(
        state.store.clone(),
        state.recorder.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.request(&req.email, &context).await?;

    let message = if state.config.reset_discloses_unknown_email {
        "Password reset code sent to your email"
    } else {
        "If an account exists for this email, a password reset code has been sent"
    };
    Ok(Json(MessageResponse::new(message)))
}

/// POST /api/auth/reset-password
pub async fn reset_password<R: Store>(
    State(state): State<AuthAppState<R>>,
    context: RequestContext,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = PasswordResetUseCase::new(
        state.store.clone(),
        state.recorder.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let input = ResetPasswordInput {
        email: req.email,
        code: req.code,
        new_password: req.new_password,
    };
    use_case.reset(input, &context).await?;

    Ok(Json(MessageResponse::new(
        "Password reset successful. You can now log in with your new password.",
    )))
}

// ============================================================================
// Development outbox
// ============================================================================

/// GET /api/auth/mock-emails
pub async fn mock_emails<R: Store>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<EmailQuery>,
) -> AuthResult<impl IntoResponse> {
    let outbox = state.dev_outbox()?;

    let mails = match query.email.as_deref() {
        Some(email) => outbox.for_recipient(email.trim()).await,
        None => outbox.all().await,
    };
    Ok(Json(mails))
}

/// GET /api/auth/latest-code
pub async fn latest_code<R: Store>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<EmailQuery>,
) -> AuthResult<Json<LatestCodeResponse>> {
    let outbox = state.dev_outbox()?;

    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::InvalidInput("Email parameter is required".into()))?;

    let mail = outbox
        .latest_for(email)
        .await
        .ok_or(AuthError::NoEmailsFound)?;

    Ok(Json(LatestCodeResponse {
        code: extract_code(&mail.text).map(str::to_string),
        email: mail.to,
        subject: mail.subject,
        sent_at: mail.sent_at,
    }))
}
