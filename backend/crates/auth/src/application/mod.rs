//! Application Layer
//!
//! Use cases and application services.

pub mod activity_query;
pub mod config;
pub mod confirm_sign_up;
pub mod credentials;
pub mod notifications;
pub mod password_reset;
pub mod resend_confirmation;
pub mod seed;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod submit_activity;
pub mod user_admin;

// Re-exports
pub use activity_query::{ActivityPage, ActivityQueryUseCase, Dashboard, PopulatedLog};
pub use config::AuthConfig;
pub use confirm_sign_up::{ConfirmSignUpInput, ConfirmSignUpUseCase};
pub use credentials::{CredentialService, IssuedToken, SessionClaims};
pub use password_reset::{PasswordResetUseCase, ResetPasswordInput, ResetRequestOutcome};
pub use resend_confirmation::ResendConfirmationUseCase;
pub use seed::seed_developer;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use submit_activity::SubmitActivityUseCase;
pub use user_admin::UserAdminUseCase;
