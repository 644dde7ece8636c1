//! Shared Kernel - Domain-crossing minimal core
//!
//! The vocabulary shared by the identity and audit contexts:
//! - [`error::app_error::AppError`] and its [`error::kind::ErrorKind`]
//! - Typed ID wrappers ([`id::UserId`], [`id::ActivityLogId`])
//!
//! Anything that is not needed by both contexts belongs in their crates.

pub mod error {
    pub mod app_error;
    pub mod kind;
    #[cfg(feature = "axum")]
    pub mod response;
}
pub mod id;
