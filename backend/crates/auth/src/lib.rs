//! Auth (Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Users, roles, the role policy, repository traits
//! - `application/` - Credentials and use cases
//! - `infra/` - Postgres and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, middleware, routers
//!
//! ## Features
//! - Email signup with a six digit confirmation code
//! - Login with signed, expiring bearer tokens; logout revokes the token
//! - Password reset through an emailed code
//! - Four ranked roles (Developer, Admin, Teacher, Student)
//! - User administration and an activity audit trail
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional server-side pepper
//! - Every request re-reads the stored user; role and active flag come from
//!   the store, never from the token
//! - Developer role can only be granted or revoked by a Developer

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryStore, PgStore, Store};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::api_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

#[cfg(test)]
mod tests;
