//! Domain Layer
//!
//! Entities, value objects, the role policy and repository traits.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::user::User;
pub use repository::{RevokedTokenRepository, UserFilter, UserRepository};
