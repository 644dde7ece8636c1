//! Presentation Layer
//!
//! HTTP handlers, DTOs, routers, and the authorization middleware.

pub mod admin_handlers;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{CurrentUser, TargetUser, authenticate, require_role, resolve_target};
pub use router::{activity_log_router, admin_router, api_router, auth_router};
