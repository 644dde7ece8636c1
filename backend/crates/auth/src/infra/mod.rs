//! Infrastructure Layer
//!
//! Store adapters. Both implement every repository trait the service
//! needs, and the binary picks one at startup.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use audit::ActivityLogRepository;

use crate::domain::repository::{RevokedTokenRepository, UserRepository};

/// Everything a handler may touch, behind one type parameter
pub trait Store:
    UserRepository + RevokedTokenRepository + ActivityLogRepository + Clone + Send + Sync + 'static
{
}

impl<T> Store for T where
    T: UserRepository + RevokedTokenRepository + ActivityLogRepository + Clone + Send + Sync + 'static
{
}
