//! Domain Layer

pub mod activity_log;
pub mod activity_type;
pub mod filter;
pub mod repository;
