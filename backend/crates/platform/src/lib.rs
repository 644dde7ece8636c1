//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC-SHA256, Base64)
//! - Password hashing (Argon2id with tunable cost)
//! - Request context extraction (client IP, User-Agent)
//! - Outbound email dispatch

pub mod client;
pub mod crypto;
pub mod mail;
pub mod password;
