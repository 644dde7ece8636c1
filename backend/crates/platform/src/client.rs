//! Client identification utilities
//!
//! Captures the originating IP address and User-Agent of a request so they
//! can be attached to audit records.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, header, request::Parts};

/// User-Agent values longer than this are truncated before storage
pub const MAX_USER_AGENT_LENGTH: usize = 512;

/// Where a request came from
///
/// Both fields are optional: a request without a socket address (e.g. in
/// tests) or without a User-Agent header still produces a context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// Original User-Agent string
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    /// Build from headers plus the direct peer address, if known
    pub fn from_headers(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        Self {
            ip: extract_client_ip(headers, direct_ip),
            user_agent: extract_user_agent(headers),
        }
    }

    /// Get IP as string (for storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(Self::from_headers(&parts.headers, direct_ip))
    }
}

/// Extract the User-Agent header, truncated to [`MAX_USER_AGENT_LENGTH`]
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())?
        .trim();

    if user_agent.is_empty() {
        return None;
    }

    Some(user_agent.chars().take(MAX_USER_AGENT_LENGTH).collect())
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}
