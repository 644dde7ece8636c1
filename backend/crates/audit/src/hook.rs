//! Route Completion Hook
//!
//! Middleware "after" stage: runs the inner service, then records one
//! activity for the authenticated actor with the request line, the
//! response status and any [`AuditDetails`] the handler attached.
//! Error responses are recorded the same way as successes.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::id::UserId;
use platform::client::RequestContext;
use serde_json::{Value, json};

use crate::domain::activity_log::Details;
use crate::domain::activity_type::ActivityType;
use crate::domain::repository::ActivityLogRepository;
use crate::recorder::{AuditEntry, AuditRecorder};

/// Request extension naming the authenticated actor.
///
/// Inserted by the authentication middleware; without it the hook
/// records nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditActor(pub UserId);

/// Response extension carrying handler-specific details
#[derive(Debug, Clone, Default)]
pub struct AuditDetails(pub Details);

impl AuditDetails {
    /// Attach to a response
    pub fn attach(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Hook configuration for one route
pub struct CompletionHook<R> {
    recorder: AuditRecorder<R>,
    activity_type: ActivityType,
    action: &'static str,
}

impl<R> Clone for CompletionHook<R> {
    fn clone(&self) -> Self {
        Self {
            recorder: self.recorder.clone(),
            activity_type: self.activity_type.clone(),
            action: self.action,
        }
    }
}

impl<R> CompletionHook<R> {
    pub fn new(recorder: AuditRecorder<R>, activity_type: ActivityType, action: &'static str) -> Self {
        Self {
            recorder,
            activity_type,
            action,
        }
    }
}

/// Use with `axum::middleware::from_fn_with_state(hook, record_on_completion::<R>)`
pub async fn record_on_completion<R>(
    State(hook): State<CompletionHook<R>>,
    req: Request,
    next: Next,
) -> Response
where
    R: ActivityLogRepository + Send + Sync + 'static,
{
    let actor = req.extensions().get::<AuditActor>().copied();
    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let context = RequestContext::from_headers(req.headers(), direct_ip);

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = Query::<BTreeMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();

    let response = next.run(req).await;

    let Some(AuditActor(user_id)) = actor else {
        return response;
    };

    let mut details = response
        .extensions()
        .get::<AuditDetails>()
        .map(|d| d.0.clone())
        .unwrap_or_default();
    details.insert("action".into(), Value::from(hook.action));
    details.insert("method".into(), Value::from(method));
    details.insert("path".into(), Value::from(path));
    details.insert("query".into(), json!(query));
    details.insert(
        "responseStatus".into(),
        Value::from(response.status().as_u16()),
    );

    hook.recorder.record(
        AuditEntry::by_self(user_id, hook.activity_type.clone())
            .details_map(details)
            .context(&context),
    );

    response
}
