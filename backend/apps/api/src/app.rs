//! Router Assembly
//!
//! Everything is served under `/api`: the auth routers plus a health probe.

use auth::{AuthAppState, PgStore, Store, api_router};
use axum::extract::State;
use axum::http::{self, Method, header};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

/// Backing store as seen by the health probe
#[derive(Clone)]
pub enum Database {
    Postgres(PgStore),
    InMemory,
}

impl Database {
    async fn connected(&self) -> bool {
        match self {
            Database::Postgres(store) => store.ping().await,
            Database::InMemory => false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub db_connected: bool,
}

/// GET /api/health
async fn health(State(database): State<Database>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "API is running",
        db_connected: database.connected().await,
    })
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    // tower-http refuses `*` alongside credentials
    let allowed_origins: Vec<http::HeaderValue> = origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}

pub fn build_app<R>(state: AuthAppState<R>, database: Database, origins: &[String]) -> Router
where
    R: Store,
{
    let health = Router::new()
        .route("/health", get(health))
        .with_state(database);

    Router::new()
        .nest("/api", api_router(state).merge(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::{AuthConfig, MemoryStore};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use platform::mail::{Mailer, Outbox};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AuthAppState::new(
            MemoryStore::new(),
            AuthConfig::for_tests(),
            Mailer::Outbox(Outbox::new()),
        );
        build_app(state, Database::InMemory, &["http://localhost:5173".to_string()])
    }

    #[tokio::test]
    async fn test_health_reports_store() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["dbConnected"], false);
    }

    #[tokio::test]
    async fn test_auth_routes_nested_under_api() {
        let response = app()
            .oneshot(Request::get("/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_cors_skips_invalid_origins() {
        // Construction must not panic on a bad entry
        let _ = cors_layer(&["http://ok.example".into(), "bad\norigin".into()]);
        let _ = cors_layer(&["*".into(), "http://ok.example".into()]);
    }
}
