//! API server
//!
//! Startup failures are `anyhow`; request failures render as
//! `kernel::error::app_error::AppError`.

mod app;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::application::seed_developer;
use auth::{AuthAppState, MemoryStore, PgStore, Store};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{Database, build_app};
use crate::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,audit=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    tracing::info!(
        development = config.auth.development,
        port = config.port,
        "Configuration loaded"
    );

    match connect(&config).await {
        Some(pool) => {
            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;
            tracing::info!("Migrations completed");

            let store = PgStore::new(pool);
            serve(store.clone(), Database::Postgres(store), config).await
        }
        None => {
            let store = MemoryStore::new();
            if let Some((email, password)) = &config.seed_developer {
                let auth_config = Arc::new(config.auth.clone());
                match seed_developer(&store, auth_config, email, password.clone()).await {
                    Ok(true) => {}
                    Ok(false) => tracing::info!("Seed developer already present"),
                    Err(e) => tracing::warn!(error = %e, "Developer seeding failed"),
                }
            }
            serve(store, Database::InMemory, config).await
        }
    }
}

/// PostgreSQL pool, or `None` to fall back to the in-memory store
async fn connect(config: &ApiConfig) -> Option<PgPool> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory store");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(config.connect_timeout)
        .connect(database_url);

    match tokio::time::timeout(config.connect_timeout, pool).await {
        Ok(Ok(pool)) => {
            tracing::info!("Connected to database");
            Some(pool)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Database unreachable, using in-memory store");
            None
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = config.connect_timeout.as_secs(),
                "Database connection timed out, using in-memory store"
            );
            None
        }
    }
}

async fn serve<R>(store: R, database: Database, config: ApiConfig) -> anyhow::Result<()>
where
    R: Store,
{
    // Startup cleanup: expired revocations
    // Errors here should not prevent server startup
    match store.cleanup_expired().await {
        Ok(removed) => {
            tracing::info!(revocations_deleted = removed, "Token revocation cleanup completed");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Token revocation cleanup failed, continuing anyway"
            );
        }
    }

    let mailer = config.mailer()?;
    let state = AuthAppState::new(store, config.auth, mailer);
    let app = build_app(state, database, &config.frontend_origins);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
