//! roombook server entry point.
//!
//! Loads configuration, opens the configured store and serves the REST API.

use std::sync::Arc;

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roombook::api;
use roombook::app_state::AppState;
use roombook::auth::StaticTokenProvider;
use roombook::config::{ServiceConfig, StoreBackend};
use roombook::domain::SystemClock;
use roombook::persistence::memory::MemoryStore;
use roombook::persistence::postgres::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    tracing::info!(addr = %config.listen_addr, backend = ?config.store_backend, "starting roombook");

    let identity = Arc::new(
        StaticTokenProvider::parse(&config.auth_tokens).context("invalid AUTH_TOKENS")?,
    );
    if identity.is_empty() {
        tracing::warn!("AUTH_TOKENS is empty, every guarded endpoint will answer 401");
    } else {
        tracing::info!(tokens = identity.len(), "static tokens loaded");
    }
    let clock = Arc::new(SystemClock);

    let app_state = match config.store_backend {
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(&config)
                .await
                .context("connecting to PostgreSQL")?;
            if config.run_migrations {
                store.migrate().await.context("running migrations")?;
                tracing::info!("migrations applied");
            }
            AppState::new(Arc::new(store), clock, identity, config.access)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store, data is lost on exit");
            AppState::new(Arc::new(MemoryStore::new()), clock, identity, config.access)
        }
    };

    let app = api::build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// `RUST_LOG` selects levels (default `info`); `LOG_FORMAT=json` switches
/// to one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
