mod auth;
mod config;
mod db;
mod documents;
mod errors;
mod gateway;
mod history;
mod models;
mod presentation;
mod quiz;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{watch_auth_state, AuthProvider, LocalAuthProvider};
use crate::config::Config;
use crate::documents::{DocumentStore, InMemoryDocumentStore, PgDocumentStore};
use crate::gateway::RequestGateway;
use crate::history::slot::open_slot;
use crate::quiz::service::QuizService;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting career quiz v{}", env!("CARGO_PKG_VERSION"));

    // Local history slot
    let slot = open_slot(&config.history_store_url)?;
    info!(
        "History store: {} (scope: {:?})",
        config.history_store_url, config.history_scope
    );

    // Document store for full quiz responses
    let documents: Arc<dyn DocumentStore> = match &config.document_store_url {
        Some(url) => {
            let store = PgDocumentStore::connect(url).await?;
            info!("Document store: PostgreSQL");
            Arc::new(store)
        }
        None => {
            info!("Document store: in-memory");
            Arc::new(InMemoryDocumentStore::default())
        }
    };

    // Recommendation API client
    let gateway = RequestGateway::new(
        reqwest::Client::new(),
        &config.recommend_api_url,
        config.request_timeout,
    );
    info!(
        "Recommendation API: {} (timeout {}s)",
        config.recommend_api_url,
        gateway.timeout().as_secs()
    );

    // Auth, with one subscriber logging every state change
    let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuthProvider::new());
    tokio::spawn(watch_auth_state(auth.subscribe()));

    let quiz = QuizService::new(
        gateway,
        slot,
        config.history_scope,
        documents,
        config.require_login,
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        quiz: Arc::new(quiz),
        auth,
    };

    let addr = SocketAddr::new(config.host, config.port);
    if !config.host.is_loopback() {
        warn!("Listening on non-loopback {addr}: every client shares the signed-in session");
    }

    // Build router; cross-origin requests are only allowed from our own origin
    let origin = HeaderValue::from_str(&format!("http://{addr}"))
        .context("listen address is not a valid origin")?;
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(origin));

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
