//! HTTP+JSON transport for the scoring service

pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::scoring::ScoringService;

pub use error::HttpError;
pub use handlers::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .route("/threshold-policy", get(handlers::threshold_policy))
        .with_state(state)
}

fn build_router_with_layers(state: AppState, config: &ServerConfig) -> Router {
    build_router(state)
        .layer(CatchPanicLayer::new())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
}

/// Serve the scoring API until Ctrl-C
pub async fn serve(config: &ServerConfig, service: ScoringService) -> Result<()> {
    let app = build_router_with_layers(AppState { service }, config);

    let addr: std::net::SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_addr))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Scoring service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
