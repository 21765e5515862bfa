pub mod health;
pub mod parse;

use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing::info;

use promdeps::MetricExtractor;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// HTTP server state shared across all handlers
#[derive(Clone)]
pub struct HttpState {
    pub extractor: MetricExtractor,
    pub service_start_time: Instant,
}

impl Default for HttpState {
    fn default() -> Self {
        Self {
            extractor: MetricExtractor::default(),
            service_start_time: Instant::now(),
        }
    }
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: HttpState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/parse",
            post(parse::parse_handler).fallback(parse::method_not_allowed),
        )
        .route("/health", get(health::health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Run the HTTP server until ctrl-c is received
pub async fn run_http_server(config: &ServerConfig) -> Result<(), ServerError> {
    let addr = config.socket_addr().map_err(|source| ServerError::Address {
        addr: config.address(),
        source,
    })?;

    let app = create_router(HttpState::default(), config.max_body_bytes);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!(%addr, max_body_bytes = config.max_body_bytes, "starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}
