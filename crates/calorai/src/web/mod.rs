//! Axum web server for the analysis form.

mod handlers;
mod page;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use calorai_core::Analyzer;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info_span;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Prompt prefilled in a fresh form
    pub default_prompt: Arc<str>,
}

impl AppState {
    pub fn new(analyzer: Analyzer, default_prompt: impl Into<Arc<str>>) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            default_prompt: default_prompt.into(),
        }
    }
}

/// Form overhead allowed on top of the image size limit.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .analyzer
        .options()
        .limits
        .max_file_size_bytes()
        .saturating_add(FORM_OVERHEAD_BYTES);

    let trace_layer = TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request| {
            let uri = request.uri().to_string();
            info_span!("http_request", method = ?request.method(), uri)
        },
    );

    Router::new()
        .route("/", get(handlers::index))
        .route("/analyze", post(handlers::analyze))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(trace_layer)
        .with_state(state)
}

/// Run the web server until Ctrl-C.
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("CalorAI listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
