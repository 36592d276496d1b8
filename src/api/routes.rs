//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::ChatCompletionsClient;
use crate::pipeline::QueryPipeline;
use crate::retrieval::init_retrieval;

use super::types::*;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Answers every query; holds the model and retrieval gateways
    pub pipeline: QueryPipeline,
}

/// Build the router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/run", post(run_query))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(ChatCompletionsClient::from_config(&config)?);
    let retriever = init_retrieval(&config.retrieval);
    let pipeline = QueryPipeline::new(&config, llm, retriever);

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState { config, pipeline });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Setup graceful shutdown on SIGTERM/SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, finishing in-flight requests");
}

/// Answer one user message. Always 200 for well-formed requests.
async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Json<RunResponse> {
    tracing::info!(
        "Received query ({} chars, {} prior turns)",
        req.query.len(),
        req.conversation.len()
    );
    let result = state.pipeline.process(&req.query, &req.conversation).await;
    Json(RunResponse { result })
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.default_model.clone(),
        max_iterations: state.pipeline.max_iterations(),
        retrieval_enabled: state.pipeline.retrieval_enabled(),
    })
}
