//! HTTP server for the dashboard client.
//!
//! Every endpoint is a read: handlers fetch from the store, run the pure
//! analysis code and serialize the result. Requests share nothing but the
//! store handle and the aggregation options.

pub mod routes;

use crate::analysis::AggregateOptions;
use crate::config::ServerConfig;
use crate::store::DataStore;
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// State shared across handlers.
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub options: AggregateOptions,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, options: AggregateOptions) -> SharedState {
        Arc::new(Self { store, options })
    }
}

/// Create the API router.
pub fn create_router(state: SharedState, config: &ServerConfig) -> Result<Router> {
    let router = Router::new()
        .route("/status", get(routes::status))
        .route("/data/all", get(routes::all_responses))
        .route("/data/by-question/:questionId", get(routes::responses_by_question))
        .route(
            "/data/by-participant/:participantId",
            get(routes::responses_by_participant),
        )
        .route("/data/descriptive-codes", get(routes::descriptive_codes))
        .route(
            "/data/descriptive-codes/stats",
            get(routes::descriptive_code_stats),
        )
        .route("/data/participants", get(routes::participants))
        .route("/data/participants/summary", get(routes::participant_summary))
        .route("/data/questions", get(routes::questions))
        .route("/data/question/:questionId", get(routes::question))
        .route("/data/question-data", get(routes::question_data))
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

/// CORS policy: any origin when none are configured, otherwise the configured list.
fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);

    if config.allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: SharedState, config: &ServerConfig) -> Result<()> {
    let app = create_router(state, config)?;
    let addr = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("API running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
