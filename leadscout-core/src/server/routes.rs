//! Routes, handlers, and the serve loop.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::HeaderValue,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::ServerConfig;
use super::error::ApiError;
use crate::error::{ConfigError, ScoutError};
use crate::research::{ResearchGateway, ResearchRequest};

/// Shared state for handlers. Read-only after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: ResearchGateway,
}

impl AppState {
    pub fn new(gateway: ResearchGateway) -> Self {
        Self { gateway }
    }
}

/// Credentialed CORS for the configured origins. Methods and headers are
/// mirrored from the preflight, since wildcards are not allowed together with
/// credentials.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, ConfigError> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                message: format!("invalid CORS origin '{}': {}", origin, e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Build the axum Router with `/`, `/api/hello`, and `/research`.
///
/// Idea length is not capped here; the upstream enforces its own limits.
pub fn router(state: AppState, config: &ServerConfig) -> Result<Router, ConfigError> {
    Ok(Router::new()
        .route("/", get(root_handler))
        .route("/api/hello", get(hello_handler))
        .route("/research", post(research_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Hello from StartupLeadScout API!" }))
}

async fn hello_handler() -> Json<Value> {
    Json(json!({ "message": "Hello World!" }))
}

async fn research_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let outcome = state.gateway.handle(&request.idea).await?;
    Ok(Json(outcome.into_value()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Serve until Ctrl-C.
pub async fn run(config: &ServerConfig, state: AppState) -> Result<(), ScoutError> {
    if !state.gateway.is_configured() {
        warn!("No upstream API key configured; /research will answer 500 until one is set");
    }
    let app = router(state, config)?;
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "StartupLeadScout API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
