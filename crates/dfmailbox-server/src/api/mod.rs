//! API module for the mailbox server

pub mod error;
pub mod extract;
pub mod handlers;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use error::ApiError;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub public_key: String,
    pub address: String,
    pub instance_count: usize,
    pub plot_count: usize,
}

/// GET /
pub async fn root() -> &'static str {
    "dfmailbox"
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Result<Json<ReadyResponse>, ApiError> {
    let instance_count = state
        .store
        .count_instances()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let plot_count = state
        .store
        .count_plots()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(ReadyResponse {
        ready: true,
        public_key: state.identity.public_key().to_base64url(),
        address: state.address.clone(),
        instance_count,
        plot_count,
    }))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration for browser-based clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Instance endpoints
        .route("/v0/instance", post(handlers::introduce_instance))
        .route("/v0/instance/{public_key}", get(handlers::lookup_instance))
        // Federation endpoints
        .route("/v0/federation/instance", get(handlers::answer_challenge))
        // Plot endpoints
        .route(
            "/v0/plot",
            post(handlers::register_plot)
                .get(handlers::get_plot)
                .put(handlers::update_plot_instance),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
