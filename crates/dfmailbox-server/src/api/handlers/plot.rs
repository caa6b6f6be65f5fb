//! Plot API Handlers
//!
//! All plot endpoints act on the plot named by the caller's identity
//! context; the extractor rejects unauthenticated callers before the body is
//! read or any record is touched.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use dfmailbox_core::Plot;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::core::AuthorizationContext;
use crate::state::AppState;

/// Body of plot registration and instance updates
#[derive(Debug, Deserialize)]
pub struct PlotInstanceRequest {
    /// Instance to federate the plot to; `null` for none
    #[serde(default, alias = "publicKey")]
    pub public_key: Option<String>,
}

/// POST /v0/plot
pub async fn register_plot(
    State(state): State<Arc<AppState>>,
    ctx: AuthorizationContext,
    request: Result<Json<PlotInstanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Plot>), ApiError> {
    let Json(request) = request?;
    let plot = state
        .plots
        .register(&ctx, request.public_key.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(plot)))
}

/// GET /v0/plot
pub async fn get_plot(
    State(state): State<Arc<AppState>>,
    ctx: AuthorizationContext,
) -> Result<Json<Plot>, ApiError> {
    Ok(Json(state.plots.get(&ctx).await?))
}

/// PUT /v0/plot
pub async fn update_plot_instance(
    State(state): State<Arc<AppState>>,
    ctx: AuthorizationContext,
    request: Result<Json<PlotInstanceRequest>, JsonRejection>,
) -> Result<Json<Plot>, ApiError> {
    let Json(request) = request?;
    let plot = state
        .plots
        .update_instance(&ctx, request.public_key.as_deref())
        .await?;
    Ok(Json(plot))
}
