//! Instance API Handlers
//!
//! Endpoints for federated instances:
//! - Introduce an instance (ownership proof against its claimed address)
//! - Look up an instance's address by public key

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use dfmailbox_core::Instance;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::registry::IntroduceOutcome;
use crate::state::AppState;

/// Request to introduce (or move) an instance
#[derive(Debug, Deserialize)]
pub struct IntroduceRequest {
    /// Base64url Ed25519 public key
    #[serde(alias = "publicKey")]
    pub public_key: String,
    /// `host:port` the instance answers challenges on
    pub address: String,
    /// Move an already introduced key to `address`
    #[serde(default, alias = "allowUpdate")]
    pub allow_update: bool,
}

/// Reject addresses that could not be a bare `host[:port]`
fn check_address(address: &str) -> Result<(), ApiError> {
    let valid = !address.is_empty()
        && address.len() <= 255
        && !address
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | '\\'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!(
            "'{}' is not a host:port address",
            address
        )))
    }
}

/// POST /v0/instance
///
/// Prove that the caller controls `public_key` at `address` and record it.
pub async fn introduce_instance(
    State(state): State<Arc<AppState>>,
    request: Result<Json<IntroduceRequest>, JsonRejection>,
) -> Result<Json<Instance>, ApiError> {
    let Json(request) = request?;
    check_address(&request.address)?;

    let outcome = state
        .instances
        .introduce(&request.public_key, &request.address, request.allow_update)
        .await?;

    let instance = outcome.instance().clone();
    match outcome {
        IntroduceOutcome::Created(_) => {
            info!(public_key = %instance.public_key, "Introduced instance via API")
        }
        IntroduceOutcome::Updated(_) => {
            info!(public_key = %instance.public_key, "Moved instance via API")
        }
    }
    Ok(Json(instance))
}

/// GET /v0/instance/{public_key}
pub async fn lookup_instance(
    State(state): State<Arc<AppState>>,
    Path(public_key): Path<String>,
) -> Result<Json<Instance>, ApiError> {
    Ok(Json(state.instances.lookup(&public_key).await?))
}
