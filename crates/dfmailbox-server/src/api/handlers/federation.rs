//! Federation API Handlers
//!
//! The mailbox is itself a federation participant: it answers ownership
//! challenges for its own address like any other instance.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use dfmailbox_core::{Challenge, IdentityProof};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::api::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub challenge: String,
}

/// GET /v0/federation/instance?challenge=<uuid>
///
/// Signs `own address ++ raw challenge bytes` with this mailbox's key.
pub async fn answer_challenge(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ChallengeQuery>, QueryRejection>,
) -> Result<Json<IdentityProof>, ApiError> {
    let Query(query) = query?;
    let challenge = Challenge::parse(&query.challenge)
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    debug!(challenge = %challenge.query_value(), "Answering ownership challenge");
    Ok(Json(IdentityProof::answer(
        &state.identity,
        &state.address,
        &challenge,
    )))
}
