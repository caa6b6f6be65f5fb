//! Request extractors

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::core::AuthorizationContext;
use crate::state::AppState;

impl FromRequestParts<Arc<AppState>> for AuthorizationContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str())
            .transpose()
            .map_err(|_| ApiError::Unauthorized("Authorization header is not text".into()))?;

        let identity = state.bridge.authenticate(header).await?;
        Ok(identity.into())
    }
}
