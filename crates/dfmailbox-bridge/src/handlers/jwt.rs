//! JWT Credential Handler
//!
//! Validates HS256 tokens minted by a front-end that shares a secret with
//! the mailbox. The token names the owner in `sub` and the plot in `plot_id`.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dfmailbox_core::PlotId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bridge::CredentialHandler;
use crate::error::{BridgeError, Result};
use crate::types::{CredentialType, ValidatedIdentity};

/// Claims carried by a plot token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotClaims {
    /// Owner UUID
    pub sub: String,
    /// Plot the bearer acts for
    pub plot_id: PlotId,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Display name, informational only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// JWT Credential Handler
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
}

impl JwtHandler {
    /// Create a handler for tokens signed with `secret`
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: None,
        }
    }

    /// Require and stamp a specific `iss`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }

    /// Mint a token for `owner` acting on `plot_id`, valid for `ttl`
    pub fn issue(&self, owner: Uuid, plot_id: PlotId, ttl: chrono::Duration) -> Result<String> {
        let claims = PlotClaims {
            sub: owner.to_string(),
            plot_id,
            exp: (Utc::now() + ttl).timestamp(),
            iss: self.issuer.clone(),
            username: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| BridgeError::Internal(e.to_string()))
    }
}

#[async_trait]
impl CredentialHandler for JwtHandler {
    fn credential_type(&self) -> CredentialType {
        CredentialType::Bearer
    }

    fn description(&self) -> &str {
        "HS256 plot token handler"
    }

    async fn validate(&self, credential: &str) -> Result<ValidatedIdentity> {
        let token_data = decode::<PlotClaims>(credential, &self.decoding_key, &self.validation())?;
        let claims = token_data.claims;

        let owner = Uuid::parse_str(&claims.sub)
            .map_err(|e| BridgeError::InvalidFormat(format!("sub is not a UUID: {}", e)))?;

        let mut identity = ValidatedIdentity::new(owner, claims.plot_id);
        if let Some(exp_time) = Utc.timestamp_opt(claims.exp, 0).single() {
            identity = identity.with_expires_at(exp_time);
        }
        if let Some(username) = claims.username {
            identity = identity.with_username(username);
        }

        Ok(identity)
    }
}
