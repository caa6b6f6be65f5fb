//! Identity Bridge - routes credentials to the handler for their scheme

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, Result};
use crate::types::{CredentialType, ValidatedIdentity};

/// Trait for credential handlers
///
/// Each handler validates one credential type and extracts the caller's
/// owner and plot.
#[async_trait]
pub trait CredentialHandler: Send + Sync {
    /// Get the type of credential this handler processes
    fn credential_type(&self) -> CredentialType;

    /// Validate a credential and extract the identity
    async fn validate(&self, credential: &str) -> Result<ValidatedIdentity>;

    /// Get a description of this handler (for logging)
    fn description(&self) -> &str {
        "credential handler"
    }
}

/// Identity Bridge - routes credentials to handlers
pub struct IdentityBridge {
    handlers: HashMap<CredentialType, Arc<dyn CredentialHandler>>,
}

impl IdentityBridge {
    /// Create a new bridge with no handlers; every credential is rejected
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a credential handler
    pub fn register_handler<H: CredentialHandler + 'static>(&mut self, handler: H) {
        let credential_type = handler.credential_type();
        info!(
            credential_type = %credential_type,
            description = handler.description(),
            "Registered credential handler"
        );
        self.handlers.insert(credential_type, Arc::new(handler));
    }

    /// Check if a handler is registered for a credential type
    pub fn has_handler(&self, credential_type: CredentialType) -> bool {
        self.handlers.contains_key(&credential_type)
    }

    /// List all registered credential types
    pub fn registered_types(&self) -> Vec<CredentialType> {
        self.handlers.keys().cloned().collect()
    }

    /// Validate a credential of a known type
    pub async fn validate(
        &self,
        credential: &str,
        credential_type: CredentialType,
    ) -> Result<ValidatedIdentity> {
        let handler = self
            .handlers
            .get(&credential_type)
            .ok_or(BridgeError::NoHandler(credential_type))?;

        let identity = handler.validate(credential).await?;

        if identity.is_expired() {
            return Err(BridgeError::Expired(
                identity
                    .expires_at
                    .map(|exp| exp.to_rfc3339())
                    .unwrap_or_default(),
            ));
        }

        debug!(
            credential_type = %credential_type,
            owner = %identity.owner,
            plot_id = identity.plot_id,
            "Credential validated"
        );

        Ok(identity)
    }

    /// Authenticate the raw value of an `Authorization` header
    ///
    /// Expects `<scheme> <credential>`; the scheme selects the handler.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<ValidatedIdentity> {
        let header = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(BridgeError::MissingCredential)?;

        let (scheme, credential) = header
            .split_once(char::is_whitespace)
            .map(|(s, c)| (s, c.trim()))
            .filter(|(_, c)| !c.is_empty())
            .ok_or_else(|| {
                BridgeError::MalformedHeader("expected '<scheme> <credential>'".into())
            })?;

        let credential_type: CredentialType = scheme
            .parse()
            .map_err(|_| BridgeError::UnsupportedScheme(scheme.to_string()))?;

        let result = self.validate(credential, credential_type).await;
        if let Err(e) = &result {
            warn!(credential_type = %credential_type, error = %e, "Authentication failed");
        }
        result
    }
}

impl Default for IdentityBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating an IdentityBridge with handlers
pub struct IdentityBridgeBuilder {
    bridge: IdentityBridge,
}

impl IdentityBridgeBuilder {
    pub fn new() -> Self {
        Self {
            bridge: IdentityBridge::new(),
        }
    }

    /// Add a credential handler
    pub fn with_handler<H: CredentialHandler + 'static>(mut self, handler: H) -> Self {
        self.bridge.register_handler(handler);
        self
    }

    pub fn build(self) -> IdentityBridge {
        self.bridge
    }
}

impl Default for IdentityBridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
