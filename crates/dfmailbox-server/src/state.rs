//! Application state shared across handlers

use dfmailbox_bridge::{
    handlers::{JwtHandler, PlotCredentialHandler},
    IdentityBridge, IdentityBridgeBuilder, OwnerResolver, ProfileApiResolver,
};
use dfmailbox_core::SigningIdentity;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::MailboxConfig;
use crate::federation::{HttpOwnershipVerifier, OwnershipVerifier};
use crate::registry::{InstanceRegistry, PlotRegistry};
use crate::storage::MailboxStore;

/// Application state shared across handlers
pub struct AppState {
    /// Key behind this mailbox's own ownership proofs
    pub identity: SigningIdentity,
    /// Address this mailbox proves ownership of
    pub address: String,
    pub instances: Arc<InstanceRegistry>,
    pub plots: PlotRegistry,
    /// Turns `Authorization` headers into caller identities
    pub bridge: IdentityBridge,
    pub store: Arc<dyn MailboxStore>,
}

impl AppState {
    /// Wire registries around `store` and `verifier`
    pub fn new(
        identity: SigningIdentity,
        address: impl Into<String>,
        store: Arc<dyn MailboxStore>,
        verifier: Arc<dyn OwnershipVerifier>,
        bridge: IdentityBridge,
    ) -> Self {
        let instances = Arc::new(InstanceRegistry::new(store.clone(), verifier));
        Self {
            identity,
            address: address.into(),
            plots: PlotRegistry::new(store.clone(), instances.clone()),
            instances,
            bridge,
            store,
        }
    }

    /// Build the state described by `config`
    pub fn from_config(
        config: MailboxConfig,
        store: Arc<dyn MailboxStore>,
    ) -> Result<Self, reqwest::Error> {
        let verifier = HttpOwnershipVerifier::new(config.verify_timeout)?
            .with_scheme(config.federation_scheme.clone());

        let mut bridge = IdentityBridgeBuilder::new();
        if let Some(ref secret) = config.jwt_secret {
            bridge = bridge.with_handler(JwtHandler::new(secret.as_bytes()));
        }
        if config.trust_plot_credentials {
            let resolver: Arc<dyn OwnerResolver> = match config.known_owners {
                Some(owners) => Arc::new(owners),
                None => Arc::new(ProfileApiResolver::new(
                    config.profile_api_url.clone(),
                    config.verify_timeout,
                )?),
            };
            info!(resolver = resolver.description(), "Plot credentials are trusted");
            bridge = bridge.with_handler(PlotCredentialHandler::new(resolver));
        }
        let bridge = bridge.build();
        if bridge.registered_types().is_empty() {
            warn!("No credential handler enabled; every plot request will be rejected");
        }

        Ok(Self::new(
            config.identity,
            config.address,
            store,
            Arc::new(verifier),
            bridge,
        ))
    }
}
