//! Plot Credential Handler
//!
//! Accepts credentials of the form `<username>:<plot id>` from a trusted
//! front-end. The username is resolved to the owner's UUID.

use async_trait::async_trait;
use dfmailbox_core::PlotId;
use std::sync::Arc;

use crate::bridge::CredentialHandler;
use crate::error::{BridgeError, Result};
use crate::resolver::OwnerResolver;
use crate::types::{CredentialType, ValidatedIdentity};

/// Plot credential handler
pub struct PlotCredentialHandler {
    resolver: Arc<dyn OwnerResolver>,
}

impl PlotCredentialHandler {
    pub fn new(resolver: Arc<dyn OwnerResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl CredentialHandler for PlotCredentialHandler {
    fn credential_type(&self) -> CredentialType {
        CredentialType::Plot
    }

    fn description(&self) -> &str {
        "plot credential handler"
    }

    async fn validate(&self, credential: &str) -> Result<ValidatedIdentity> {
        let (username, plot_id) = credential.rsplit_once(':').ok_or_else(|| {
            BridgeError::InvalidFormat("expected '<username>:<plot id>'".into())
        })?;

        let plot_id: PlotId = plot_id
            .trim()
            .parse()
            .map_err(|_| BridgeError::InvalidFormat(format!("'{}' is not a plot id", plot_id)))?;

        let username = username.trim();
        let owner = self.resolver.resolve(username).await?;

        Ok(ValidatedIdentity::new(owner, plot_id).with_username(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticOwnerResolver;
    use uuid::Uuid;

    fn handler() -> PlotCredentialHandler {
        let resolver = StaticOwnerResolver::new().with_owner(
            "dinnerbone",
            Uuid::parse_str("61699b2e-d327-4a01-9f1e-0ea8c3f06bc6").unwrap(),
        );
        PlotCredentialHandler::new(Arc::new(resolver))
    }

    #[tokio::test]
    async fn test_simple_credential() {
        let identity = handler().validate("dinnerbone:2147483647").await.unwrap();

        assert_eq!(identity.plot_id, 2147483647);
        assert_eq!(identity.owner.to_string(), "61699b2e-d327-4a01-9f1e-0ea8c3f06bc6");
        assert_eq!(identity.username.as_deref(), Some("dinnerbone"));
    }

    #[tokio::test]
    async fn test_plot_id_out_of_range() {
        let result = handler().validate("dinnerbone:2147483648").await;
        assert!(matches!(result, Err(BridgeError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_missing_plot_id() {
        let result = handler().validate("dinnerbone").await;
        assert!(matches!(result, Err(BridgeError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_unknown_username() {
        let result = handler().validate("grumm:5").await;
        assert!(matches!(result, Err(BridgeError::UnknownUsername(_))));
    }
}
