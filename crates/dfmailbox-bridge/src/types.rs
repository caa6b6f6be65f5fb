//! Core types for the identity bridge

use chrono::{DateTime, Utc};
use dfmailbox_core::PlotId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of credentials that can be validated, keyed by auth scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    /// `Bearer <jwt>` signed with the mailbox's shared secret
    Bearer,
    /// `Plot <username>:<plot id>` from a trusted front-end
    Plot,
}

impl std::fmt::Display for CredentialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialType::Bearer => write!(f, "bearer"),
            CredentialType::Plot => write!(f, "plot"),
        }
    }
}

impl std::str::FromStr for CredentialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bearer" | "jwt" => Ok(CredentialType::Bearer),
            "plot" => Ok(CredentialType::Plot),
            _ => Err(format!("Unknown credential type: {}", s)),
        }
    }
}

/// A validated caller identity: who owns the request and which plot it speaks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedIdentity {
    /// Stable owner identifier
    pub owner: Uuid,

    /// Plot the caller is acting for
    pub plot_id: PlotId,

    /// Human-readable name, when the credential carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// When the credential expires (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ValidatedIdentity {
    pub fn new(owner: Uuid, plot_id: PlotId) -> Self {
        Self {
            owner,
            plot_id,
            username: None,
            expires_at: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Check if the credential is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp < Utc::now()).unwrap_or(false)
    }
}
