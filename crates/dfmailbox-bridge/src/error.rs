//! Error types for the identity bridge

use thiserror::Error;

use crate::types::CredentialType;

/// Result type for identity bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while establishing a caller's identity
///
/// Every variant is an authentication failure from the caller's point of
/// view; the variants exist so that logs can say why.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No credential was presented
    #[error("No credential presented")]
    MissingCredential,

    /// The Authorization header is not `<scheme> <credential>`
    #[error("Malformed authorization header: {0}")]
    MalformedHeader(String),

    /// Scheme is not one the bridge knows
    #[error("Unsupported authorization scheme: {0}")]
    UnsupportedScheme(String),

    /// Scheme is known but no handler is enabled for it
    #[error("No handler registered for credential type: {0}")]
    NoHandler(CredentialType),

    /// Credential validation failed
    #[error("Credential validation failed: {0}")]
    ValidationFailed(String),

    /// Credential has expired
    #[error("Credential expired at {0}")]
    Expired(String),

    /// Invalid credential format
    #[error("Invalid credential format: {0}")]
    InvalidFormat(String),

    /// Invalid signature
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Missing required claim
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// The identity provider does not know this username
    #[error("Unknown username: {0}")]
    UnknownUsername(String),

    /// HTTP error talking to the identity provider
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<jsonwebtoken::errors::Error> for BridgeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => BridgeError::Expired("JWT expired".into()),
            ErrorKind::ImmatureSignature => {
                BridgeError::ValidationFailed("JWT not yet valid".into())
            }
            ErrorKind::InvalidSignature => BridgeError::InvalidSignature(err.to_string()),
            ErrorKind::InvalidToken => BridgeError::InvalidFormat(err.to_string()),
            ErrorKind::MissingRequiredClaim(claim) => BridgeError::MissingClaim(claim.clone()),
            _ => BridgeError::ValidationFailed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::InvalidFormat(err.to_string())
    }
}
