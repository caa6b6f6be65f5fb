//! Error types for the DFMailbox core

use thiserror::Error;

/// Result type alias using MailboxError
pub type Result<T> = std::result::Result<T, MailboxError>;

/// Errors raised while parsing or checking federation primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    /// Public key text is not base64url or not 32 bytes
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Private key seed is not base64 or not 32 bytes
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Signature text is not base64 or not 64 bytes
    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    /// Signature does not verify against the key
    #[error("Signature verification failed: {0}")]
    SignatureMismatch(String),

    /// Challenge id is not a UUID
    #[error("Invalid challenge: {0}")]
    InvalidChallenge(String),
}

impl From<ed25519_dalek::SignatureError> for MailboxError {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        MailboxError::SignatureMismatch(err.to_string())
    }
}

impl From<uuid::Error> for MailboxError {
    fn from(err: uuid::Error) -> Self {
        MailboxError::InvalidChallenge(err.to_string())
    }
}
