//! Outbound ownership proofs
//!
//! The verifier challenges the instance at a claimed address and checks that
//! the answer is signed by the claimed key over the address the instance
//! reports about itself.

use async_trait::async_trait;
use dfmailbox_core::{ChallengeIssuer, IdentityProof, Instance, PublicKey, Signature};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Well-known path every federation participant answers challenges on
pub const PROOF_PATH: &str = "/v0/federation/instance";

/// Default bound on one proof round-trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest proof body read from an instance
pub const MAX_PROOF_BYTES: usize = 16 * 1024;

/// Why an ownership proof did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The outbound call could not be completed
    #[error("Instance at {address} could not be reached: {reason}")]
    Unreachable { address: String, reason: String },

    /// The instance answered, but not with a valid proof
    ///
    /// `challenge_bytes` is the payload that had to be signed, built from the
    /// address the instance reported.
    #[error("Ownership challenge failed: {reason}")]
    ChallengeFailed {
        challenge_bytes: String,
        reason: String,
    },
}

/// A proof that completed: the key controls the address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProof {
    pub instance: Instance,
}

/// Performs the outbound challenge/response for a claimed key and address
#[async_trait]
pub trait OwnershipVerifier: Send + Sync {
    async fn verify(
        &self,
        public_key: &PublicKey,
        address: &str,
    ) -> Result<VerifiedProof, VerificationError>;
}

/// Verifier that calls the claimed address over HTTP
pub struct HttpOwnershipVerifier {
    http_client: reqwest::Client,
    issuer: ChallengeIssuer,
    scheme: String,
}

impl HttpOwnershipVerifier {
    /// Create a verifier with the given per-proof timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http_client))
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            issuer: ChallengeIssuer::new(),
            scheme: "http".to_string(),
        }
    }

    /// Scheme used for outbound calls (`http` or `https`)
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    async fn fetch_proof(&self, address: &str, challenge: &str) -> Result<IdentityProof, String> {
        let url = format!("{}://{}{}", self.scheme, address, PROOF_PATH);
        debug!(url = %url, challenge = %challenge, "Challenging instance");

        let mut response = self
            .http_client
            .get(&url)
            .query(&[("challenge", challenge)])
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        if response.content_length().is_some_and(|len| len > MAX_PROOF_BYTES as u64) {
            return Err(format!("proof body exceeds {} bytes", MAX_PROOF_BYTES));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            if body.len() + chunk.len() > MAX_PROOF_BYTES {
                return Err(format!("proof body exceeds {} bytes", MAX_PROOF_BYTES));
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice::<IdentityProof>(&body).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl OwnershipVerifier for HttpOwnershipVerifier {
    async fn verify(
        &self,
        public_key: &PublicKey,
        address: &str,
    ) -> Result<VerifiedProof, VerificationError> {
        let challenge = self.issuer.issue();

        let proof = self
            .fetch_proof(address, &challenge.query_value())
            .await
            .map_err(|reason| {
                warn!(address = %address, reason = %reason, "Instance unreachable");
                VerificationError::Unreachable {
                    address: address.to_string(),
                    reason,
                }
            })?;

        // Signed material uses the address the instance reports, not the claim
        let payload = challenge.payload_for(&proof.address);
        let failed = |reason: String| {
            warn!(
                public_key = %public_key,
                address = %address,
                reason = %reason,
                "Ownership challenge failed"
            );
            VerificationError::ChallengeFailed {
                challenge_bytes: payload.to_base64(),
                reason,
            }
        };

        let signature = Signature::parse(&proof.signature).map_err(|e| failed(e.to_string()))?;
        public_key
            .verify(payload.as_bytes(), &signature)
            .map_err(|e| failed(e.to_string()))?;

        match PublicKey::parse(&proof.public_key) {
            Ok(reported) if reported == *public_key => {}
            _ => {
                return Err(failed(format!(
                    "instance reported key '{}'",
                    proof.public_key
                )))
            }
        }

        if proof.address != address {
            return Err(failed(format!(
                "instance reported address '{}'",
                proof.address
            )));
        }

        Ok(VerifiedProof {
            instance: Instance::new(*public_key, proof.address),
        })
    }
}
