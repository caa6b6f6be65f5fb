//! Ownership challenges
//!
//! A challenge is a single-use version-4 UUID. The instance under test signs
//! `address bytes ++ raw 16 UUID bytes`; the UUID's text form only travels
//! in the query string and is never part of the signed material.

use uuid::Uuid;

use crate::crypto::encode_base64;
use crate::error::Result;

/// A single-use ownership challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Challenge {
    id: Uuid,
}

impl Challenge {
    /// Wrap an existing challenge id (used when answering a challenge)
    pub fn from_uuid(id: Uuid) -> Self {
        Self { id }
    }

    /// Parse the text form received in a `challenge` query parameter
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            id: Uuid::parse_str(text)?,
        })
    }

    /// The challenge id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Raw 16 bytes that get signed
    pub fn bytes(&self) -> &[u8; 16] {
        self.id.as_bytes()
    }

    /// Hyphenated text form sent to the remote instance
    pub fn query_value(&self) -> String {
        self.id.hyphenated().to_string()
    }

    /// The exact bytes an instance at `address` must sign
    pub fn payload_for(&self, address: &str) -> ChallengePayload {
        let mut bytes = Vec::with_capacity(address.len() + 16);
        bytes.extend_from_slice(address.as_bytes());
        bytes.extend_from_slice(self.bytes());
        ChallengePayload(bytes)
    }
}

/// Signed material for one challenge and one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePayload(Vec<u8>);

impl ChallengePayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Standard base64 without padding, as surfaced in challenge failures
    pub fn to_base64(&self) -> String {
        encode_base64(&self.0)
    }
}

/// Stateless source of fresh challenges
#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeIssuer;

impl ChallengeIssuer {
    pub fn new() -> Self {
        Self
    }

    /// Issue a cryptographically random v4 challenge
    pub fn issue(&self) -> Challenge {
        Challenge { id: Uuid::new_v4() }
    }
}
