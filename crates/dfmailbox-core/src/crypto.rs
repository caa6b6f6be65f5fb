//! Ed25519 primitives for instance ownership proofs
//!
//! Key types:
//! - `PublicKey`: 32-byte Ed25519 verifying key, base64url (unpadded) on the wire
//! - `Signature`: 64-byte Ed25519 signature, standard base64 (unpadded) on the wire
//! - `SigningIdentity`: this mailbox's own key pair, used to answer challenges
//!
//! Decoding is lenient about padding and alphabet because peers in the wild
//! emit both padded and unpadded forms. Encoding is always canonical.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD_NO_PAD, URL_SAFE_NO_PAD},
        DecodePaddingMode,
    },
    Engine,
};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{MailboxError, Result};

/// Length of an Ed25519 public key in bytes
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of an Ed25519 signature in bytes
pub const SIGNATURE_LENGTH: usize = 64;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_allow_trailing_bits(true)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Decode base64 text in either alphabet, with or without padding
///
/// Non-zero trailing bits are tolerated, matching Go's `encoding/base64`.
pub fn decode_base64_lenient(text: &str) -> Option<Vec<u8>> {
    let trimmed = text.trim();
    URL_SAFE_LENIENT
        .decode(trimmed)
        .or_else(|_| STANDARD_LENIENT.decode(trimmed))
        .ok()
}

/// Encode bytes as standard base64 without padding
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes)
}

/// Ed25519 public key identifying a federated instance
///
/// Only the length is checked at parse time. Whether the bytes form a valid
/// curve point is decided when a signature is verified against the key, so
/// that unknown-but-well-formed keys can still be looked up and reported.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse base64url text (padding optional)
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = decode_base64_lenient(text)
            .ok_or_else(|| MailboxError::InvalidPublicKey(format!("'{}' is not base64", text)))?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            MailboxError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LENGTH,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Canonical text form: base64url without padding
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Verify `signature` over `message` with this key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        verifying_key.verify(message, &signature)?;
        Ok(())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64url())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64url())
    }
}

impl FromStr for PublicKey {
    type Err = MailboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64url())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Ed25519 signature over a challenge payload
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Wrap raw signature bytes
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse base64 text (either alphabet, padding optional)
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = decode_base64_lenient(text)
            .ok_or_else(|| MailboxError::InvalidSignature("not base64".into()))?;
        let bytes: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            MailboxError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Raw signature bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Wire form: standard base64 without padding
    pub fn to_base64(&self) -> String {
        encode_base64(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_base64())
    }
}

/// The key pair a mailbox uses to answer ownership challenges about itself
#[derive(Clone)]
pub struct SigningIdentity {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("public_key", &self.public_key)
            .field("signing_key", &"[redacted]")
            .finish()
    }
}

impl SigningIdentity {
    /// Generate a fresh random identity
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Build from a 32-byte Ed25519 seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Build from base64 seed text, as found in configuration
    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = decode_base64_lenient(text)
            .ok_or_else(|| MailboxError::InvalidPrivateKey("not base64".into()))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            MailboxError::InvalidPrivateKey(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Public half of the identity
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Sign arbitrary bytes
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}
