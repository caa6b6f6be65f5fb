//! # DFMailbox Core
//!
//! Core types and cryptographic primitives for DFMailbox federation.
//!
//! ## Key Concepts
//!
//! - **Instance**: a mailbox server identified by an Ed25519 public key and a
//!   claimed `host:port` address
//! - **Challenge**: a single-use UUID an instance must sign together with its
//!   address to prove it controls both
//! - **Plot**: a tenant record owned by an identity, optionally federated to an
//!   instance
//! - **Role**: the caller's authorization tier, derived from plot state

pub mod challenge;
pub mod crypto;
pub mod error;
pub mod types;

pub use challenge::{Challenge, ChallengeIssuer, ChallengePayload};
pub use crypto::{PublicKey, Signature, SigningIdentity};
pub use error::{MailboxError, Result};
pub use types::{IdentityProof, Instance, Plot, PlotId, Role};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
