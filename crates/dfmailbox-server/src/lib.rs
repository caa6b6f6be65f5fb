//! DFMailbox Server
//!
//! The mailbox lets independent server instances prove that they own a
//! network address, and keeps a registry of plots that may be federated to
//! those instances:
//! - Introduces instances after an outbound signed-challenge proof
//! - Registers plots and gates plot access on the caller's role
//! - Answers challenges for its own address, like any other instance
//! - Reports every failure as an RFC 9457 problem document
//!
//! ## Ownership Proof
//!
//! To introduce `(public_key, address)` the mailbox sends a fresh UUID to
//! `GET {address}/v0/federation/instance?challenge=<uuid>`. The instance
//! answers with `{public_key, signature, address}` where the signature
//! covers `address bytes ++ raw 16 UUID bytes`. The proof runs even when the
//! request will be rejected as a conflict, so existence of a key is only
//! disclosed to parties that can complete it.
//!
//! ## API Endpoints
//!
//! - `GET /` - Banner
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with own key and record counts
//! - `POST /v0/instance` - Introduce or move an instance
//! - `GET /v0/instance/{public_key}` - Look up an instance
//! - `GET /v0/federation/instance` - Answer an ownership challenge
//! - `POST /v0/plot` - Register the caller's plot
//! - `GET /v0/plot` - Get the caller's plot
//! - `PUT /v0/plot` - Attach the caller's plot to an instance, or detach it

pub mod api;
pub mod config;
pub mod core;
pub mod federation;
pub mod registry;
pub mod state;
pub mod storage;

pub use api::create_router;
pub use config::{ConfigError, MailboxConfig};
pub use federation::{HttpOwnershipVerifier, OwnershipVerifier, VerificationError, VerifiedProof};
pub use registry::{InstanceRegistry, IntroduceOutcome, PlotRegistry, RegistryError};
pub use state::AppState;
pub use storage::{MailboxStore, MemoryStore, StorageError};
