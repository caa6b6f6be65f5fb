//! Instance and plot registries
//!
//! Both registries serialize decisions per key through [`KeyedLocks`]; the
//! instance registry holds its key's lock across the outbound proof so the
//! decision is made against a stable pre-state.

pub mod instance;
pub mod locks;
pub mod plot;

pub use instance::{InstanceRegistry, IntroduceOutcome};
pub use locks::{KeyGuard, KeyedLocks};
pub use plot::PlotRegistry;

use dfmailbox_core::Role;
use thiserror::Error;

use crate::federation::VerificationError;
use crate::storage::StorageError;

/// Outcomes that reject a registry operation
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Resource already exists")]
    AlreadyExists,

    #[error("Update would have no effect")]
    NoEffectUpdate,

    /// Direct lookup of a key nobody introduced
    #[error("Unknown instance: {public_key}")]
    UnknownInstance { public_key: String },

    /// A plot referenced a key nobody introduced
    #[error("Plot references unknown instance: {public_key}")]
    UnknownReferencedInstance { public_key: String },

    #[error("Instance at {address} could not be reached")]
    InstanceUnreachable { address: String },

    #[error("Instance failed the ownership challenge")]
    ChallengeFailed { challenge_bytes: String },

    #[error("Expected role {}, received {received}", join_roles(.expected))]
    ExpectedRole { expected: Vec<Role>, received: Role },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

impl From<VerificationError> for RegistryError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Unreachable { address, .. } => {
                RegistryError::InstanceUnreachable { address }
            }
            VerificationError::ChallengeFailed {
                challenge_bytes, ..
            } => RegistryError::ChallengeFailed { challenge_bytes },
        }
    }
}
