//! Federation: proving that a key controls an address

pub mod verifier;

pub use verifier::{
    HttpOwnershipVerifier, OwnershipVerifier, VerificationError, VerifiedProof, DEFAULT_TIMEOUT,
    PROOF_PATH,
};
