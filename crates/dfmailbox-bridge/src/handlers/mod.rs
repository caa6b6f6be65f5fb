//! Credential handlers for different credential types

pub mod jwt;
pub mod plot;

pub use jwt::{JwtHandler, PlotClaims};
pub use plot::PlotCredentialHandler;
