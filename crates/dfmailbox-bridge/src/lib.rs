//! Identity Bridge
//!
//! The identity bridge turns the credential a caller presents into a
//! validated `(owner, plot id)` identity. The mailbox never sees usernames or
//! raw tokens past this point.
//!
//! ## Architecture
//!
//! The bridge maintains a registry of credential handlers keyed by the
//! `Authorization` scheme:
//!
//! - **Bearer**: HS256 tokens minted by a front-end sharing a secret
//! - **Plot**: `<username>:<plot id>` from a trusted front-end, with the
//!   username resolved to a stable owner UUID through an `OwnerResolver`
//!
//! ## Usage
//!
//! ```ignore
//! use dfmailbox_bridge::{IdentityBridgeBuilder, handlers::*, resolver::*};
//!
//! let bridge = IdentityBridgeBuilder::new()
//!     .with_handler(JwtHandler::new(b"shared-secret"))
//!     .with_handler(PlotCredentialHandler::new(Arc::new(
//!         ProfileApiResolver::new("https://api.mojang.com", Duration::from_secs(10))?,
//!     )))
//!     .build();
//!
//! let identity = bridge.authenticate(Some("Plot Notch:123")).await?;
//! println!("owner {} plot {}", identity.owner, identity.plot_id);
//! ```

pub mod bridge;
pub mod error;
pub mod handlers;
pub mod resolver;
pub mod types;

pub use bridge::{CredentialHandler, IdentityBridge, IdentityBridgeBuilder};
pub use error::{BridgeError, Result};
pub use resolver::{OwnerResolver, ProfileApiResolver, StaticOwnerResolver};
pub use types::{CredentialType, ValidatedIdentity};
