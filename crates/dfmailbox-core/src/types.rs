//! Common types shared by the bridge and the server

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::challenge::Challenge;
use crate::crypto::{PublicKey, SigningIdentity};

/// Externally assigned plot identifier
pub type PlotId = i32;

/// A federation-participating server: a public key bound to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Ed25519 public key (base64url, unpadded)
    pub public_key: PublicKey,
    /// Claimed `host:port`
    pub address: String,
}

impl Instance {
    pub fn new(public_key: PublicKey, address: impl Into<String>) -> Self {
        Self {
            public_key,
            address: address.into(),
        }
    }
}

/// A tenant record owned by an identity, optionally federated to an instance
///
/// `address` is a denormalized copy of the referenced instance's address and
/// is only set when `public_key` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub plot_id: PlotId,
    pub owner: Uuid,
    pub public_key: Option<PublicKey>,
    pub address: Option<String>,
    pub mailbox_msg_id: i64,
}

impl Plot {
    /// A freshly registered plot with no attached instance
    pub fn new(plot_id: PlotId, owner: Uuid) -> Self {
        Self {
            plot_id,
            owner,
            public_key: None,
            address: None,
            mailbox_msg_id: 0,
        }
    }

    /// Attach (or detach, with `None`) an instance
    pub fn with_instance(mut self, instance: Option<&Instance>) -> Self {
        self.public_key = instance.map(|i| i.public_key);
        self.address = instance.map(|i| i.address.clone());
        self
    }

    /// Role a caller holding this plot has
    pub fn role(&self) -> Role {
        if self.public_key.is_some() {
            Role::Host
        } else {
            Role::Registered
        }
    }
}

/// Caller authorization tier, derived from plot state
///
/// Ordered `Unregistered < Registered < Host`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No plot record exists for the caller's plot id
    Unregistered,
    /// Plot exists without an attached instance
    Registered,
    /// Plot exists with an attached, verified instance
    Host,
}

impl Role {
    /// Role of a caller whose plot record may be absent
    pub fn of(plot: Option<&Plot>) -> Self {
        plot.map(Plot::role).unwrap_or(Role::Unregistered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unregistered => "unregistered",
            Role::Registered => "registered",
            Role::Host => "host",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of `GET /v0/federation/instance`
///
/// Fields stay textual so that a malformed answer from a remote instance can
/// still be parsed and reported as a failed challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProof {
    #[serde(alias = "publicKey")]
    pub public_key: String,
    pub signature: String,
    pub address: String,
}

impl IdentityProof {
    /// Answer `challenge` for `identity` reachable at `address`
    pub fn answer(identity: &SigningIdentity, address: &str, challenge: &Challenge) -> Self {
        let payload = challenge.payload_for(address);
        Self {
            public_key: identity.public_key().to_base64url(),
            signature: identity.sign(payload.as_bytes()).to_base64(),
            address: address.to_string(),
        }
    }
}
