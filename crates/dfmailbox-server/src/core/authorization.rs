//! Authorization for plot operations
//!
//! A caller's role is derived from the plot record for the plot id in its
//! identity context. The context is built once per request by the identity
//! bridge and passed explicitly; nothing here reads ambient state.

use dfmailbox_bridge::ValidatedIdentity;
use dfmailbox_core::{PlotId, Role};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::registry::RegistryError;
use crate::storage::{MailboxStore, PlotRecord, StorageError};

/// Authenticated caller: the owner and the plot it acts for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub owner: Uuid,
    pub plot_id: PlotId,
}

impl From<ValidatedIdentity> for AuthorizationContext {
    fn from(identity: ValidatedIdentity) -> Self {
        Self {
            owner: identity.owner,
            plot_id: identity.plot_id,
        }
    }
}

/// Error returned when the caller's role is not among the accepted ones
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Role {received} not in {expected:?}")]
pub struct RoleError {
    /// Accepted roles, highest first
    pub expected: Vec<Role>,
    /// Role the caller actually has
    pub received: Role,
}

impl From<RoleError> for RegistryError {
    fn from(err: RoleError) -> Self {
        RegistryError::ExpectedRole {
            expected: err.expected,
            received: err.received,
        }
    }
}

/// Check `received` against an "any of" set
pub fn check_role(received: Role, accepted: &[Role]) -> Result<(), RoleError> {
    if accepted.contains(&received) {
        return Ok(());
    }

    let mut expected = accepted.to_vec();
    expected.sort_by(|a, b| b.cmp(a));
    Err(RoleError { expected, received })
}

/// Resolves roles and gates plot operations on them
pub struct AuthorizationGate {
    store: Arc<dyn MailboxStore>,
}

impl AuthorizationGate {
    pub fn new(store: Arc<dyn MailboxStore>) -> Self {
        Self { store }
    }

    /// Role of the caller, with the plot record it was derived from
    pub async fn resolve_role(
        &self,
        ctx: &AuthorizationContext,
    ) -> Result<(Role, Option<PlotRecord>), StorageError> {
        let record = self.store.get_plot(ctx.plot_id).await?;
        let role = match &record {
            None => Role::Unregistered,
            Some(r) if r.public_key.is_some() => Role::Host,
            Some(_) => Role::Registered,
        };
        Ok((role, record))
    }

    /// Require one of `accepted`; returns the caller's plot record, if any
    pub async fn require(
        &self,
        ctx: &AuthorizationContext,
        accepted: &[Role],
    ) -> Result<Option<PlotRecord>, RegistryError> {
        let (role, record) = self.resolve_role(ctx).await?;
        check_role(role, accepted).map_err(|err| {
            warn!(
                plot_id = ctx.plot_id,
                owner = %ctx.owner,
                received = %err.received,
                "Caller lacks required role"
            );
            err
        })?;
        Ok(record)
    }
}
