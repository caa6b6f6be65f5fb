//! Plot registry
//!
//! Every operation passes the authorization gate first. Instance references
//! are checked read-only against the instance registry; the ownership proof
//! already happened there.

use dfmailbox_core::{Instance, Plot, PlotId, PublicKey, Role};
use std::sync::Arc;
use tracing::info;

use super::{InstanceRegistry, KeyedLocks, RegistryError};
use crate::core::{AuthorizationContext, AuthorizationGate};
use crate::storage::{MailboxStore, PlotRecord};

const ANY_REGISTRATION: &[Role] = &[Role::Host, Role::Registered];

/// Registry of plots
pub struct PlotRegistry {
    store: Arc<dyn MailboxStore>,
    instances: Arc<InstanceRegistry>,
    gate: AuthorizationGate,
    locks: KeyedLocks<PlotId>,
}

impl PlotRegistry {
    pub fn new(store: Arc<dyn MailboxStore>, instances: Arc<InstanceRegistry>) -> Self {
        Self {
            gate: AuthorizationGate::new(store.clone()),
            store,
            instances,
            locks: KeyedLocks::new(),
        }
    }

    /// Resolve an optional reference; unknown or unparseable keys are echoed back
    async fn resolve_reference(
        &self,
        public_key: Option<&str>,
    ) -> Result<Option<Instance>, RegistryError> {
        let Some(text) = public_key else {
            return Ok(None);
        };
        let unknown = || RegistryError::UnknownReferencedInstance {
            public_key: text.to_string(),
        };
        let key = PublicKey::parse(text).map_err(|_| unknown())?;
        match self.instances.find(&key).await? {
            Some(instance) => Ok(Some(instance)),
            None => Err(unknown()),
        }
    }

    /// Register the caller's plot, optionally federated to an instance
    pub async fn register(
        &self,
        ctx: &AuthorizationContext,
        public_key: Option<&str>,
    ) -> Result<Plot, RegistryError> {
        let _guard = self.locks.lock(ctx.plot_id).await;
        self.gate.require(ctx, &[Role::Unregistered]).await?;

        let instance = self.resolve_reference(public_key).await?;
        let record = PlotRecord::new(
            ctx.plot_id,
            ctx.owner,
            instance.as_ref().map(|i| i.public_key),
        );

        if !self.store.insert_plot(record.clone()).await? {
            return Err(RegistryError::AlreadyExists);
        }

        info!(
            plot_id = ctx.plot_id,
            owner = %ctx.owner,
            public_key = ?record.public_key,
            "Plot registered"
        );
        Ok(record.to_plot(instance.as_ref()))
    }

    /// The caller's plot, with the address read from its instance
    pub async fn get(&self, ctx: &AuthorizationContext) -> Result<Plot, RegistryError> {
        let record = self
            .gate
            .require(ctx, ANY_REGISTRATION)
            .await?
            .ok_or(RegistryError::ExpectedRole {
                expected: ANY_REGISTRATION.to_vec(),
                received: Role::Unregistered,
            })?;

        let instance = match record.public_key {
            Some(ref key) => self.instances.find(key).await?,
            None => None,
        };
        Ok(record.to_plot(instance.as_ref()))
    }

    /// Point the caller's plot at another instance, or detach it with `None`
    pub async fn update_instance(
        &self,
        ctx: &AuthorizationContext,
        public_key: Option<&str>,
    ) -> Result<Plot, RegistryError> {
        let _guard = self.locks.lock(ctx.plot_id).await;
        let record = self
            .gate
            .require(ctx, ANY_REGISTRATION)
            .await?
            .ok_or(RegistryError::ExpectedRole {
                expected: ANY_REGISTRATION.to_vec(),
                received: Role::Unregistered,
            })?;

        let instance = self.resolve_reference(public_key).await?;
        let new_key = instance.as_ref().map(|i| i.public_key);
        if new_key == record.public_key {
            return Err(RegistryError::NoEffectUpdate);
        }

        self.store.set_plot_instance(ctx.plot_id, new_key).await?;
        info!(
            plot_id = ctx.plot_id,
            from = ?record.public_key,
            to = ?new_key,
            "Plot instance updated"
        );

        let updated = PlotRecord {
            public_key: new_key,
            ..record
        };
        Ok(updated.to_plot(instance.as_ref()))
    }
}
