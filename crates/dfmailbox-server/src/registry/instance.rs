//! Instance registry: public key to address, changed only through proofs

use dfmailbox_core::{Instance, PublicKey};
use std::sync::Arc;
use tracing::{info, warn};

use super::{KeyedLocks, RegistryError};
use crate::federation::OwnershipVerifier;
use crate::storage::{InstanceRecord, MailboxStore};

/// Successful result of [`InstanceRegistry::introduce`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroduceOutcome {
    Created(Instance),
    Updated(Instance),
}

impl IntroduceOutcome {
    pub fn instance(&self) -> &Instance {
        match self {
            IntroduceOutcome::Created(instance) | IntroduceOutcome::Updated(instance) => instance,
        }
    }
}

/// Registry of federated instances
pub struct InstanceRegistry {
    store: Arc<dyn MailboxStore>,
    verifier: Arc<dyn OwnershipVerifier>,
    locks: KeyedLocks<PublicKey>,
}

impl InstanceRegistry {
    pub fn new(store: Arc<dyn MailboxStore>, verifier: Arc<dyn OwnershipVerifier>) -> Self {
        Self {
            store,
            verifier,
            locks: KeyedLocks::new(),
        }
    }

    /// Introduce `public_key` at `address`, or move it there when `allow_update`
    ///
    /// The ownership proof runs on every call, including calls that end in a
    /// conflict, so that only a party able to complete a proof learns whether
    /// the key is already known.
    pub async fn introduce(
        &self,
        public_key: &str,
        address: &str,
        allow_update: bool,
    ) -> Result<IntroduceOutcome, RegistryError> {
        let key = PublicKey::parse(public_key)
            .map_err(|e| RegistryError::InvalidInput(e.to_string()))?;

        let _guard = self.locks.lock(key).await;
        let existing = self.store.get_instance(&key).await?;
        let proof = self.verifier.verify(&key, address).await;

        if allow_update {
            if let Some(ref record) = existing {
                if record.address == address {
                    return Err(RegistryError::NoEffectUpdate);
                }
            }
        }

        let proof = proof?;
        let instance = proof.instance;

        match (existing, allow_update) {
            (None, false) => {
                let inserted = self
                    .store
                    .insert_instance(InstanceRecord::new(key, instance.address.clone()))
                    .await?;
                if !inserted {
                    warn!(public_key = %key, "Instance appeared while proof was running");
                    return Err(RegistryError::AlreadyExists);
                }
                info!(public_key = %key, address = %instance.address, "Instance introduced");
                Ok(IntroduceOutcome::Created(instance))
            }
            (Some(_), false) => Err(RegistryError::AlreadyExists),
            // Update never creates
            (None, true) => Err(RegistryError::NoEffectUpdate),
            (Some(record), true) => {
                self.store
                    .update_instance_address(&key, &instance.address)
                    .await?;
                info!(
                    public_key = %key,
                    from = %record.address,
                    to = %instance.address,
                    "Instance address updated"
                );
                Ok(IntroduceOutcome::Updated(instance))
            }
        }
    }

    /// Look up an instance; unknown and unparseable keys are echoed back verbatim
    pub async fn lookup(&self, public_key: &str) -> Result<Instance, RegistryError> {
        let unknown = || RegistryError::UnknownInstance {
            public_key: public_key.to_string(),
        };
        let key = PublicKey::parse(public_key).map_err(|_| unknown())?;
        self.find(&key).await?.ok_or_else(unknown)
    }

    /// Read-only check used when another record references `key`
    pub async fn find(&self, key: &PublicKey) -> Result<Option<Instance>, RegistryError> {
        Ok(self
            .store
            .get_instance(key)
            .await?
            .map(|record| record.to_instance()))
    }
}
