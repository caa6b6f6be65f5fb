//! In-memory storage backend
//!
//! Default storage implementation using in-memory hashmaps.
//! Suitable for development and single-instance deployments.
//! Data is lost on restart.

use async_trait::async_trait;
use dfmailbox_core::{PlotId, PublicKey};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::info;

use super::{InstanceRecord, MailboxStore, PlotRecord, StorageError};

/// In-memory mailbox store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    instances: RwLock<HashMap<PublicKey, InstanceRecord>>,
    plots: RwLock<HashMap<PlotId, PlotRecord>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MailboxStore for MemoryStore {
    // =========================================================================
    // Instances
    // =========================================================================

    async fn insert_instance(&self, record: InstanceRecord) -> Result<bool, StorageError> {
        let mut instances = self.instances.write();
        match instances.entry(record.public_key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                info!(
                    public_key = %record.public_key,
                    address = %record.address,
                    "Storing instance"
                );
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn get_instance(
        &self,
        public_key: &PublicKey,
    ) -> Result<Option<InstanceRecord>, StorageError> {
        Ok(self.instances.read().get(public_key).cloned())
    }

    async fn update_instance_address(
        &self,
        public_key: &PublicKey,
        address: &str,
    ) -> Result<(), StorageError> {
        let mut instances = self.instances.write();
        let record = instances
            .get_mut(public_key)
            .ok_or_else(|| StorageError::NotFound(public_key.to_string()))?;
        record.address = address.to_string();
        record.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn count_instances(&self) -> Result<usize, StorageError> {
        Ok(self.instances.read().len())
    }

    // =========================================================================
    // Plots
    // =========================================================================

    async fn insert_plot(&self, record: PlotRecord) -> Result<bool, StorageError> {
        let mut plots = self.plots.write();
        match plots.entry(record.plot_id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                info!(plot_id = record.plot_id, owner = %record.owner, "Storing plot");
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn get_plot(&self, plot_id: PlotId) -> Result<Option<PlotRecord>, StorageError> {
        Ok(self.plots.read().get(&plot_id).cloned())
    }

    async fn set_plot_instance(
        &self,
        plot_id: PlotId,
        public_key: Option<PublicKey>,
    ) -> Result<(), StorageError> {
        let mut plots = self.plots.write();
        let record = plots
            .get_mut(&plot_id)
            .ok_or_else(|| StorageError::NotFound(plot_id.to_string()))?;
        record.public_key = public_key;
        Ok(())
    }

    async fn count_plots(&self) -> Result<usize, StorageError> {
        Ok(self.plots.read().len())
    }
}
