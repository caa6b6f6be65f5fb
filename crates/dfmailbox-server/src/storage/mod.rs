//! Storage abstraction for the mailbox
//!
//! This module provides a trait-based abstraction over the two record
//! tables, enabling both in-memory (default) and persistent (PostgreSQL)
//! backends.
//!
//! Inserts are insert-if-absent: a backend reports whether the row was
//! created so that two writers racing on one key cannot both succeed, even
//! across processes sharing a database.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dfmailbox_core::{Instance, Plot, PlotId, PublicKey};
use std::fmt::Debug;
use uuid::Uuid;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Stored instance row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub public_key: PublicKey,
    pub address: String,
    /// When the instance first completed a proof
    pub introduced_at: DateTime<Utc>,
    /// When the address last changed
    pub updated_at: DateTime<Utc>,
}

impl InstanceRecord {
    pub fn new(public_key: PublicKey, address: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            public_key,
            address: address.into(),
            introduced_at: now,
            updated_at: now,
        }
    }

    pub fn to_instance(&self) -> Instance {
        Instance::new(self.public_key, self.address.clone())
    }
}

/// Stored plot row
///
/// The address is not stored; it is joined from the instance table on read
/// so a plot always mirrors its instance's current address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRecord {
    pub plot_id: PlotId,
    pub owner: Uuid,
    pub public_key: Option<PublicKey>,
    pub mailbox_msg_id: i64,
    pub registered_at: DateTime<Utc>,
}

impl PlotRecord {
    pub fn new(plot_id: PlotId, owner: Uuid, public_key: Option<PublicKey>) -> Self {
        Self {
            plot_id,
            owner,
            public_key,
            mailbox_msg_id: 0,
            registered_at: Utc::now(),
        }
    }

    /// Public view, with the address taken from `instance`
    pub fn to_plot(&self, instance: Option<&Instance>) -> Plot {
        Plot {
            plot_id: self.plot_id,
            owner: self.owner,
            public_key: self.public_key,
            address: instance
                .filter(|i| Some(i.public_key) == self.public_key)
                .map(|i| i.address.clone()),
            mailbox_msg_id: self.mailbox_msg_id,
        }
    }
}

/// Storage backend trait for mailbox state
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait MailboxStore: Send + Sync + Debug {
    // =========================================================================
    // Instances
    // =========================================================================

    /// Insert an instance unless its key is already present; returns whether it was inserted
    async fn insert_instance(&self, record: InstanceRecord) -> Result<bool, StorageError>;

    /// Get an instance by public key
    async fn get_instance(
        &self,
        public_key: &PublicKey,
    ) -> Result<Option<InstanceRecord>, StorageError>;

    /// Move an existing instance to a new address
    async fn update_instance_address(
        &self,
        public_key: &PublicKey,
        address: &str,
    ) -> Result<(), StorageError>;

    /// Number of known instances
    async fn count_instances(&self) -> Result<usize, StorageError>;

    // =========================================================================
    // Plots
    // =========================================================================

    /// Insert a plot unless its id is already present; returns whether it was inserted
    async fn insert_plot(&self, record: PlotRecord) -> Result<bool, StorageError>;

    /// Get a plot by id
    async fn get_plot(&self, plot_id: PlotId) -> Result<Option<PlotRecord>, StorageError>;

    /// Attach a plot to an instance, or detach it with `None`
    async fn set_plot_instance(
        &self,
        plot_id: PlotId,
        public_key: Option<PublicKey>,
    ) -> Result<(), StorageError>;

    /// Number of registered plots
    async fn count_plots(&self) -> Result<usize, StorageError>;
}
