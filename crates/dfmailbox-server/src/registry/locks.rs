//! Per-key mutual exclusion
//!
//! Each key gets its own async mutex so that decisions on one key are
//! linearizable while unrelated keys proceed concurrently. Entries are
//! dropped from the table once nobody holds or awaits them.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of async mutexes keyed by `K`
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash + Clone> {
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: K) -> KeyGuard<K> {
        // Declared before the wait so a cancelled waiter still cleans up
        let slot = Slot {
            key: key.clone(),
            locks: self.locks.clone(),
        };
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyGuard {
            _guard: guard,
            _slot: slot,
        }
    }

    /// Number of keys currently locked or awaited
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the key's entry on drop when nothing else references its mutex
struct Slot<K: Eq + Hash + Clone> {
    key: K,
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> Drop for Slot<K> {
    fn drop(&mut self) {
        // The table's own Arc is the only one left when nobody holds or waits
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Exclusive access to one key; released on drop
pub struct KeyGuard<K: Eq + Hash + Clone> {
    // Field order matters: release the mutex before the slot looks at it
    _guard: OwnedMutexGuard<()>,
    _slot: Slot<K>,
}
