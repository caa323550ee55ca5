use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::providers::ProviderRef;

/// Serializes imports of the same provider reference within this process.
///
/// Different references proceed in parallel. Entries are dropped once the
/// last holder or waiter lets go, so the map only holds in-flight keys.
#[derive(Debug, Clone, Default)]
pub struct ImportGate {
    locks: Arc<DashMap<ProviderRef, Arc<Mutex<()>>>>,
}

impl ImportGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: ProviderRef) -> ImportPermit {
        let lock = Arc::clone(self.locks.entry(key).or_default().value());
        let guard = lock.lock_owned().await;
        ImportPermit {
            key,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// References currently held or waited on.
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

#[derive(Debug)]
pub struct ImportPermit {
    key: ProviderRef,
    locks: Arc<DashMap<ProviderRef, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ImportPermit {
    fn drop(&mut self) {
        // Release first so the count below only sees the map and waiters.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 1);
    }
}
