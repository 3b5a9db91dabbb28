//! Per-key in-flight guards.
//!
//! Serializes the miss-compute-store sequence for a single cache key while
//! leaving unrelated keys fully concurrent.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key async locks.
#[derive(Debug, Clone, Default)]
pub struct InflightGuards {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl InflightGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder owns `key`, then take it.
    pub async fn acquire(&self, key: &str) -> InflightGuard {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let held = lock.lock_owned().await;
        InflightGuard {
            key: key.to_string(),
            locks: self.locks.clone(),
            held: Some(held),
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

/// Held lock for one key. Dropping it releases the key and prunes the
/// registry entry once nobody else is waiting on it.
#[derive(Debug)]
pub struct InflightGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
