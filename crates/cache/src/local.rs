//! In-process cache backed by DashMap for lock-free concurrent access.
//! Serves as L1 in front of the on-disk content store. Each entry carries
//! the stamp of the file it was read from and is only served while the
//! file still carries that stamp.

use dashmap::DashMap;
use serde_json::Value;
use std::fs::Metadata;
use std::sync::Arc;
use std::time::SystemTime;

/// Identity of an entry file at the time it was read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStamp {
    modified: SystemTime,
    len: u64,
}

impl EntryStamp {
    /// `None` when the platform does not report modification times.
    pub fn of(meta: &Metadata) -> Option<Self> {
        meta.modified().ok().map(|modified| Self {
            modified,
            len: meta.len(),
        })
    }
}

/// Lock-free local cache of content entries keyed by content digest.
#[derive(Debug, Clone)]
pub struct LocalCache {
    store: Arc<DashMap<String, (EntryStamp, Value)>>,
    max_entries: usize,
}

impl LocalCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(DashMap::with_capacity(max_entries.min(1024))),
            max_entries,
        }
    }

    /// Value for `key` if it was recorded under the same file stamp.
    pub fn get(&self, key: &str, stamp: EntryStamp) -> Option<Value> {
        self.store
            .get(key)
            .filter(|entry| entry.value().0 == stamp)
            .map(|entry| entry.value().1.clone())
    }

    /// Insert or overwrite an entry.
    pub fn put(&self, key: String, stamp: EntryStamp, value: Value) {
        // At capacity only existing keys are refreshed; the disk layer still holds everything.
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            return;
        }
        self.store.insert(key, (stamp, value));
    }

    pub fn remove(&self, key: &str) {
        self.store.remove(key);
    }
}
