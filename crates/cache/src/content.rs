//! Content-addressed cache for expensive generation calls.
//! Two-tier: LocalCache (L1) -> JSON files on disk (L2), keyed by the
//! SHA-256 digest of the request text so identical prompts reuse results
//! across runs and processes.

use crate::inflight::InflightGuards;
use crate::local::{EntryStamp, LocalCache};
use campaign_core::config::CacheConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Filesystem-safe key for a request: lowercase hex SHA-256 of its UTF-8 bytes.
pub fn content_key(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Result of [`ContentCache::get_or_insert_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub value: Value,
    /// True when the value came from the cache rather than `compute`.
    pub hit: bool,
}

/// Disk-backed content cache with a local L1 layer. Entries never expire.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
    local: LocalCache,
    inflight: InflightGuards,
}

impl ContentCache {
    /// Open (creating if needed) the cache directory.
    pub async fn open(config: &CacheConfig) -> CampaignResult<Self> {
        Self::open_at(&config.dir, config.memory_entries).await
    }

    pub async fn open_at(dir: impl AsRef<Path>, memory_entries: usize) -> CampaignResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            CampaignError::Cache(format!("cannot create cache dir {}: {e}", dir.display()))
        })?;
        info!(dir = %dir.display(), "Content cache opened");
        Ok(Self {
            dir,
            local: LocalCache::new(memory_entries),
            inflight: InflightGuards::new(),
        })
    }

    /// Storage location of the entry for `text`.
    pub fn entry_path(&self, text: &str) -> PathBuf {
        self.key_path(&content_key(text))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Look up the cached value for `text`. A missing entry is `Ok(None)`;
    /// an entry that exists but does not parse is an invariant violation.
    ///
    /// The L1 copy is served only while the entry file is unchanged, so
    /// writes from other processes are picked up on the next read.
    pub async fn get(&self, text: &str) -> CampaignResult<Option<Value>> {
        let key = content_key(text);
        let path = self.key_path(&key);

        let stamp = match tokio::fs::metadata(&path).await {
            Ok(meta) => EntryStamp::of(&meta),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.local.remove(&key);
                return Ok(None);
            }
            Err(e) => return Err(read_error(&path, e)),
        };
        if let Some(value) = stamp.and_then(|stamp| self.local.get(&key, stamp)) {
            metrics::counter!("cache.content.l1_hit").increment(1);
            return Ok(Some(value));
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_error(&path, e)),
        };
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            CampaignError::InvariantViolation(format!(
                "corrupt cache entry {}: {e}",
                path.display()
            ))
        })?;
        if let Some(stamp) = stamp {
            self.local.put(key, stamp, value.clone());
        }
        Ok(Some(value))
    }

    /// Store `value` for `text`, overwriting any previous entry, and return
    /// the entry's storage location.
    pub async fn set(&self, text: &str, value: &Value) -> CampaignResult<PathBuf> {
        let key = content_key(text);
        let path = self.key_path(&key);
        let tmp = self
            .dir
            .join(format!("{key}.{}.tmp", uuid::Uuid::new_v4().simple()));

        let bytes = serde_json::to_vec(value)?;
        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CampaignError::Cache(format!(
                "cannot write {}: {e}",
                tmp.display()
            )));
        }
        // Readers never observe a partially written entry.
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CampaignError::Cache(format!(
                "cannot publish {}: {e}",
                path.display()
            )));
        }

        match tokio::fs::metadata(&path).await.ok().and_then(|m| EntryStamp::of(&m)) {
            Some(stamp) => self.local.put(key, stamp, value.clone()),
            None => self.local.remove(&key),
        }
        metrics::counter!("cache.content.write").increment(1);
        Ok(path)
    }

    /// Return the cached value for `text`, or run `compute` and store its
    /// result. Concurrent callers for the same text wait on one another so
    /// `compute` runs at most once per key.
    ///
    /// An unreadable or unwritable cache degrades to computing the value;
    /// only a corrupt entry is reported.
    pub async fn get_or_insert_with<F, Fut>(
        &self,
        text: &str,
        compute: F,
    ) -> CampaignResult<CacheLookup>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CampaignResult<Value>>,
    {
        if let Some(value) = self.lookup(text).await? {
            metrics::counter!("cache.content.hit").increment(1);
            return Ok(CacheLookup { value, hit: true });
        }

        let key = content_key(text);
        let _guard = self.inflight.acquire(&key).await;

        // Another task may have filled the entry while we waited.
        if let Some(value) = self.lookup(text).await? {
            debug!(key = %key, "Content cache hit after in-flight wait");
            metrics::counter!("cache.content.hit").increment(1);
            return Ok(CacheLookup { value, hit: true });
        }

        metrics::counter!("cache.content.miss").increment(1);
        debug!(key = %key, inflight = self.inflight.active(), "Content cache miss");
        let value = compute().await?;
        if let Err(e) = self.set(text, &value).await {
            warn!(key = %key, error = %e, "Failed to persist cache entry");
            metrics::counter!("cache.content.error").increment(1);
        }
        Ok(CacheLookup { value, hit: false })
    }

    async fn lookup(&self, text: &str) -> CampaignResult<Option<Value>> {
        match self.get(text).await {
            Err(CampaignError::Cache(msg)) => {
                warn!(error = %msg, "Content cache unreadable, treating as miss");
                metrics::counter!("cache.content.error").increment(1);
                Ok(None)
            }
            other => other,
        }
    }
}

fn read_error(path: &Path, e: std::io::Error) -> CampaignError {
    CampaignError::Cache(format!("cannot read {}: {e}", path.display()))
}
