//! Local filesystem artifact store for rendered images.

use async_trait::async_trait;
use campaign_core::backend::{ArtifactStore, BackendError, StoredArtifact};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes each artifact to `<dir>/<12 hex chars>.png` and hands back a
/// `file://` URL to its absolute path.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, bytes: &[u8]) -> Result<StoredArtifact, BackendError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            BackendError::Unavailable(format!("cannot create {}: {e}", self.dir.display()))
        })?;

        let id = Uuid::new_v4().simple().to_string();
        let path = self.dir.join(format!("{}.png", &id[..12]));
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            BackendError::Unavailable(format!("cannot write {}: {e}", path.display()))
        })?;

        let absolute = tokio::fs::canonicalize(&path).await.unwrap_or_else(|_| path.clone());
        Ok(StoredArtifact {
            location: path.to_string_lossy().into_owned(),
            url: format!("file://{}", absolute.display()),
        })
    }

    async fn read(&self, location: &str) -> Result<Vec<u8>, BackendError> {
        tokio::fs::read(location)
            .await
            .map_err(|e| BackendError::Unavailable(format!("cannot read {location}: {e}")))
    }
}
