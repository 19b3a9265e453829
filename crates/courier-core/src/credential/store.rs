//! Bundled credential stores: in-memory and JSON-file backed

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{Credential, CredentialStore};
use crate::{Error, Result};

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `credential`
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, credential: Credential) -> Result<()> {
        *self.slot.write().await = Some(credential);
        Ok(())
    }

    async fn read(&self) -> Result<Option<Credential>> {
        Ok(self.slot.read().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot.write().await = None;
        Ok(())
    }
}

/// Store that keeps the credential as JSON in a single file
///
/// Writes go through a sibling temporary file and a rename, and an internal
/// lock serialises access from concurrent requests within one process.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn remove_file(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Credential {
                message: format!("Failed to remove {}", self.path.display()),
                source: Some(e.into()),
            }),
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, credential: Credential) -> Result<()> {
        let _guard = self.lock.write().await;
        let content = serde_json::to_vec_pretty(&credential)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| Error::Credential {
            message: format!("Failed to persist credential to {}", self.path.display()),
            source: Some(e.into()),
        })?;

        debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }

    async fn read(&self) -> Result<Option<Credential>> {
        // Write lock: a malformed file is removed during the read.
        let _guard = self.lock.write().await;

        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Credential {
                    message: format!("Failed to read {}", self.path.display()),
                    source: Some(e.into()),
                })
            }
        };

        match serde_json::from_slice::<Credential>(&content) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Stored credential is malformed, clearing it"
                );
                self.remove_file().await?;
                Ok(None)
            }
        }
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        self.remove_file().await?;
        debug!(path = %self.path.display(), "Credential cleared");
        Ok(())
    }
}
