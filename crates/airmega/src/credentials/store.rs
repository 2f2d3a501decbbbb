//! Credential persistence abstraction.
//!
//! The core only needs `save`/`load`/`is_expired`; where the pair lives is
//! up to the implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use super::types::TokenPair;
use crate::error::{AirmegaError, Result};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a freshly issued or refreshed token pair, replacing any previous one.
    async fn save(&self, tokens: &TokenPair) -> Result<()>;

    /// Load the stored pair, if any.
    async fn load(&self) -> Result<Option<TokenPair>>;

    /// An empty store counts as expired.
    async fn is_expired(&self) -> Result<bool> {
        Ok(self
            .load()
            .await?
            .is_none_or(|tokens| tokens.is_expired_at(Utc::now())))
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, tokens: &TokenPair) -> Result<()> {
        *self.tokens.write() = Some(tokens.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>> {
        Ok(self.tokens.read().clone())
    }
}

/// JSON file store, used to keep tokens across process restarts.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tokens".to_string());
        self.path.with_file_name(format!(
            ".{}.{}.{:016x}.tmp",
            name,
            std::process::id(),
            rand::random::<u64>()
        ))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, tokens: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(tokens)?;
        // Write-then-rename; every writer gets its own temp file
        let tmp = self.temp_path();
        let written = match tokio::fs::write(&tmp, data).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), "Saved tokens");
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let tokens = serde_json::from_slice(&data).map_err(|e| {
            AirmegaError::Store(format!(
                "corrupt token cache {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(tokens))
    }
}
