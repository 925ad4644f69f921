//! Durable token slot implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use tagtag_core::error::AppError;
use tagtag_core::result::AppResult;
use tagtag_core::traits::TokenPersistence;
use tagtag_core::types::StoredToken;

/// Token slot backed by a single JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves either the old token or the new one.
#[derive(Debug, Clone)]
pub struct FileTokenPersistence {
    /// Slot location.
    path: PathBuf,
}

impl FileTokenPersistence {
    /// Creates a slot at the given path. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TokenPersistence for FileTokenPersistence {
    async fn load(&self) -> AppResult<Option<StoredToken>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::with_source(
                    tagtag_core::ErrorKind::Storage,
                    format!("Failed to read token slot {}", self.path.display()),
                    e,
                ));
            }
        };

        let token = serde_json::from_slice(&raw)?;
        Ok(Some(token))
    }

    async fn save(&self, token: &StoredToken) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(token)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "Token slot written");
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token slot removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token slot kept in process memory. Used in tests and when persistence is
/// switched off.
#[derive(Debug, Default)]
pub struct MemoryTokenPersistence {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryTokenPersistence {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot that already holds a token.
    pub fn with_token(token: StoredToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenPersistence for MemoryTokenPersistence {
    async fn load(&self) -> AppResult<Option<StoredToken>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, token: &StoredToken) -> AppResult<()> {
        *self.slot.lock().await = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.slot.lock().await = None;
        Ok(())
    }
}
