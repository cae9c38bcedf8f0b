//! Session token storage.
//!
//! # Design
//! `TokenStore` is async for every backend, including the in-memory one, so
//! callers never care whether the underlying primitive can suspend. The store
//! keeps whatever token it was given until `clear` is called; there is no
//! expiry tracking.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TokenStoreError;

/// An opaque bearer credential. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Holds at most one session token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self) -> Result<Option<SessionToken>, TokenStoreError>;

    /// Replaces any token already stored.
    async fn set(&self, token: SessionToken) -> Result<(), TokenStoreError>;

    /// Removes the stored token. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Process-local store backed by a synchronous lock.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SessionToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: SessionToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

fn poisoned<T>(_: T) -> TokenStoreError {
    TokenStoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<SessionToken>, TokenStoreError> {
        Ok(self.token.read().map_err(poisoned)?.clone())
    }

    async fn set(&self, token: SessionToken) -> Result<(), TokenStoreError> {
        *self.token.write().map_err(poisoned)? = Some(token);
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.write().map_err(poisoned)? = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: SessionToken,
}

/// Persistent store that keeps the token in a small JSON file.
///
/// The file is read on every `get`, so a token written by a previous process
/// is picked up after restart. `set` writes a sibling temp file and renames it
/// over the target, so readers see either the old token or the new one. On
/// Unix the file is only readable by its owner.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory, e.g.
    /// `~/.local/share/access-core/session.json`.
    pub fn default_location() -> Result<Self, TokenStoreError> {
        let dir = dirs::data_local_dir().ok_or_else(|| {
            TokenStoreError::Unavailable("no local data directory".to_string())
        })?;
        Ok(Self::new(dir.join("access-core").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique per call so concurrent `set`s never share a temp file.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }
}

async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<Option<SessionToken>, TokenStoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredToken =
            serde_json::from_slice(&raw).map_err(|e| TokenStoreError::Corrupt(e.to_string()))?;
        Ok(Some(stored.token))
    }

    async fn set(&self, token: SessionToken) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec(&StoredToken { token })
            .map_err(|e| TokenStoreError::Corrupt(e.to_string()))?;

        let staging = self.staging_path();
        if let Err(e) = write_private(&staging, &raw).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
