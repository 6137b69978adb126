//! Persistent storage for the session token.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use backend::AuthToken;
use tokio::sync::Mutex;

/// Where the bearer token survives between runs.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    async fn load(&self) -> std::io::Result<Option<AuthToken>>;

    async fn save(&self, token: &AuthToken) -> std::io::Result<()>;

    /// Removes the stored token. Clearing an empty store is not an error.
    async fn clear(&self) -> std::io::Result<()>;
}

/// Token kept in a single file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> std::io::Result<Option<AuthToken>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| AuthToken::new(token)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save(&self, token: &AuthToken) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, token.as_str()).await?;
        tracing::debug!(path = %self.path.display(), "session token saved");
        Ok(())
    }

    async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Token kept in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Arc<Mutex<Option<AuthToken>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a token.
    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token))),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> std::io::Result<Option<AuthToken>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &AuthToken) -> std::io::Result<()> {
        *self.token.lock().await = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> std::io::Result<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}
