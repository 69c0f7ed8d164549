//! File-system access used by file-editing agents
//!
//! Agents talk to [`FileSystem`] rather than `tokio::fs` so the workspace
//! root can be enforced in one place and tests can run against memory.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Async file-system boundary
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check whether a file exists
    async fn file_exists(&self, path: &str) -> Result<bool>;

    /// Read a whole file as UTF-8 text
    async fn read_all_text(&self, path: &str) -> Result<String>;

    /// Replace a file's contents, creating it (and parent directories) if needed
    async fn write_all_text(&self, path: &str, content: &str) -> Result<()>;
}

/// Shared file-system handle
pub type SharedFileSystem = Arc<dyn FileSystem>;

/// Local disk, confined to a workspace root
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    /// Create a file system rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a workspace-relative path, rejecting anything that escapes the root
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.trim().is_empty() {
            return Err(Error::InvalidInput("path must not be empty".to_string()));
        }

        let requested = Path::new(path);
        let relative = if requested.is_absolute() {
            requested.strip_prefix(&self.root).map_err(|_| {
                warn!(path = %path, "Absolute path outside workspace root");
                Error::PermissionDenied(format!("'{path}' is outside the workspace"))
            })?
        } else {
            requested
        };

        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    warn!(path = %path, "Path traversal attempt detected");
                    return Err(Error::PermissionDenied(
                        "Path traversal (..) is not allowed".to_string(),
                    ));
                }
            }
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl FileSystem for LocalFileSystem {
    async fn file_exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::metadata(&full)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn read_all_text(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(path.to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// The write runs on its own task: once started it always reaches
    /// either the rename or the staging cleanup, even if the caller's
    /// future is dropped.
    async fn write_all_text(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidInput(format!("'{path}' has no file name")))?;
        let staging = full.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        let content = content.to_owned();
        let bytes = content.len();
        tokio::spawn(commit(staging, full, content))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))??;

        debug!(path = %path, bytes, "File written");
        Ok(())
    }
}

/// Write-then-rename, so readers never see a half-written file
async fn commit(staging: PathBuf, target: PathBuf, content: String) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if let Err(e) = tokio::fs::write(&staging, content).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(Error::Io(e));
    }
    if let Err(e) = tokio::fs::rename(&staging, &target).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(Error::Io(e));
    }
    Ok(())
}

/// In-memory file system for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryFileSystem {
    /// Create an empty file system
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file
    pub async fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        self.files.write().await.insert(path.into(), content.into());
    }

    /// Snapshot of a file's contents
    pub async fn get(&self, path: &str) -> Option<String> {
        self.files.read().await.get(path).cloned()
    }

    /// Number of stored files
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    /// Check if no files are stored
    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.files.read().await.contains_key(path))
    }

    async fn read_all_text(&self, path: &str) -> Result<String> {
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn write_all_text(&self, path: &str, content: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(Error::InvalidInput("path must not be empty".to_string()));
        }
        self.files
            .write()
            .await
            .insert(path.to_string(), content.to_string());
        Ok(())
    }
}
