//! Filesystem collaborator for cache files

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::{CollectionError, Result};

/// Trait for cache file storage
///
/// The collector only ever lists, reads and writes whole files inside a single
/// per-identity directory, so the operations below are all it needs.
/// Implementations must not keep handles open between calls.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// List the names of the regular files in `dir`
    ///
    /// A missing directory yields an empty list. The order is unspecified.
    async fn list_files(&self, dir: &Path) -> Result<Vec<String>>;

    /// Read a whole file as UTF-8 text
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Create or overwrite a file with `content`
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Create `dir` and its parents if they do not exist
    async fn ensure_directory(&self, dir: &Path) -> Result<()>;

    /// Check whether a file or directory exists at `path`
    async fn exists(&self, path: &Path) -> Result<bool>;
}

/// Cache store backed by the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CacheStore for FsStore {
    async fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "Cache directory does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(CollectionError::file_error(dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) =
            entries.next_entry().await.map_err(|e| CollectionError::file_error(dir, e))?
        {
            let file_type =
                entry.file_type().await.map_err(|e| CollectionError::file_error(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        trace!(dir = %dir.display(), count = names.len(), "Listed cache files");
        Ok(names)
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path).await.map_err(|e| CollectionError::file_error(path, e))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        tokio::fs::write(path, content).await.map_err(|e| CollectionError::file_error(path, e))
    }

    async fn ensure_directory(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| CollectionError::file_error(dir, e))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        tokio::fs::try_exists(path).await.map_err(|e| CollectionError::file_error(path, e))
    }
}

/// Join a cache directory and file name
pub(crate) fn cache_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}
