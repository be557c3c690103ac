use crate::error::{ContextError, Result};
use std::path::{Path, PathBuf};

/// One entry returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
}

/// Filesystem access used by the analyzer and the file tracker.
///
/// Implementations decide where files come from (local disk, a remote
/// mount, an in-memory editor buffer store). Listings are expected to be
/// returned in a stable order.
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    async fn list(&self, path: &Path) -> Result<Vec<FsEntry>>;
    async fn read_file(&self, path: &Path) -> Result<String>;
    async fn exists(&self, path: &Path) -> bool;
}

/// `FileSystem` backed by the local disk through `tokio::fs`.
#[derive(Debug, Default, Clone)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl FileSystem for LocalFileSystem {
    async fn list(&self, path: &Path) -> Result<Vec<FsEntry>> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| ContextError::io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| ContextError::io(path, e))?
        {
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            entries.push(FsEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_directory: file_type.is_dir(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ContextError::io(path, e))?;
        String::from_utf8(bytes).map_err(|_| ContextError::Decode {
            path: path.to_path_buf(),
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}
