//! File store collaborator for the media library
//! This module defines the fallible storage seam and the production
//! implementation over a single on-disk directory.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use tokio::fs;

use crate::utils::ensure_directory_exists;

/// One entry returned by directory enumeration.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub name: String,
    pub size: u64,
    pub mtime: DateTime<Utc>,
    /// Storage location token (the absolute path on disk stores)
    pub uri: String,
}

/// Backing byte storage for media files. All operations are fallible remote
/// calls from the library's point of view.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes `bytes` under `path`, returning the storage location token.
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<String>;

    /// Deletes the bytes stored under `path`.
    async fn delete(&self, path: &str) -> io::Result<()>;

    /// Reads the full bytes stored under `path`.
    async fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Enumerates the files under `path` ("" for the root).
    async fn list_directory(&self, path: &str) -> io::Result<Vec<StoreEntry>>;
}

/// File store rooted at one directory, backed by tokio::fs.
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    /// Creates the store, making sure the root directory exists.
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        ensure_directory_exists(&root).await?;
        Ok(Self { root })
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    async fn entry_for(path: &Path, name: String) -> io::Result<StoreEntry> {
        let metadata = fs::metadata(path).await?;
        let mtime = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(StoreEntry {
            name,
            size: metadata.len(),
            mtime,
            uri: path.to_string_lossy().into_owned(),
        })
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<String> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, bytes).await?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), full);
        Ok(full.to_string_lossy().into_owned())
    }

    async fn delete(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.full_path(path)).await
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.full_path(path)).await
    }

    async fn list_directory(&self, path: &str) -> io::Result<Vec<StoreEntry>> {
        let dir = self.full_path(path);
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&dir).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            // Names are root-relative so that read/delete on them resolve to
            // the same bytes this enumeration saw.
            let name = if path.is_empty() {
                file_name
            } else {
                format!("{}/{}", path.trim_end_matches('/'), file_name)
            };
            entries.push(Self::entry_for(&entry.path(), name).await?);
        }

        Ok(entries)
    }
}
