//! In-memory file store double for media library tests.

use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::media::fs::{FileStore, StoreEntry};

struct StoredFile {
    bytes: Vec<u8>,
    mtime: DateTime<Utc>,
}

/// Scriptable in-memory store. Failure flags let tests exercise the partial
/// failure paths without touching a real filesystem.
pub(crate) struct MemoryFileStore {
    files: StdMutex<BTreeMap<String, StoredFile>>,
    fail_delete: AtomicBool,
    /// Names whose reads fail, for per-entry resolution failures
    unreadable: StdMutex<Vec<String>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self {
            files: StdMutex::new(BTreeMap::new()),
            fail_delete: AtomicBool::new(false),
            unreadable: StdMutex::new(Vec::new()),
        }
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn set_unreadable(&self, name: &str) {
        self.unreadable.lock().unwrap().push(name.to_string());
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .map(|f| f.bytes.clone())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<String> {
        self.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                bytes: bytes.to_vec(),
                mtime: Utc::now(),
            },
        );
        Ok(format!("/store/{path}"))
    }

    async fn delete(&self, path: &str) -> io::Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"));
        }
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        if self.unreadable.lock().unwrap().iter().any(|n| n == path) {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "unreadable"));
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    async fn list_directory(&self, _path: &str) -> io::Result<Vec<StoreEntry>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|(name, file)| StoreEntry {
                name: name.clone(),
                size: file.bytes.len() as u64,
                mtime: file.mtime,
                uri: format!("/store/{name}"),
            })
            .collect())
    }
}
