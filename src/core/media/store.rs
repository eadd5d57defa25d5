//! Media library for the pillow companion
//! This module owns the on-disk file directory and the in-memory index from
//! file name to record: write-once ingestion, deletion, enumeration, and
//! cached playable-source resolution.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tokio::sync::Mutex;

use crate::core::media::fs::{FileStore, StoreEntry};
use crate::core::media::source::SourceResolver;
use crate::core::media::types::{DEFAULT_MIME_TYPE, MediaFileRecord, PlayableSource};
use crate::error::MediaError;

/// Manages locally persisted media files and their playable sources.
///
/// The resolver is fixed at construction; one host context, one resolution
/// strategy for the whole index lifetime.
pub struct MediaStore {
    store: Arc<dyn FileStore>,
    resolver: Arc<dyn SourceResolver>,
    /// Index from file name to record. One record per name, ever.
    index: Mutex<HashMap<String, MediaFileRecord>>,
}

impl MediaStore {
    pub fn new(store: Arc<dyn FileStore>, resolver: Arc<dyn SourceResolver>) -> Self {
        Self {
            store,
            resolver,
            index: Mutex::new(HashMap::new()),
        }
    }

    /// Persists a new file and indexes it. Rejects duplicate names
    /// (case-sensitive exact match); there is no overwrite and no versioning.
    pub async fn ingest(
        &self,
        name: &str,
        bytes: &[u8],
        mime_type: &str,
        last_modified: DateTime<Utc>,
    ) -> Result<MediaFileRecord, MediaError> {
        {
            let index = self.index.lock().await;
            if index.contains_key(name) {
                warn!("File with name {:?} already exists.", name);
                return Err(MediaError::DuplicateName(name.to_string()));
            }
        }

        let uri = self.store.write(name, bytes).await?;
        let entry = StoreEntry {
            name: name.to_string(),
            size: bytes.len() as u64,
            mtime: last_modified,
            uri,
        };
        let source = self.resolve_logged(&entry, mime_type).await;

        let record = MediaFileRecord {
            name: entry.name,
            size: entry.size,
            last_modified: entry.mtime,
            mime_type: mime_type.to_string(),
            uri: entry.uri,
            source,
        };

        self.index
            .lock()
            .await
            .insert(record.name.clone(), record.clone());
        info!("Ingested {:?} ({} bytes)", record.name, record.size);
        Ok(record)
    }

    /// Deletes a file's backing bytes and drops it from the index. When the
    /// underlying deletion fails the record stays visible, so the index never
    /// silently loses track of orphaned bytes.
    pub async fn remove(&self, record: &MediaFileRecord) -> Result<(), MediaError> {
        if let Err(e) = self.store.delete(&record.name).await {
            error!("Failed to delete {:?}: {}", record.name, e);
            return Err(MediaError::DeletionFailed {
                name: record.name.clone(),
                source: e,
            });
        }
        self.index.lock().await.remove(&record.name);
        Ok(())
    }

    /// Enumerates the backing store, rebuilding and re-indexing a record per
    /// entry. Sources already resolved stay cached; a resolution failure for
    /// one entry leaves its source empty and enumeration continues.
    pub async fn list(&self, root: &str) -> Result<Vec<MediaFileRecord>, MediaError> {
        let entries = self.store.list_directory(root).await?;
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            let cached = {
                let index = self.index.lock().await;
                index.get(&entry.name).cloned()
            };
            // An already-indexed record keeps the mime type its caller
            // supplied at ingest time; only new entries get the default.
            let mime_type = cached
                .as_ref()
                .map(|r| r.mime_type.clone())
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
            let source = match cached.and_then(|r| r.source) {
                Some(source) => Some(source),
                // Blob resolution reads the whole file; do it once per name.
                None => self.resolve_logged(&entry, &mime_type).await,
            };

            let record = MediaFileRecord {
                name: entry.name,
                size: entry.size,
                last_modified: entry.mtime,
                mime_type,
                uri: entry.uri,
                source,
            };
            self.index
                .lock()
                .await
                .insert(record.name.clone(), record.clone());
            records.push(record);
        }

        Ok(records)
    }

    /// Snapshot of every indexed record.
    pub async fn records(&self) -> Vec<MediaFileRecord> {
        self.index.lock().await.values().cloned().collect()
    }

    /// Looks up one record by name.
    pub async fn get(&self, name: &str) -> Option<MediaFileRecord> {
        self.index.lock().await.get(name).cloned()
    }

    async fn resolve_logged(&self, entry: &StoreEntry, mime_type: &str) -> Option<PlayableSource> {
        match self
            .resolver
            .resolve(self.store.as_ref(), entry, mime_type)
            .await
        {
            Ok(source) => Some(source),
            Err(e) => {
                error!("Error resolving playable source: {}", e);
                None
            }
        }
    }
}
