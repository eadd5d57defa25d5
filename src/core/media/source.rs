//! Playable source resolution for the media library
//! Native hosts hand the player a URI translated from the storage location;
//! browser-like hosts cannot read the store directly, so the bytes are loaded
//! once and wrapped as an in-process blob. The strategy is picked once per
//! process and never mixed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::media::fs::{FileStore, StoreEntry};
use crate::core::media::types::{BlobHandle, PlayableSource};
use crate::error::MediaError;

/// Strategy for turning a stored file into a playable source.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(
        &self,
        store: &dyn FileStore,
        entry: &StoreEntry,
        mime_type: &str,
    ) -> Result<PlayableSource, MediaError>;
}

/// Host context query: true when the process runs in a native/embedded host
/// that can translate storage locations into player-readable URIs.
pub fn is_native_host() -> bool {
    cfg!(not(target_arch = "wasm32"))
}

/// Picks the resolver for this host, once at startup.
pub fn resolver_for_host(native: bool) -> Arc<dyn SourceResolver> {
    if native {
        Arc::new(NativeSourceResolver)
    } else {
        Arc::new(BlobSourceResolver)
    }
}

/// Translates the storage token into a URI the player reads directly.
pub struct NativeSourceResolver;

#[async_trait]
impl SourceResolver for NativeSourceResolver {
    async fn resolve(
        &self,
        _store: &dyn FileStore,
        entry: &StoreEntry,
        _mime_type: &str,
    ) -> Result<PlayableSource, MediaError> {
        Ok(PlayableSource::Uri(format!("file://{}", entry.uri)))
    }
}

/// Reads the full bytes through the store and keeps them in memory. Expensive;
/// the media store caches the result in its index so it runs once per file.
pub struct BlobSourceResolver;

#[async_trait]
impl SourceResolver for BlobSourceResolver {
    async fn resolve(
        &self,
        store: &dyn FileStore,
        entry: &StoreEntry,
        mime_type: &str,
    ) -> Result<PlayableSource, MediaError> {
        let bytes =
            store
                .read(&entry.name)
                .await
                .map_err(|e| MediaError::ResolutionFailed {
                    name: entry.name.clone(),
                    reason: e.to_string(),
                })?;
        Ok(PlayableSource::Blob(BlobHandle::new(bytes, mime_type)))
    }
}
