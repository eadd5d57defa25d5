//! Defines shared data structures for the media library.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Mime type assumed for enumerated entries when none was recorded.
pub const DEFAULT_MIME_TYPE: &str = "audio/mpeg";

/// A reference a playback component can use to access file bytes without
/// re-reading the store.
#[derive(Debug, Clone)]
pub enum PlayableSource {
    /// Host-translated URI pointing at the stored bytes (native hosts).
    Uri(String),
    /// In-process handle to the full file contents (browser-like hosts).
    Blob(BlobHandle),
}

/// Immutable in-memory copy of a file's bytes plus its mime type.
#[derive(Clone)]
pub struct BlobHandle {
    mime_type: String,
    bytes: Arc<Vec<u8>>,
}

impl BlobHandle {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One media file in the library. Identity is the file name; the store
/// rejects duplicates by name.
#[derive(Debug, Clone)]
pub struct MediaFileRecord {
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub mime_type: String,
    /// Storage location token returned by the file store
    pub uri: String,
    /// Lazily resolved playable source; `None` when resolution failed
    pub source: Option<PlayableSource>,
}
