//! Media library for the pillow companion
//! This module manages locally persisted audio files and their
//! playable-source resolution.

pub mod fs;
pub mod source;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export types that should be publicly accessible
pub use fs::{DiskFileStore, FileStore, StoreEntry};
pub use source::{SourceResolver, is_native_host, resolver_for_host};
pub use store::MediaStore;
pub use types::{BlobHandle, MediaFileRecord, PlayableSource};
