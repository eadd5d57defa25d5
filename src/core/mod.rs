//! Core functionality for the pillow companion
//! This module contains the bluetooth session layer and the media library.

pub mod bluetooth;
pub mod media;

// Re-export commonly used types
pub use bluetooth::session::SessionManager;
pub use media::store::MediaStore;
