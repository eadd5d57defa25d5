//! Error types for the pillow companion core
//! This module defines the error taxonomy for the bluetooth session
//! and the media library.

use thiserror::Error;

/// Errors raised by the bluetooth session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying radio is missing or not powered.
    #[error("bluetooth radio unavailable: {0}")]
    RadioUnavailable(String),

    /// A scan is already running; it must be stopped before a new one starts.
    #[error("a scan is already in progress")]
    ScanInProgress,

    /// The peripheral rejected the link or the attempt timed out.
    #[error("failed to connect to {device}: {reason}")]
    ConnectFailed { device: String, reason: String },

    /// A connection is already active; disconnect first.
    #[error("already connected to a device")]
    AlreadyConnected,

    /// A characteristic read failed during an otherwise healthy session.
    #[error("characteristic read failed: {0}")]
    ReadFailed(String),

    /// Link teardown failed. Logged only; local state is cleared regardless.
    #[error("disconnect teardown failed: {0}")]
    DisconnectFailed(String),
}

/// Errors raised by the media library.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A file with the same name is already in the library.
    #[error("a file named {0:?} already exists")]
    DuplicateName(String),

    /// The backing bytes could not be deleted; the record stays visible.
    #[error("failed to delete {name:?}: {source}")]
    DeletionFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A playable source could not be resolved for one entry.
    #[error("failed to resolve a playable source for {name:?}: {reason}")]
    ResolutionFailed { name: String, reason: String },

    /// The file store itself failed.
    #[error("file store error: {0}")]
    Store(#[from] std::io::Error),
}
