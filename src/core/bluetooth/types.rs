//! Defines shared data structures for the bluetooth module.

use serde::Serialize;

use crate::core::bluetooth::radio::Link;
use std::sync::Arc;

/// Stable identifier for a peripheral, plus its advertised name if one was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    /// Platform-specific unique identifier for the device (especially important on macOS)
    pub id: String,
    /// The advertised name of the device, if available
    pub name: Option<String>,
}

impl DeviceIdentity {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self { id: id.into(), name }
    }

    /// Human-readable label: the advertised name, falling back to the identifier.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Represents a peripheral seen during one scan window.
/// Ephemeral; replaced by the next scan.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    pub identity: DeviceIdentity,
    /// The signal strength (RSSI) at discovery time, if reported
    pub rssi: Option<i16>,
}

/// A characteristic exposed by a connected peripheral's service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicDescriptor {
    pub uuid: uuid::Uuid,
}

/// A service discovered after connection, with its characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub uuid: uuid::Uuid,
    pub characteristics: Vec<CharacteristicDescriptor>,
}

impl ServiceDescriptor {
    /// Returns true if this service exposes the given characteristic.
    pub fn has_characteristic(&self, characteristic: uuid::Uuid) -> bool {
        self.characteristics.iter().any(|c| c.uuid == characteristic)
    }
}

/// Connection status of the single process-wide session. Both disconnect
/// paths settle straight at `Idle`, which doubles as the disconnected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Polling,
    Error,
}

impl ConnectionStatus {
    /// True while a live link exists (descriptors held, reads possible).
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionStatus::Connected | ConnectionStatus::Polling)
    }
}

/// Snapshot of the session: status, connected peripheral, discovered services.
/// Mutated only by the session manager.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub status: ConnectionStatus,
    pub device: Option<DeviceIdentity>,
    pub services: Vec<ServiceDescriptor>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            status: ConnectionStatus::Idle,
            device: None,
            services: Vec::new(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events emitted by the session layer. Peer-initiated and local disconnects
/// produce the same `Disconnected` event, so consumers cannot tell them apart.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Connected(DeviceIdentity),
    Disconnected(DeviceIdentity),
    /// A poll-tick read failed; the session itself is untouched.
    ReadError(String),
}

/// State held for a successfully connected peripheral.
/// This struct holds the active link handle needed for reads and teardown.
#[derive(Clone)]
pub(crate) struct ConnectedLinkState {
    pub link: Arc<dyn Link>,
}
