//! Bluetooth functionality for the pillow companion
//! This module handles all bluetooth operations including scanning,
//! connecting, and polling data from the pillow peripheral.

pub mod codec;
pub mod constants;
pub mod poller;
pub mod radio;
pub mod scanner;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export types that should be publicly accessible
pub use constants::*;
pub use poller::Poller;
pub use radio::{BluestRadio, Link, Radio};
pub use scanner::ScanCoordinator;
pub use session::SessionManager;
pub use types::{
    CharacteristicDescriptor, ConnectionStatus, DeviceIdentity, DiscoveredDevice, ServiceDescriptor,
    SessionEvent, SessionState,
};
