//! Session management for the pillow companion
//! This module owns the single process-wide connection: connect, descriptor
//! discovery, disconnect, and detection of peer-initiated drops.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::core::bluetooth::constants::NOTIFICATION_DURATION_MS;
use crate::core::bluetooth::radio::{Link, Radio};
use crate::core::bluetooth::types::{
    ConnectedLinkState, ConnectionStatus, DeviceIdentity, SessionEvent, SessionState,
};
use crate::error::SessionError;
use crate::notify::Notifier;

/// Capacity of the session event channel. Consumers that lag simply miss
/// intermediate events; only the latest state matters to them.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Everything the session mutates, behind one lock: the single serialization
/// point for caller-driven transitions and radio callbacks alike.
struct Shared {
    state: SessionState,
    connected: Option<ConnectedLinkState>,
    /// Bumped on every connect and every clear; stale disconnect watchers
    /// compare against it before touching the session.
    epoch: u64,
}

/// Owns at most one active connection to a peripheral.
pub struct SessionManager {
    radio: Arc<dyn Radio>,
    shared: Arc<Mutex<Shared>>,
    events: broadcast::Sender<SessionEvent>,
    notifier: Arc<dyn Notifier>,
}

impl SessionManager {
    pub fn new(radio: Arc<dyn Radio>, notifier: Arc<dyn Notifier>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            radio,
            shared: Arc::new(Mutex::new(Shared {
                state: SessionState::new(),
                connected: None,
                epoch: 0,
            })),
            events,
            notifier,
        }
    }

    /// Snapshot of the current session state.
    pub async fn state(&self) -> SessionState {
        self.shared.lock().await.state.clone()
    }

    /// Subscribes to session events (connects, disconnects, read errors).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn events(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    /// Checks if a device is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.shared.lock().await.state.status.is_active()
    }

    /// Returns the identity of the currently connected device.
    pub async fn connected_device(&self) -> Option<DeviceIdentity> {
        self.shared.lock().await.state.device.clone()
    }

    /// Connects to a peripheral discovered by the last scan and fetches its
    /// service descriptors. Valid from `Idle` or `Error` (the latter is reset
    /// to `Idle` first); rejected with `AlreadyConnected` while a connection
    /// exists or is being established.
    pub async fn connect(&self, identity: &DeviceIdentity) -> Result<(), SessionError> {
        {
            let mut shared = self.shared.lock().await;
            match shared.state.status {
                ConnectionStatus::Connecting
                | ConnectionStatus::Connected
                | ConnectionStatus::Polling => return Err(SessionError::AlreadyConnected),
                ConnectionStatus::Error => {
                    // A failed attempt is recoverable; retrying resets first.
                    shared.state = SessionState::new();
                }
                ConnectionStatus::Idle => {}
            }
            shared.state.status = ConnectionStatus::Connecting;
        }

        let link = match self.radio.connect(identity).await {
            Ok(link) => link,
            Err(e) => return Err(self.fail_connect(identity, e).await),
        };

        let services = match link.services().await {
            Ok(services) => services,
            Err(e) => {
                if let Err(teardown) = link.disconnect().await {
                    warn!("Teardown after failed discovery also failed: {}", teardown);
                }
                return Err(self.fail_connect(identity, e).await);
            }
        };

        let epoch = {
            let mut shared = self.shared.lock().await;
            shared.epoch += 1;
            shared.state.status = ConnectionStatus::Connected;
            shared.state.device = Some(identity.clone());
            shared.state.services = services;
            shared.connected = Some(ConnectedLinkState { link: link.clone() });
            shared.epoch
        };

        info!("Device successfully connected: {}", identity.id);
        let _ = self.events.send(SessionEvent::Connected(identity.clone()));
        self.notifier.notify(
            &format!("Connected to device {}", identity.label()),
            Duration::from_millis(NOTIFICATION_DURATION_MS),
        );

        self.spawn_disconnect_watcher(link, epoch);
        Ok(())
    }

    /// Disconnects from the currently connected device. Local state always
    /// returns to `Idle`; teardown failures are logged, never surfaced, so the
    /// session can never get stuck believing it is connected.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        let (link, identity) = {
            let mut shared = self.shared.lock().await;
            if !shared.state.status.is_active() {
                info!("No device connected; nothing to disconnect.");
                return Ok(());
            }
            let link = shared.connected.as_ref().map(|c| c.link.clone());
            let identity = Self::clear_locked(&mut shared);
            (link, identity)
        };

        if let Some(link) = link {
            if let Err(e) = link.disconnect().await {
                warn!("Disconnect teardown failed (state already cleared): {}", e);
            }
        }

        if let Some(identity) = identity {
            self.announce_disconnect(&identity);
        }
        Ok(())
    }

    /// Returns the active link if the session currently exposes the target
    /// characteristic, marking the session as polling. `None` when there is no
    /// active session or the peripheral does not expose the characteristic.
    pub(crate) async fn poll_target(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Option<Arc<dyn Link>> {
        let mut shared = self.shared.lock().await;
        if !shared.state.status.is_active() {
            return None;
        }
        let exposed = shared
            .state
            .services
            .iter()
            .any(|s| s.uuid == service && s.has_characteristic(characteristic));
        if !exposed {
            return None;
        }
        shared.state.status = ConnectionStatus::Polling;
        shared.connected.as_ref().map(|c| c.link.clone())
    }

    /// Marks the attempt failed and surfaces the error to the caller.
    async fn fail_connect(&self, identity: &DeviceIdentity, e: SessionError) -> SessionError {
        error!("Connection to {} failed: {}", identity.id, e);
        {
            let mut shared = self.shared.lock().await;
            shared.state.status = ConnectionStatus::Error;
        }
        self.notifier.notify(
            &format!("Failed to connect to {}: {}", identity.label(), e),
            Duration::from_millis(NOTIFICATION_DURATION_MS),
        );
        e
    }

    /// Watches the link for a peer-initiated drop. Runs the same clearing
    /// path as `disconnect`, so downstream consumers cannot tell the two
    /// apart.
    fn spawn_disconnect_watcher(&self, link: Arc<dyn Link>, epoch: u64) {
        let shared = self.shared.clone();
        let events = self.events.clone();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            link.closed().await;

            let identity = {
                let mut shared = shared.lock().await;
                if shared.epoch != epoch {
                    // A newer session (or a local disconnect) took over.
                    return;
                }
                Self::clear_locked(&mut shared)
            };

            if let Some(identity) = identity {
                info!("Peripheral {} closed the connection", identity.id);
                let _ = events.send(SessionEvent::Disconnected(identity.clone()));
                notifier.notify(
                    &format!("Disconnected from device {}", identity.label()),
                    Duration::from_millis(NOTIFICATION_DURATION_MS),
                );
            }
        });
    }

    /// Drops the link, descriptors and device, returning the session to
    /// `Idle`. Both the caller-driven and peer-driven paths end up here.
    fn clear_locked(shared: &mut Shared) -> Option<DeviceIdentity> {
        shared.epoch += 1;
        shared.connected = None;
        shared.state.services.clear();
        shared.state.status = ConnectionStatus::Idle;
        shared.state.device.take()
    }

    fn announce_disconnect(&self, identity: &DeviceIdentity) {
        let _ = self
            .events
            .send(SessionEvent::Disconnected(identity.clone()));
        self.notifier.notify(
            &format!("Disconnected from device {}", identity.label()),
            Duration::from_millis(NOTIFICATION_DURATION_MS),
        );
    }
}
