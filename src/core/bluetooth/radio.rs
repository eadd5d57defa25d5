//! Radio subsystem abstraction for the pillow companion
//! This module defines the seams the session layer talks through (`Radio`,
//! `Link`) and the production implementation backed by the bluest library.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, Device};
use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::sync::{Mutex, mpsc, oneshot};
use uuid::Uuid;

use crate::core::bluetooth::constants::LINK_WATCH_INTERVAL_MS;
use crate::core::bluetooth::types::{
    CharacteristicDescriptor, DeviceIdentity, DiscoveredDevice, ServiceDescriptor,
};
use crate::error::SessionError;

/// One established connection to a peripheral.
#[async_trait]
pub trait Link: Send + Sync {
    /// Identity of the connected peripheral.
    fn identity(&self) -> DeviceIdentity;

    /// Discovers the peripheral's services and characteristics.
    async fn services(&self) -> Result<Vec<ServiceDescriptor>, SessionError>;

    /// Reads the current value of a characteristic.
    async fn read_characteristic(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Vec<u8>, SessionError>;

    /// Resolves once the peer drops the connection.
    async fn closed(&self);

    /// Tears the connection down. Best-effort; callers clear local state
    /// whether or not this succeeds.
    async fn disconnect(&self) -> Result<(), SessionError>;
}

/// The radio subsystem: discovery and connection establishment.
#[async_trait]
pub trait Radio: Send + Sync {
    /// Checks that the underlying radio is present and powered.
    async fn initialize(&self) -> Result<(), SessionError>;

    /// Starts discovery. Advertisements arrive on the returned channel until
    /// the receiver is dropped, which stops the underlying scan.
    async fn scan(&self) -> Result<mpsc::UnboundedReceiver<DiscoveredDevice>, SessionError>;

    /// Connects to a peripheral seen during the last scan.
    async fn connect(&self, identity: &DeviceIdentity) -> Result<Arc<dyn Link>, SessionError>;
}

/// Production radio backed by the platform bluetooth stack via bluest.
pub struct BluestRadio {
    adapter: Adapter,
    /// Map of device ids to bluest device handles, refilled by each scan
    devices: Arc<Mutex<HashMap<String, Device>>>,
}

impl BluestRadio {
    /// Creates a new BluestRadio from the default adapter.
    pub async fn new() -> Result<Self, SessionError> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| SessionError::RadioUnavailable("no bluetooth adapter found".into()))?;
        Ok(Self {
            adapter,
            devices: Arc::new(Mutex::new(HashMap::new())),
        })
    }
}

#[async_trait]
impl Radio for BluestRadio {
    async fn initialize(&self) -> Result<(), SessionError> {
        self.adapter
            .wait_available()
            .await
            .map_err(|e| SessionError::RadioUnavailable(e.to_string()))?;
        info!("Bluetooth adapter is available.");
        Ok(())
    }

    async fn scan(&self) -> Result<mpsc::UnboundedReceiver<DiscoveredDevice>, SessionError> {
        let adapter = self.adapter.clone();
        let devices = self.devices.clone();
        devices.lock().await.clear();

        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut scan_stream = match adapter.scan(&[]).await {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(SessionError::RadioUnavailable(e.to_string())));
                    return;
                }
            };

            while let Some(discovered) = scan_stream.next().await {
                let device = discovered.device;
                let rssi = discovered.rssi;
                let id = device.id().to_string();
                let name = device.name().ok();
                debug!("Found device - ID: {}, Name: {:?}, RSSI: {:?}", id, name, rssi);

                devices.lock().await.insert(id.clone(), device);

                let found = DiscoveredDevice {
                    identity: DeviceIdentity::new(id, name),
                    rssi,
                };
                if tx.send(found).is_err() {
                    // Receiver dropped: the scan window is over.
                    break;
                }
            }
            info!("Bluetooth scan stream ended.");
        });

        ready_rx
            .await
            .map_err(|_| SessionError::RadioUnavailable("scan task exited".into()))??;
        Ok(rx)
    }

    async fn connect(&self, identity: &DeviceIdentity) -> Result<Arc<dyn Link>, SessionError> {
        let device = {
            let devices = self.devices.lock().await;
            devices.get(&identity.id).cloned()
        }
        .ok_or_else(|| SessionError::ConnectFailed {
            device: identity.id.clone(),
            reason: "device not seen in the last scan".into(),
        })?;

        if !device.is_connected().await {
            info!("Initiating connection to {}...", identity.id);
            self.adapter
                .connect_device(&device)
                .await
                .map_err(|e| SessionError::ConnectFailed {
                    device: identity.id.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(Arc::new(BluestLink {
            adapter: self.adapter.clone(),
            device,
            identity: identity.clone(),
            characteristics: Mutex::new(HashMap::new()),
        }))
    }
}

/// A live bluest connection with the characteristic handles discovered on it.
struct BluestLink {
    adapter: Adapter,
    device: Device,
    identity: DeviceIdentity,
    /// Characteristic handles keyed by (service, characteristic), filled by `services`
    characteristics: Mutex<HashMap<(Uuid, Uuid), Characteristic>>,
}

#[async_trait]
impl Link for BluestLink {
    fn identity(&self) -> DeviceIdentity {
        self.identity.clone()
    }

    async fn services(&self) -> Result<Vec<ServiceDescriptor>, SessionError> {
        info!("Connection successful, discovering services...");
        let services =
            self.device
                .services()
                .await
                .map_err(|e| SessionError::ConnectFailed {
                    device: self.identity.id.clone(),
                    reason: format!("service discovery failed: {e}"),
                })?;

        let mut descriptors = Vec::with_capacity(services.len());
        let mut handles = self.characteristics.lock().await;
        handles.clear();

        for service in services {
            let characteristics =
                service
                    .characteristics()
                    .await
                    .map_err(|e| SessionError::ConnectFailed {
                        device: self.identity.id.clone(),
                        reason: format!("characteristic discovery failed: {e}"),
                    })?;

            let mut descriptor = ServiceDescriptor {
                uuid: service.uuid(),
                characteristics: Vec::with_capacity(characteristics.len()),
            };
            for characteristic in characteristics {
                let uuid = characteristic.uuid();
                handles.insert((descriptor.uuid, uuid), characteristic);
                descriptor
                    .characteristics
                    .push(CharacteristicDescriptor { uuid });
            }
            debug!(
                "Discovered service {} with {} characteristics",
                descriptor.uuid,
                descriptor.characteristics.len()
            );
            descriptors.push(descriptor);
        }

        Ok(descriptors)
    }

    async fn read_characteristic(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Vec<u8>, SessionError> {
        let handle = {
            let handles = self.characteristics.lock().await;
            handles.get(&(service, characteristic)).cloned()
        }
        .ok_or_else(|| {
            SessionError::ReadFailed(format!(
                "characteristic {characteristic} not discovered on service {service}"
            ))
        })?;

        handle
            .read()
            .await
            .map_err(|e| SessionError::ReadFailed(e.to_string()))
    }

    async fn closed(&self) {
        // bluest exposes no direct disconnect event on all platforms, so the
        // link is watched by polling the connection flag.
        loop {
            if !self.device.is_connected().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(LINK_WATCH_INTERVAL_MS)).await;
        }
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        if self.device.is_connected().await {
            info!("Disconnecting from device {}", self.identity.id);
            self.adapter
                .disconnect_device(&self.device)
                .await
                .map_err(|e| SessionError::DisconnectFailed(e.to_string()))?;
            info!("Successfully disconnected");
        } else {
            warn!("Device {} not connected", self.identity.id);
        }
        Ok(())
    }
}
