//! Test doubles for the radio subsystem.
//! The mocks live behind the same `Radio`/`Link` traits production uses, so
//! the session, scanner and poller are exercised unmodified.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

use crate::core::bluetooth::constants::{UUID_PILLOW_DATA_CHAR, UUID_PILLOW_SERVICE};
use crate::core::bluetooth::radio::{Link, Radio};
use crate::core::bluetooth::types::{
    CharacteristicDescriptor, DeviceIdentity, DiscoveredDevice, ServiceDescriptor,
};
use crate::error::SessionError;

/// A descriptor list exposing the pillow data characteristic.
pub(crate) fn pillow_services() -> Vec<ServiceDescriptor> {
    vec![ServiceDescriptor {
        uuid: UUID_PILLOW_SERVICE,
        characteristics: vec![CharacteristicDescriptor {
            uuid: UUID_PILLOW_DATA_CHAR,
        }],
    }]
}

/// Scriptable radio double. Setters are plain methods on a shared handle so a
/// test can reconfigure it mid-flight.
pub(crate) struct MockRadio {
    radio_down: AtomicBool,
    connect_error: StdMutex<Option<String>>,
    disconnect_error: AtomicBool,
    services: StdMutex<Vec<ServiceDescriptor>>,
    scan_tx: StdMutex<Option<mpsc::UnboundedSender<DiscoveredDevice>>>,
    links: StdMutex<Vec<Arc<MockLink>>>,
    read_values: Arc<StdMutex<VecDeque<Vec<u8>>>>,
    read_error: Arc<AtomicBool>,
    read_delay: StdMutex<Duration>,
    read_count: Arc<AtomicUsize>,
    disconnect_count: Arc<AtomicUsize>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            radio_down: AtomicBool::new(false),
            connect_error: StdMutex::new(None),
            disconnect_error: AtomicBool::new(false),
            services: StdMutex::new(pillow_services()),
            scan_tx: StdMutex::new(None),
            links: StdMutex::new(Vec::new()),
            read_values: Arc::new(StdMutex::new(VecDeque::new())),
            read_error: Arc::new(AtomicBool::new(false)),
            read_delay: StdMutex::new(Duration::ZERO),
            read_count: Arc::new(AtomicUsize::new(0)),
            disconnect_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_radio_down(&self, down: bool) {
        self.radio_down.store(down, Ordering::SeqCst);
    }

    pub fn set_connect_error(&self, error: Option<String>) {
        *self.connect_error.lock().unwrap() = error;
    }

    pub fn set_disconnect_error(&self, fail: bool) {
        self.disconnect_error.store(fail, Ordering::SeqCst);
    }

    pub fn set_services(&self, services: Vec<ServiceDescriptor>) {
        *self.services.lock().unwrap() = services;
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = delay;
    }

    pub fn set_read_error(&self, fail: bool) {
        self.read_error.store(fail, Ordering::SeqCst);
    }

    /// Queues values returned by successive characteristic reads. Once the
    /// queue is empty, reads return the last queued value again.
    pub fn queue_read_values(&self, values: &[&str]) {
        let mut queue = self.read_values.lock().unwrap();
        for v in values {
            queue.push_back(v.as_bytes().to_vec());
        }
    }

    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_count.load(Ordering::SeqCst)
    }

    /// Emits one advertisement into the running scan, if any.
    pub fn advertise(&self, found: DiscoveredDevice) {
        if let Some(tx) = self.scan_tx.lock().unwrap().as_ref() {
            let _ = tx.send(found);
        }
    }

    /// Signals a peer-initiated drop on the most recent link.
    pub fn drop_peer(&self) {
        let links = self.links.lock().unwrap();
        if let Some(link) = links.last() {
            link.closed.notify_one();
        }
    }

    /// Signals a peer-initiated drop on the n-th link ever handed out.
    pub fn drop_peer_for_session(&self, index: usize) {
        let links = self.links.lock().unwrap();
        if let Some(link) = links.get(index) {
            link.closed.notify_one();
        }
    }
}

#[async_trait]
impl Radio for MockRadio {
    async fn initialize(&self) -> Result<(), SessionError> {
        if self.radio_down.load(Ordering::SeqCst) {
            return Err(SessionError::RadioUnavailable("radio is off".into()));
        }
        Ok(())
    }

    async fn scan(&self) -> Result<mpsc::UnboundedReceiver<DiscoveredDevice>, SessionError> {
        if self.radio_down.load(Ordering::SeqCst) {
            return Err(SessionError::RadioUnavailable("radio is off".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.scan_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn connect(&self, identity: &DeviceIdentity) -> Result<Arc<dyn Link>, SessionError> {
        if let Some(reason) = self.connect_error.lock().unwrap().clone() {
            return Err(SessionError::ConnectFailed {
                device: identity.id.clone(),
                reason,
            });
        }
        let link = Arc::new(MockLink {
            identity: identity.clone(),
            services: self.services.lock().unwrap().clone(),
            closed: Notify::new(),
            disconnect_error: self.disconnect_error.load(Ordering::SeqCst),
            read_values: self.read_values.clone(),
            read_error: self.read_error.clone(),
            read_delay: *self.read_delay.lock().unwrap(),
            read_count: self.read_count.clone(),
            disconnect_count: self.disconnect_count.clone(),
        });
        self.links.lock().unwrap().push(link.clone());
        Ok(link)
    }
}

pub(crate) struct MockLink {
    identity: DeviceIdentity,
    services: Vec<ServiceDescriptor>,
    closed: Notify,
    disconnect_error: bool,
    read_values: Arc<StdMutex<VecDeque<Vec<u8>>>>,
    read_error: Arc<AtomicBool>,
    read_delay: Duration,
    read_count: Arc<AtomicUsize>,
    disconnect_count: Arc<AtomicUsize>,
}

#[async_trait]
impl Link for MockLink {
    fn identity(&self) -> DeviceIdentity {
        self.identity.clone()
    }

    async fn services(&self) -> Result<Vec<ServiceDescriptor>, SessionError> {
        Ok(self.services.clone())
    }

    async fn read_characteristic(
        &self,
        _service: Uuid,
        _characteristic: Uuid,
    ) -> Result<Vec<u8>, SessionError> {
        // Counted at the start so overlap tests observe attempts, not
        // completions.
        self.read_count.fetch_add(1, Ordering::SeqCst);
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        if self.read_error.load(Ordering::SeqCst) {
            return Err(SessionError::ReadFailed("simulated read failure".into()));
        }
        let mut queue = self.read_values.lock().unwrap();
        match queue.len() {
            0 => Ok(b"0".to_vec()),
            1 => Ok(queue.front().cloned().unwrap_or_default()),
            _ => Ok(queue.pop_front().unwrap_or_default()),
        }
    }

    async fn closed(&self) {
        self.closed.notified().await;
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        self.disconnect_count.fetch_add(1, Ordering::SeqCst);
        if self.disconnect_error {
            return Err(SessionError::DisconnectFailed(
                "simulated teardown failure".into(),
            ));
        }
        Ok(())
    }
}
