//! Application state management
//! This module defines the process-wide shared state: the received-value slot
//! the poller writes into, and the `AppState` wiring that assembles the
//! bluetooth session and the media library.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use tokio::sync::{Mutex, watch};

use crate::core::bluetooth::poller::Poller;
use crate::core::bluetooth::radio::{BluestRadio, Radio};
use crate::core::bluetooth::scanner::ScanCoordinator;
use crate::core::bluetooth::session::SessionManager;
use crate::core::media::fs::DiskFileStore;
use crate::core::media::source::{is_native_host, resolver_for_host};
use crate::core::media::store::MediaStore;
use crate::notify::{LogNotifier, Notifier};

/// Creates the received-value slot: a writer handle for the poller and a
/// reader handle for everyone else.
pub fn received_value_slot() -> (SlotWriter, ReceivedValueSlot) {
    let (tx, rx) = watch::channel(String::new());
    (SlotWriter { tx }, ReceivedValueSlot { rx })
}

/// Write half of the received-value slot. Held only by the poller (and by
/// simulation code in tests); last write wins, no history is kept.
pub struct SlotWriter {
    tx: watch::Sender<String>,
}

impl SlotWriter {
    pub fn publish(&self, value: String) {
        // Send only fails when every reader is gone, which is harmless here.
        let _ = self.tx.send(value);
    }
}

/// Read half of the received-value slot. Cheap to clone; any number of
/// consumers may read the latest value or await changes.
#[derive(Clone)]
pub struct ReceivedValueSlot {
    rx: watch::Receiver<String>,
}

impl ReceivedValueSlot {
    /// The most recently decoded value.
    pub fn get(&self) -> String {
        self.rx.borrow().clone()
    }

    /// A receiver that can await value changes.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }
}

/// Global application state
pub struct AppState {
    /// The single process-wide session manager
    pub session: Arc<SessionManager>,
    /// The scan coordinator (one bounded window at a time)
    pub scanner: Mutex<ScanCoordinator>,
    /// The media library
    pub media: Arc<MediaStore>,
    /// Reader handle for the latest value polled from the peripheral
    pub received: ReceivedValueSlot,
}

impl AppState {
    /// Creates a new AppState instance: radio, session, scanner, media store
    /// with the host-appropriate source resolver, and the poller task.
    pub async fn new(media_root: impl Into<PathBuf>) -> Result<Self> {
        info!("Initializing bluetooth radio...");
        let radio: Arc<dyn Radio> = Arc::new(BluestRadio::new().await?);
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

        let session = Arc::new(SessionManager::new(radio.clone(), notifier));
        let scanner = Mutex::new(ScanCoordinator::new(radio));

        let store = Arc::new(DiskFileStore::new(media_root).await?);
        let resolver = resolver_for_host(is_native_host());
        let media = Arc::new(MediaStore::new(store, resolver));

        let (writer, received) = received_value_slot();
        Poller::new(session.clone(), writer).spawn();

        Ok(Self {
            session,
            scanner,
            media,
            received,
        })
    }
}
