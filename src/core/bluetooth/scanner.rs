//! Scan coordination for the pillow companion
//! This module runs one bounded discovery window at a time, deduplicating
//! peripherals by identity and stopping automatically when the window closes.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::radio::Radio;
use crate::core::bluetooth::types::DiscoveredDevice;
use crate::error::SessionError;

/// Drives one bounded scan window at a time.
pub struct ScanCoordinator {
    radio: Arc<dyn Radio>,
    scanning: Arc<AtomicBool>,
    cancel_token: CancellationToken,
    scan_task_handle: Option<JoinHandle<()>>,
}

impl ScanCoordinator {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            radio,
            scanning: Arc::new(AtomicBool::new(false)),
            cancel_token: CancellationToken::new(),
            scan_task_handle: None,
        }
    }

    /// True while a scan window is open.
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Starts a discovery window of the given duration. Each newly seen
    /// identity is delivered once on the returned channel; the window closes
    /// on its own after `duration` and the scanning flag drops to false.
    ///
    /// Overlapping windows are rejected: callers must stop the running scan
    /// before starting another.
    pub async fn start_scan(
        &mut self,
        duration: Duration,
    ) -> Result<mpsc::UnboundedReceiver<DiscoveredDevice>, SessionError> {
        if self.is_scanning() {
            return Err(SessionError::ScanInProgress);
        }

        self.radio.initialize().await?;
        let mut discoveries = self.radio.scan().await?;

        self.cancel_token = CancellationToken::new();
        let cancel_token = self.cancel_token.clone();
        let scanning = self.scanning.clone();
        scanning.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let mut seen: HashSet<String> = HashSet::new();
            let window = tokio::time::sleep(duration);
            tokio::pin!(window);

            loop {
                tokio::select! {
                    found = discoveries.recv() => {
                        match found {
                            Some(found) => {
                                if seen.insert(found.identity.id.clone()) {
                                    debug!(
                                        "Found device - ID: {}, Name: {:?}, RSSI: {:?}",
                                        found.identity.id, found.identity.name, found.rssi
                                    );
                                    if tx.send(found).is_err() {
                                        break;
                                    }
                                }
                            }
                            None => {
                                info!("Discovery stream ended before the scan window closed.");
                                break;
                            }
                        }
                    }
                    _ = &mut window => {
                        info!("Scan window elapsed.");
                        break;
                    }
                    _ = cancel_token.cancelled() => {
                        break;
                    }
                }
            }

            scanning.store(false, Ordering::SeqCst);
        });

        self.scan_task_handle = Some(handle);
        info!("Device scan task started.");
        Ok(rx)
    }

    /// Stops the running scan window early. Idempotent.
    pub async fn stop_scan(&mut self) {
        info!("Stopping bluetooth scan.");
        self.cancel_token.cancel();

        if let Some(handle) = self.scan_task_handle.take() {
            match handle.await {
                Ok(()) => info!("Scan task finished after cancellation."),
                Err(e) if e.is_cancelled() => info!("Scan task was cancelled."),
                Err(e) => error!("Scan task finished with an unexpected join error: {:?}", e),
            }
        }

        self.scanning.store(false, Ordering::SeqCst);
    }
}
