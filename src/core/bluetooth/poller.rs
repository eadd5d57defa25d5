//! Characteristic polling for the pillow companion
//! A single recurring task reads the pillow data characteristic at a fixed
//! cadence while a session is active and publishes the decoded text to the
//! received-value slot.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::core::bluetooth::codec;
use crate::core::bluetooth::constants::{
    POLL_INTERVAL_MS, UUID_PILLOW_DATA_CHAR, UUID_PILLOW_SERVICE,
};
use crate::core::bluetooth::session::SessionManager;
use crate::core::bluetooth::types::SessionEvent;
use crate::state::SlotWriter;

/// Recurring reader of the pillow data characteristic.
pub struct Poller {
    session: Arc<SessionManager>,
    slot: SlotWriter,
    service: Uuid,
    characteristic: Uuid,
    period: Duration,
}

impl Poller {
    /// Creates a poller targeting the pillow data characteristic at the
    /// default one-second cadence.
    pub fn new(session: Arc<SessionManager>, slot: SlotWriter) -> Self {
        Self {
            session,
            slot,
            service: UUID_PILLOW_SERVICE,
            characteristic: UUID_PILLOW_DATA_CHAR,
            period: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }

    /// Spawns the recurring task. It runs for the life of the process; ticks
    /// with no active session or no resolvable target characteristic are
    /// silent no-ops. Reads are awaited inline and missed ticks are skipped,
    /// so ticks never overlap and a slow peripheral cannot build a backlog.
    pub fn spawn(self) -> JoinHandle<()> {
        let events = self.session.events();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let Some(link) = self
                    .session
                    .poll_target(self.service, self.characteristic)
                    .await
                else {
                    continue;
                };

                match link
                    .read_characteristic(self.service, self.characteristic)
                    .await
                {
                    Ok(bytes) => {
                        let text = codec::decode(&bytes);
                        debug!("Received pillow data: {:?}", text);
                        self.slot.publish(text);
                    }
                    Err(e) => {
                        // Non-fatal: only the disconnect path changes
                        // session state.
                        warn!("Characteristic read failed: {}", e);
                        let _ = events.send(SessionEvent::ReadError(e.to_string()));
                    }
                }
            }
        })
    }
}
