//! User-facing notification sink
//! The core announces connects, disconnects and errors through this trait but
//! never depends on the outcome; the UI layer decides how to present them.

use std::time::Duration;

use log::info;

/// Fire-and-forget user-visible message with a display duration.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, duration: Duration);
}

/// Default sink that routes messages to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, _duration: Duration) {
        info!("{}", message);
    }
}
