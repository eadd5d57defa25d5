//! Pillow companion core library
//! Maintains a live session with the smart pillow peripheral (scan, connect,
//! periodic characteristic read, disconnect recovery) and manages the local
//! audio file library with lazy playable-source resolution.

// Module declarations
pub mod core;
pub mod error;
pub mod notify;
pub mod state;
pub mod utils;

pub use error::{MediaError, SessionError};
pub use state::AppState;

// Initialize logging
pub fn setup_logging() {
    env_logger::init();
    log::info!("Logging initialized");
}
