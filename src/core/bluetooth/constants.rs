//! Constants used throughout the application
//! This module contains all the constant values used in the application,
//! such as UUIDs, timeouts, and other configuration values.

use uuid::Uuid;

/// The UUID of the pillow data service
pub const UUID_PILLOW_SERVICE: Uuid = Uuid::from_u128(0x98ecc0aa_88c5_40f7_aef7_b617d2084bad);

/// The UUID of the pillow data characteristic (read, text payload)
pub const UUID_PILLOW_DATA_CHAR: Uuid = Uuid::from_u128(0x2e710d43_a911_4346_afb4_7a03dc252e72);

/// Scan window duration in milliseconds
pub const DEFAULT_SCAN_DURATION_MS: u64 = 3500;

/// Poll cadence for reading the pillow data characteristic, in milliseconds
pub const POLL_INTERVAL_MS: u64 = 1000;

/// Interval at which an active link is checked for a peer-initiated drop, in milliseconds
pub const LINK_WATCH_INTERVAL_MS: u64 = 1000;

/// Display duration for user-facing notifications, in milliseconds
pub const NOTIFICATION_DURATION_MS: u64 = 1700;
