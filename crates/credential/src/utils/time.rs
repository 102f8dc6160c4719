//! Time utilities for credentials

use std::time::{SystemTime, UNIX_EPOCH};

/// Convert `SystemTime` to milliseconds since the Unix epoch
///
/// Times before the epoch clamp to `0`.
#[must_use]
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
