//! Nullable clock: deterministic `votedAt` stamps for testing.

use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to, or by one second per stamp.
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    /// `initial_secs` counts from 2026-01-15T00:00:00Z.
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    pub fn now_secs(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    /// Issue an ISO-8601 timestamp for the current instant, then tick once.
    pub fn stamp(&self) -> String {
        let secs = self.current.fetch_add(1, Ordering::SeqCst);
        let (h, m, s) = ((secs / 3600) % 24, (secs / 60) % 60, secs % 60);
        format!("2026-01-15T{h:02}:{m:02}:{s:02}.000Z")
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(9 * 3600)
    }
}
