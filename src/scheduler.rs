//! Notification rate limiter.
//!
//! Decides, once per loop tick, whether a telemetry round is due:
//!
//! ```text
//!   peers == 0 ───────────────────────────────▶ not due
//!   never notified ───────────────────────────▶ due
//!   now − last ≥ notify_interval_ms ──────────▶ due
//!   otherwise ────────────────────────────────▶ not due
//! ```
//!
//! A due decision commits `last = now`.  The difference is saturating, so a
//! clock that steps backwards delays the next round instead of firing early.

use crate::config::SystemConfig;

#[derive(Debug, Clone)]
pub struct NotificationScheduler {
    interval_ms: u64,
    last_notify_ms: Option<u64>,
}

impl NotificationScheduler {
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_interval(u64::from(config.notify_interval_ms))
    }

    pub const fn with_interval(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_notify_ms: None,
        }
    }

    /// `true` if a notification round should be sent now.
    pub fn should_notify(&mut self, now_ms: u64, peers: usize) -> bool {
        if peers == 0 {
            return false;
        }
        let due = match self.last_notify_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if due {
            self.last_notify_ms = Some(now_ms);
        }
        due
    }

    pub fn last_notify_ms(&self) -> Option<u64> {
        self.last_notify_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
