//! Shared mutable context threaded through every FSM handler.
//!
//! `LinkContext` is the single struct that state handlers read from and
//! write to: the event being processed, the reconnect-debounce bookkeeping
//! and the [`LinkActions`] the main loop must apply afterwards.

use crate::config::SystemConfig;
use crate::events::LinkEvent;

// ---------------------------------------------------------------------------
// Requested actions (written by state handlers; consumed by main loop)
// ---------------------------------------------------------------------------

/// Side effects the handlers ask for.  Flags only ever go from `false` to
/// `true` within one event, so requesting twice is harmless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkActions {
    /// Clear the PPG sample window and the latest vital reading.
    pub reset_buffer: bool,
    /// (Re)start BLE advertising.
    pub restart_advertising: bool,
}

impl LinkActions {
    pub fn is_empty(&self) -> bool {
        !self.reset_buffer && !self.restart_advertising
    }

    /// Return the pending actions and clear them.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

// ---------------------------------------------------------------------------
// LinkContext
// ---------------------------------------------------------------------------

pub struct LinkContext {
    // -- Timing --
    /// Timestamp of the event being handled.
    pub now_ms: u64,

    // -- Input --
    /// The event for this tick.  Handlers `take()` it.
    pub pending: Option<LinkEvent>,

    // -- Debounce --
    /// Timestamp of the last accepted connect, `None` before the first.
    pub last_connect_ms: Option<u64>,
    pub reconnect_debounce_ms: u64,

    // -- Output --
    pub actions: LinkActions,
}

impl LinkContext {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            now_ms: 0,
            pending: None,
            last_connect_ms: None,
            reconnect_debounce_ms: u64::from(config.reconnect_debounce_ms),
            actions: LinkActions::default(),
        }
    }

    /// Load `event` as the input of the next tick.
    pub fn begin(&mut self, event: LinkEvent) {
        self.now_ms = event.at_ms();
        self.pending = Some(event);
    }

    /// Whether a connect at `now_ms` clears the reconnect debounce window.
    pub fn connect_allowed(&self) -> bool {
        match self.last_connect_ms {
            None => true,
            Some(last) => self.now_ms.saturating_sub(last) >= self.reconnect_debounce_ms,
        }
    }
}
