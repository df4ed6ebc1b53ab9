//! Radio-to-loop event queue.
//!
//! The BLE stack reports connects and disconnects from its own callback
//! context.  Those callbacks never touch pipeline state; they post a
//! [`LinkEvent`] into a bounded `embassy-sync` channel and the main loop
//! drains it at the start of every tick.
//!
//! ```text
//! ┌──────────────┐  LinkEvent  ┌──────────────┐  on_event  ┌─────────────────────┐
//! │ GATT callback│────────────▶│ LINK_EVENTS  │───────────▶│ ConnectionLifecycle │
//! │ (BT task)    │  try_send   │ (bounded, 8) │  drain     │ (main loop)         │
//! └──────────────┘             └──────────────┘            └─────────────────────┘
//! ```
//!
//! A full queue drops the newest event with a warning.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

/// Channel depth.  Connects are debounced at 1 s, so eight slots cover far
/// more than one loop tick of radio churn.
pub const LINK_EVENT_DEPTH: usize = 8;

/// A peer connection change reported by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Connected { at_ms: u64 },
    Disconnected { at_ms: u64 },
}

impl LinkEvent {
    pub fn at_ms(&self) -> u64 {
        match *self {
            Self::Connected { at_ms } | Self::Disconnected { at_ms } => at_ms,
        }
    }
}

pub type LinkEventChannel = Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_DEPTH>;

/// Queue shared by the radio callbacks and the main loop.
pub static LINK_EVENTS: LinkEventChannel = Channel::new();

/// Post `event` without blocking.  Returns `false` if it was dropped.
///
/// Safe to call from the BLE callback task.
pub fn push_link_event(channel: &LinkEventChannel, event: LinkEvent) -> bool {
    match channel.try_send(event) {
        Ok(()) => true,
        Err(_) => {
            warn!("link event queue full, dropping {:?}", event);
            false
        }
    }
}

/// Hand every queued event to `handler`, oldest first.  Returns the count.
pub fn drain_link_events(channel: &LinkEventChannel, mut handler: impl FnMut(LinkEvent)) -> usize {
    let mut n = 0;
    while let Ok(event) = channel.try_receive() {
        handler(event);
        n += 1;
    }
    n
}
