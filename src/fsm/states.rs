//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!                    connect (debounced)
//!   DISCONNECTED ─────────────────────────▶ CONNECTED ──┐
//!     ▲  │  on_enter: restart advertising      │  ▲     │ connect (debounced):
//!     │  │                                     │  └─────┘ refresh timestamp
//!     │  └─ disconnect: reset + advertise      │
//!     └────────────── disconnect ──────────────┘
//!                     on_exit: reset buffer
//! ```
//!
//! A connect that arrives inside the debounce window is consumed silently
//! in either state.

use super::context::LinkContext;
use super::{StateDescriptor, StateId};
use crate::events::LinkEvent;
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Disconnected
        StateDescriptor {
            id: StateId::Disconnected,
            name: "Disconnected",
            on_enter: Some(disconnected_enter),
            on_exit: None,
            on_update: disconnected_update,
        },
        // Index 1: Connected
        StateDescriptor {
            id: StateId::Connected,
            name: "Connected",
            on_enter: None,
            on_exit: Some(connected_exit),
            on_update: connected_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared handlers
// ═══════════════════════════════════════════════════════════════════════════

/// Debounced connect.  Returns `true` if the connect was accepted.
fn accept_connect(ctx: &mut LinkContext) -> bool {
    if !ctx.connect_allowed() {
        return false;
    }
    ctx.last_connect_ms = Some(ctx.now_ms);
    info!("peer connected");
    true
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCONNECTED state
// ═══════════════════════════════════════════════════════════════════════════

fn disconnected_enter(ctx: &mut LinkContext) {
    ctx.actions.restart_advertising = true;
    info!("DISCONNECTED: advertising");
}

fn disconnected_update(ctx: &mut LinkContext) -> Option<StateId> {
    match ctx.pending.take()? {
        LinkEvent::Connected { .. } => accept_connect(ctx).then_some(StateId::Connected),
        LinkEvent::Disconnected { .. } => {
            // No transition, so neither on_exit nor on_enter runs.
            ctx.actions.reset_buffer = true;
            ctx.actions.restart_advertising = true;
            info!("peer disconnected");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTED state
// ═══════════════════════════════════════════════════════════════════════════

fn connected_exit(ctx: &mut LinkContext) {
    ctx.actions.reset_buffer = true;
}

fn connected_update(ctx: &mut LinkContext) -> Option<StateId> {
    match ctx.pending.take()? {
        LinkEvent::Connected { .. } => {
            accept_connect(ctx);
            None
        }
        LinkEvent::Disconnected { .. } => {
            info!("peer disconnected");
            Some(StateId::Disconnected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;

    #[test]
    fn table_rows_match_ids() {
        for (i, row) in build_state_table().iter().enumerate() {
            assert_eq!(row.id as usize, i);
        }
    }

    #[test]
    fn update_without_event_stays() {
        let mut ctx = LinkContext::new(&SystemConfig::default());
        assert_eq!(disconnected_update(&mut ctx), None);
        assert_eq!(connected_update(&mut ctx), None);
        assert!(ctx.actions.is_empty());
    }

    #[test]
    fn debounced_connect_in_connected_keeps_timestamp() {
        let mut ctx = LinkContext::new(&SystemConfig::default());
        ctx.last_connect_ms = Some(1_000);
        ctx.begin(LinkEvent::Connected { at_ms: 1_500 });
        assert_eq!(connected_update(&mut ctx), None);
        assert_eq!(ctx.last_connect_ms, Some(1_000));
        assert!(ctx.pending.is_none());
    }

    #[test]
    fn accepted_connect_in_connected_refreshes_timestamp() {
        let mut ctx = LinkContext::new(&SystemConfig::default());
        ctx.last_connect_ms = Some(1_000);
        ctx.begin(LinkEvent::Connected { at_ms: 2_500 });
        assert_eq!(connected_update(&mut ctx), None);
        assert_eq!(ctx.last_connect_ms, Some(2_500));
    }
}
