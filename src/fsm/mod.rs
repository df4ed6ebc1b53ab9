//! Link-state machine engine.
//!
//! Two rows, one per [`StateId`], each holding plain function pointers:
//!
//! ```text
//!  StateId        on_enter             on_exit        on_update
//!  Disconnected   restart advertising  -              debounced connect
//!  Connected      -                    reset buffer   disconnect
//! ```
//!
//! The engine is stepped once per link event by
//! [`ConnectionLifecycle`](lifecycle::ConnectionLifecycle).  `on_update`
//! looks at the event stored in [`LinkContext`] and names the next state;
//! naming the current one is a no-op, so hooks only run on a real change.
//! Hooks never touch the radio: they record [`LinkActions`](context::LinkActions)
//! that the main loop applies afterwards.

pub mod context;
pub mod lifecycle;
pub mod states;

use context::LinkContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Link states.  Order matches the rows of [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Disconnected = 0,
    Connected = 1,
}

impl StateId {
    /// Number of rows in the state table.
    pub const COUNT: usize = 2;

    const fn row(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` hook.  Runs once per transition.
pub type StateActionFn = fn(&mut LinkContext);

/// Event handler.  `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut LinkContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    current: StateId,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, row)| row.id.row() == i),
            "state table rows out of order"
        );
        Self {
            table,
            current: initial,
        }
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id.row()]
    }

    /// Run `on_enter` for the initial state.  Call once before `tick()`.
    pub fn start(&mut self, ctx: &mut LinkContext) {
        info!("FSM starting in state: {}", self.current_name());
        if let Some(enter) = self.row(self.current).on_enter {
            enter(ctx);
        }
    }

    /// Hand the pending event to the current state's `on_update` and apply
    /// any transition it asks for (`on_exit`, switch, `on_enter`).
    ///
    /// Returns `true` if the state changed.
    pub fn tick(&mut self, ctx: &mut LinkContext) -> bool {
        let Some(next) = (self.row(self.current).on_update)(ctx) else {
            return false;
        };
        if next == self.current {
            return false;
        }

        info!("FSM transition: {} -> {}", self.current_name(), self.row(next).name);
        if let Some(exit) = self.row(self.current).on_exit {
            exit(ctx);
        }
        self.current = next;
        if let Some(enter) = self.row(next).on_enter {
            enter(ctx);
        }
        true
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn current_name(&self) -> &'static str {
        self.row(self.current).name
    }
}

#[cfg(test)]
mod tests {
    use super::context::LinkContext;
    use super::*;
    use crate::config::SystemConfig;
    use crate::events::LinkEvent;

    fn make_ctx() -> LinkContext {
        LinkContext::new(&SystemConfig::default())
    }

    fn make_fsm() -> Fsm {
        Fsm::new(states::build_state_table(), StateId::Disconnected)
    }

    fn feed(fsm: &mut Fsm, ctx: &mut LinkContext, event: LinkEvent) -> bool {
        ctx.begin(event);
        fsm.tick(ctx)
    }

    #[test]
    fn starts_disconnected() {
        let fsm = make_fsm();
        assert_eq!(fsm.current_state(), StateId::Disconnected);
    }

    #[test]
    fn start_requests_advertising() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        assert!(ctx.actions.restart_advertising);
        assert!(!ctx.actions.reset_buffer);
    }

    #[test]
    fn connect_moves_to_connected() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        assert!(feed(&mut fsm, &mut ctx, LinkEvent::Connected { at_ms: 100 }));
        assert_eq!(fsm.current_state(), StateId::Connected);
        assert_eq!(ctx.last_connect_ms, Some(100));
    }

    #[test]
    fn disconnect_from_connected_resets_and_advertises() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        feed(&mut fsm, &mut ctx, LinkEvent::Connected { at_ms: 0 });
        assert!(feed(&mut fsm, &mut ctx, LinkEvent::Disconnected { at_ms: 50 }));
        assert_eq!(fsm.current_state(), StateId::Disconnected);
        assert!(ctx.actions.reset_buffer);
        assert!(ctx.actions.restart_advertising);
    }

    #[test]
    fn disconnect_while_disconnected_still_resets() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        assert!(!feed(&mut fsm, &mut ctx, LinkEvent::Disconnected { at_ms: 10 }));
        assert_eq!(fsm.current_state(), StateId::Disconnected);
        assert!(ctx.actions.reset_buffer);
        assert!(ctx.actions.restart_advertising);
    }

    #[test]
    fn connect_while_connected_is_not_a_transition() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        assert!(feed(&mut fsm, &mut ctx, LinkEvent::Connected { at_ms: 0 }));
        ctx.actions = Default::default();
        assert!(!feed(&mut fsm, &mut ctx, LinkEvent::Connected { at_ms: 2_000 }));
        assert_eq!(fsm.current_name(), "Connected");
        assert!(ctx.actions.is_empty());
    }
}
