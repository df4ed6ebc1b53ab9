//! Connection lifecycle: the link FSM plus its context behind one call.

use super::context::{LinkActions, LinkContext};
use super::{Fsm, StateId, states};
use crate::config::SystemConfig;
use crate::events::LinkEvent;

pub struct ConnectionLifecycle {
    fsm: Fsm,
    ctx: LinkContext,
    transitions: u32,
}

impl ConnectionLifecycle {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            fsm: Fsm::new(states::build_state_table(), StateId::Disconnected),
            ctx: LinkContext::new(config),
            transitions: 0,
        }
    }

    /// Enter the initial state.  Returns the actions it requests
    /// (advertising).
    pub fn start(&mut self) -> LinkActions {
        self.fsm.start(&mut self.ctx);
        self.ctx.actions.take()
    }

    /// Handle one link event and return what the main loop must do.
    pub fn on_event(&mut self, event: LinkEvent) -> LinkActions {
        self.ctx.begin(event);
        if self.fsm.tick(&mut self.ctx) {
            self.transitions = self.transitions.wrapping_add(1);
        }
        self.ctx.actions.take()
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == StateId::Connected
    }

    pub fn last_connect_ms(&self) -> Option<u64> {
        self.ctx.last_connect_ms
    }

    /// State changes since construction.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }
}
