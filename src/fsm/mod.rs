//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌─────────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ StateId     │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Sleeping    │ fn(ctx)   │ —        │ fn(ctx)->Option<> │  │
//! │  │ Advertising │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └─────────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One tick = one wake-timer event. The engine calls `on_update` for the
//! **current** state; if it returns `Some(next_id)` the engine runs
//! `on_exit` for the current state, then `on_enter` for the next, and
//! updates the current state. Handlers never touch hardware: they write
//! [`CycleCommands`](context::CycleCommands) into the shared
//! [`FsmContext`] and the node service carries them out.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ── States ────────────────────────────────────────────────────

/// The two states of the duty cycle. The discriminant is the row index in
/// the table returned by [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Radio off, waiting out the sleep interval.
    Sleeping = 0,
    /// Payload on air for the advertising window.
    Advertising = 1,
}

impl StateId {
    /// Row count of the state table.
    pub const COUNT: usize = 2;

    const fn row(self) -> usize {
        self as usize
    }
}

// ── Table rows ────────────────────────────────────────────────

/// Entry or exit action.
pub type Action = fn(&mut FsmContext);

/// Timer handler for a state. `Some(next)` requests a transition.
pub type Update = fn(&mut FsmContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<Action>,
    pub on_exit: Option<Action>,
    pub on_update: Update,
}

// ── Engine ────────────────────────────────────────────────────

pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    current: StateId,
    /// Timer events handled since boot.
    ticks: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial,
            ticks: 0,
        }
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id.row()]
    }

    /// Enter the initial state. Call once, before the first [`tick`](Self::tick).
    pub fn start(&mut self, ctx: &mut FsmContext) {
        let row = self.row(self.current);
        info!("FSM: initial state {}", row.name);
        if let Some(enter) = row.on_enter {
            enter(ctx);
        }
    }

    /// Dispatch one timer event to the current state.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.ticks += 1;

        if let Some(next) = (self.row(self.current).on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Exit actions run before entry actions.
    fn transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        let (from, to) = (self.row(self.current), self.row(next));
        info!("FSM: {} -> {}", from.name, to.name);

        if let Some(exit) = from.on_exit {
            exit(ctx);
        }
        if let Some(enter) = to.on_enter {
            enter(ctx);
        }
        self.current = next;
    }
}


#[cfg(test)]
mod proptests {
    use super::context::FsmContext;
    use super::*;
    use crate::config::NodeConfig;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parity_of_ticks_decides_state(ticks in 0usize..500) {
            let mut fsm = Fsm::new(states::build_state_table(), StateId::Sleeping);
            let mut ctx = FsmContext::new(NodeConfig::default());
            fsm.start(&mut ctx);

            for _ in 0..ticks {
                fsm.tick(&mut ctx);
                // Exactly one deadline is requested on every transition.
                prop_assert!(ctx.commands.arm_secs.is_some());
            }

            let expected = if ticks % 2 == 0 { StateId::Sleeping } else { StateId::Advertising };
            prop_assert_eq!(fsm.current_state(), expected);
        }
    }
}
