//! Concrete state handler functions and table builder.
//!
//! Each state is a row of plain `fn` pointers; nothing is boxed.
//!
//! ```text
//!            timer: measure, advertise, arm window
//!   SLEEPING ─────────────────────────────────────▶ ADVERTISING
//!      ▲                                                 │
//!      └────────── timer: stop radio, arm sleep ─────────┘
//! ```
//!
//! Every timer event toggles the state; there is no terminal state.

use super::context::{FsmContext, RadioCommand};
use super::{StateDescriptor, StateId};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Sleeping
        StateDescriptor {
            id: StateId::Sleeping,
            name: "Sleeping",
            on_enter: Some(sleeping_enter),
            on_exit: None,
            on_update: sleeping_update,
        },
        // Index 1 — Advertising
        StateDescriptor {
            id: StateId::Advertising,
            name: "Advertising",
            on_enter: Some(advertising_enter),
            on_exit: Some(advertising_exit),
            on_update: advertising_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEPING state — radio off, waiting out the sleep interval
// ═══════════════════════════════════════════════════════════════════════════

fn sleeping_enter(ctx: &mut FsmContext) {
    ctx.commands.measure = false;
    ctx.commands.arm_secs = Some(ctx.config.sleep_interval_secs);
    info!("SLEEPING: next wake in {}s", ctx.config.sleep_interval_secs);
}

fn sleeping_update(_ctx: &mut FsmContext) -> Option<StateId> {
    Some(StateId::Advertising)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ADVERTISING state — broadcasting the latest reading set
// ═══════════════════════════════════════════════════════════════════════════

fn advertising_enter(ctx: &mut FsmContext) {
    ctx.commands.measure = true;
    ctx.commands.radio = RadioCommand::Start;
    ctx.commands.arm_secs = Some(ctx.config.advertising_window_secs);
    info!(
        "ADVERTISING: run {} for {}s",
        ctx.run_counter, ctx.config.advertising_window_secs
    );
}

fn advertising_exit(ctx: &mut FsmContext) {
    ctx.commands.radio = RadioCommand::Stop;
}

fn advertising_update(_ctx: &mut FsmContext) -> Option<StateId> {
    Some(StateId::Sleeping)
}
