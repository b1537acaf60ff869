//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: configuration, the wrap-around run counter, and the commands
//! the node service carries out after each tick. Think of it as the
//! "blackboard" in a blackboard architecture.

use crate::config::NodeConfig;

// ---------------------------------------------------------------------------
// Cycle commands (written by state handlers; consumed by the node service)
// ---------------------------------------------------------------------------

/// What to do with the advertiser after this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioCommand {
    /// Leave it as it is.
    Hold,
    /// Load the fresh payload and start advertising.
    Start,
    /// Stop advertising.
    Stop,
}

/// Commands that state handlers write to request side effects.
/// Applied in a fixed order: measure → radio → arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleCommands {
    /// Run the acquisition sequencer and encode a new payload.
    pub measure: bool,
    pub radio: RadioCommand,
    /// Deadline for the next wake-up, in seconds from now.
    pub arm_secs: Option<u32>,
}

impl Default for CycleCommands {
    fn default() -> Self {
        Self {
            measure: false,
            radio: RadioCommand::Hold,
            arm_secs: None,
        }
    }
}

impl CycleCommands {
    /// Clear every request. Called before each tick.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    /// Stamped into every reading set; advanced after each broadcast.
    pub run_counter: u8,

    pub commands: CycleCommands,

    pub config: NodeConfig,
}

impl FsmContext {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            run_counter: 0,
            commands: CycleCommands::default(),
            config,
        }
    }

    /// Wrap-around increment (255 → 0).
    pub fn advance_run_counter(&mut self) {
        self.run_counter = self.run_counter.wrapping_add(1);
    }
}
