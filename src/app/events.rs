//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.

use crate::error::Error;
use crate::fsm::StateId;
use crate::identity::DeviceAddress;
use crate::sensors::ReadingSet;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries initial state and the address in use).
    Started {
        state: StateId,
        address: DeviceAddress,
    },

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A fresh reading set was acquired.
    Measured(ReadingSet),

    /// A payload of `len` bytes is on air.
    Advertising { len: usize, run_counter: u8 },

    /// A wake cycle aborted. The node halts after this.
    CycleFailed(Error),
}
