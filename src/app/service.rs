//! Node service — the hexagonal core.
//!
//! [`NodeService`] owns the FSM, the shared context and the device address.
//! It exposes two entry points: [`NodeService::start`] at boot and
//! [`NodeService::on_timer`] for every wake-timer event. All I/O flows
//! through port traits injected at call sites.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!   RadioPort ◀── │      NodeService       │
//!   TimerPort ◀── │  FSM · run counter     │
//! IndicatorPort ◀─└────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::NodeConfig;
use crate::error::Result;
use crate::fsm::context::{FsmContext, RadioCommand};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::identity::DeviceAddress;
use crate::payload;

use super::events::AppEvent;
use super::ports::{EventSink, IndicatorPort, RadioPort, SensorPort, TimerPort};

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

pub struct NodeService {
    fsm: Fsm,
    ctx: FsmContext,
    address: DeviceAddress,
}

impl NodeService {
    /// Construct the service. Does **not** touch hardware; call
    /// [`start`](Self::start) next.
    pub fn new(config: NodeConfig, address: DeviceAddress) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Sleeping),
            ctx: FsmContext::new(config),
            address,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot priming: schedule the sleep-interval timer, then run the
    /// Sleeping-state action once so the first broadcast does not wait a
    /// full interval.
    pub fn start<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Result<()>
    where
        H: SensorPort + RadioPort + TimerPort + IndicatorPort,
    {
        self.ctx.commands.reset();
        self.fsm.start(&mut self.ctx);
        if let Some(secs) = self.ctx.commands.arm_secs {
            hw.arm(secs)?;
        }

        sink.emit(&AppEvent::Started {
            state: self.fsm.current_state(),
            address: self.address,
        });
        info!(
            "NodeService started in {:?} as {}",
            self.fsm.current_state(),
            self.address
        );

        self.on_timer(hw, sink)
    }

    // ── Per-event orchestration ───────────────────────────────

    /// Handle one wake-timer event.
    ///
    /// The `hw` parameter satisfies every driven port at once; this avoids
    /// a double mutable borrow while keeping the port boundary explicit.
    /// The indicator is lit for the whole call and switched off on every
    /// exit path. Any `Err` is fatal for the node.
    pub fn on_timer<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Result<()>
    where
        H: SensorPort + RadioPort + TimerPort + IndicatorPort,
    {
        let blink = self.ctx.config.blink_indicator;
        if blink {
            hw.set_indicator(true)?;
        }

        let outcome = self.run_cycle(hw, sink);

        let dark = if blink { hw.set_indicator(false) } else { Ok(()) };

        if let Err(e) = outcome {
            warn!("NodeService: cycle failed: {}", e);
            sink.emit(&AppEvent::CycleFailed(e));
            return Err(e);
        }
        dark?;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Counter value the next reading set will carry.
    pub fn run_counter(&self) -> u8 {
        self.ctx.run_counter
    }

    /// Timer events handled since boot, including the priming call.
    pub fn wakeups(&self) -> u64 {
        self.fsm.tick_count()
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn config(&self) -> &NodeConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Tick the FSM, then carry out its commands in order:
    /// measure → encode → set payload → radio → arm → advance counter.
    fn run_cycle<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Result<()>
    where
        H: SensorPort + RadioPort + TimerPort,
    {
        let from = self.fsm.current_state();
        self.ctx.commands.reset();
        self.fsm.tick(&mut self.ctx);
        let to = self.fsm.current_state();
        let cmds = self.ctx.commands;

        let mut payload_len = None;
        if cmds.measure {
            let reading = hw.acquire(self.ctx.run_counter)?;
            sink.emit(&AppEvent::Measured(reading));

            let config = &self.ctx.config;
            let adv = payload::encode(&reading, config.protocol, &self.address, config.device_name)?;
            hw.set_payload(&adv)?;
            payload_len = Some(adv.len());
        }

        match cmds.radio {
            RadioCommand::Start => {
                hw.start()?;
                sink.emit(&AppEvent::Advertising {
                    len: payload_len.unwrap_or(0),
                    run_counter: self.ctx.run_counter,
                });
            }
            RadioCommand::Stop => hw.stop()?,
            RadioCommand::Hold => {}
        }

        if let Some(secs) = cmds.arm_secs {
            hw.arm(secs)?;
        }

        if cmds.measure {
            self.ctx.advance_run_counter();
        }

        if from != to {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
        Ok(())
    }
}
