//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the sensor side, the advertiser, the wake timer and the indicator
//! LED, exposing them through [`SensorPort`], [`RadioPort`], [`TimerPort`]
//! and [`IndicatorPort`] so the node service can take one `&mut` to all of
//! them. Generic over each part so host tests can drop in recording mocks.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{IndicatorPort, RadioPort, SensorPort, TimerPort};
use crate::error::{ActuatorError, RadioError, Result};
use crate::sensors::ReadingSet;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<S, R, T, I> {
    sensors: S,
    radio: R,
    timer: T,
    indicator: I,
}

impl<S, R, T, I> HardwareAdapter<S, R, T, I> {
    pub fn new(sensors: S, radio: R, timer: T, indicator: I) -> Self {
        Self {
            sensors,
            radio,
            timer,
            indicator,
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: SensorPort, R, T, I> SensorPort for HardwareAdapter<S, R, T, I> {
    fn acquire(&mut self, run_counter: u8) -> Result<ReadingSet> {
        self.sensors.acquire(run_counter)
    }
}

// ── RadioPort implementation ──────────────────────────────────

impl<S, R: RadioPort, T, I> RadioPort for HardwareAdapter<S, R, T, I> {
    fn set_payload(&mut self, payload: &[u8]) -> core::result::Result<(), RadioError> {
        self.radio.set_payload(payload)
    }

    fn start(&mut self) -> core::result::Result<(), RadioError> {
        self.radio.start()
    }

    fn stop(&mut self) -> core::result::Result<(), RadioError> {
        self.radio.stop()
    }
}

// ── TimerPort implementation ──────────────────────────────────

impl<S, R, T: TimerPort, I> TimerPort for HardwareAdapter<S, R, T, I> {
    fn arm(&mut self, secs: u32) -> core::result::Result<(), ActuatorError> {
        self.timer.arm(secs)
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<S, R, T, I: OutputPin> IndicatorPort for HardwareAdapter<S, R, T, I> {
    fn set_indicator(&mut self, on: bool) -> core::result::Result<(), ActuatorError> {
        let res = if on {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        };
        res.map_err(|_| ActuatorError::GpioWriteFailed)
    }
}
