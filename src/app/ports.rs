//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (sensors, radio, wake timer, indicator, event sinks)
//! implement these traits. The [`NodeService`](super::service::NodeService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! All port errors are typed; the service treats every one as fatal.

use crate::error::{ActuatorError, RadioError, Result, SensorError};
use crate::sensors::ReadingSet;
use crate::sensors::analog::{BatteryReading, LightReading, SoilReading};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per wake cycle.
pub trait SensorPort {
    /// Run the power-sequenced acquisition and stamp `run_counter` into it.
    fn acquire(&mut self, run_counter: u8) -> Result<ReadingSet>;
}

/// Output of a temperature/humidity sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    /// Relative humidity scaled to 0..=65535.
    pub humidity: u16,
}

/// Two-wire temperature/humidity sensor.
///
/// Blocking. Transient bus failures are retried inside the implementation;
/// `Err` means the sensor stayed unresponsive.
pub trait ClimateSensor {
    fn read(&mut self) -> core::result::Result<ClimateReading, SensorError>;
}

/// The board's analog inputs.
pub trait AnalogFrontend {
    fn read_battery(&mut self) -> core::result::Result<BatteryReading, SensorError>;

    /// Soil sensor, ratiometric against `reference_v` (the battery voltage).
    fn read_soil(&mut self, reference_v: f32) -> core::result::Result<SoilReading, SensorError>;

    /// Light sensor. Fails on boards that have none.
    fn read_light(&mut self, reference_v: f32) -> core::result::Result<LightReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain → BLE controller)
// ───────────────────────────────────────────────────────────────

/// Broadcast-only BLE advertiser.
pub trait RadioPort {
    /// Replace the raw advertising data (≤ 31 bytes).
    fn set_payload(&mut self, payload: &[u8]) -> core::result::Result<(), RadioError>;

    fn start(&mut self) -> core::result::Result<(), RadioError>;

    fn stop(&mut self) -> core::result::Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Timer and indicator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Single-shot wake timer. Each `arm` replaces the previous deadline.
pub trait TimerPort {
    fn arm(&mut self, secs: u32) -> core::result::Result<(), ActuatorError>;
}

/// Optional status LED lit for the duration of each wake cycle.
pub trait IndicatorPort {
    fn set_indicator(&mut self, on: bool) -> core::result::Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
