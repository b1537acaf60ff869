//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub runs the power-sequenced acquisition once per wake cycle and
//! produces one immutable [`ReadingSet`]:
//!
//! ```text
//!  1. SHTC3 read (wake → measure → sleep)
//!  2. fast-discharge HIGH, excitation 50 %        ┐
//!  3. battery                                     │ sensor powered
//!  4. soil (battery as reference)                 │
//!  5. excitation off, fast-discharge LOW          ┘
//!  6. light supply HIGH, settle, light, LOW       (light boards only)
//!  7. assemble
//! ```

pub mod analog;
pub mod shtc3;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::app::ports::{AnalogFrontend, ClimateSensor, SensorPort};
use crate::error::Result;
use crate::power::{Energized, Excited};

/// Settle time between powering the light sensor and sampling it.
/// Empirical; shorter values read low.
pub const LIGHT_SETTLE_MS: u32 = 50;

/// One snapshot of every sensor, taken once per wake cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingSet {
    /// Battery voltage (mV).
    pub battery_mv: u16,
    /// Raw battery ADC count, kept for diagnostics.
    pub battery_raw: i16,
    /// Air temperature (°C).
    pub temperature_c: f32,
    /// Relative humidity scaled to 0..=65535.
    pub humidity: u16,
    /// Soil moisture, 0 (dry) ..= 1023 (wet).
    pub soil_moisture: u16,
    /// Soil moisture as a percentage.
    pub soil_percent: f32,
    /// Illuminance (lx). `None` on boards without a light sensor.
    pub lux: Option<u16>,
    /// Wrap-around cycle counter stamped by the state machine.
    pub run_counter: u8,
}

/// Owns every sensor-side peripheral and sequences their power rails.
pub struct SensorHub<C, A, X, D, L, W> {
    climate: C,
    analog: A,
    excitation: X,
    discharge: D,
    light_supply: Option<L>,
    delay: W,
}

impl<C, A, X, D, L, W> SensorHub<C, A, X, D, L, W>
where
    C: ClimateSensor,
    A: AnalogFrontend,
    X: SetDutyCycle,
    D: OutputPin,
    L: OutputPin,
    W: DelayNs,
{
    /// Construct the hub. Pass `light_supply: None` on boards without a
    /// light sensor; the light step is then skipped entirely.
    pub fn new(
        climate: C,
        analog: A,
        excitation: X,
        discharge: D,
        light_supply: Option<L>,
        delay: W,
    ) -> Self {
        Self {
            climate,
            analog,
            excitation,
            discharge,
            light_supply,
            delay,
        }
    }

    pub fn has_light_sensor(&self) -> bool {
        self.light_supply.is_some()
    }

    /// Run the full acquisition sequence.
    ///
    /// Any failure aborts the cycle; rails energised before the failure are
    /// released by their guards before this returns.
    pub fn acquire(&mut self, run_counter: u8) -> Result<ReadingSet> {
        let climate = self.climate.read()?;

        // Declaration order matters: excitation drops before discharge.
        let discharge = Energized::engage(&mut self.discharge, "fast-discharge")?;
        let excitation = Excited::start(&mut self.excitation)?;
        let battery = self.analog.read_battery()?;
        let soil = self.analog.read_soil(battery.voltage)?;
        excitation.release()?;
        discharge.release()?;

        let lux = match self.light_supply.as_mut() {
            Some(supply) => {
                let powered = Energized::engage(supply, "light-supply")?;
                self.delay.delay_ms(LIGHT_SETTLE_MS);
                let light = self.analog.read_light(battery.voltage)?;
                powered.release()?;
                Some(light.lux)
            }
            None => None,
        };

        let reading = ReadingSet {
            battery_mv: battery.millivolts,
            battery_raw: battery.raw,
            temperature_c: climate.temperature_c,
            humidity: climate.humidity,
            soil_moisture: soil.relative,
            soil_percent: soil.percent,
            lux,
            run_counter,
        };
        debug!("SENSORS: {:?}", reading);
        Ok(reading)
    }
}

impl<C, A, X, D, L, W> SensorPort for SensorHub<C, A, X, D, L, W>
where
    C: ClimateSensor,
    A: AnalogFrontend,
    X: SetDutyCycle,
    D: OutputPin,
    L: OutputPin,
    W: DelayNs,
{
    fn acquire(&mut self, run_counter: u8) -> Result<ReadingSet> {
        SensorHub::acquire(self, run_counter)
    }
}
