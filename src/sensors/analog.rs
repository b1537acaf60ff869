//! Analog front end: battery, soil sensor and light sensor on ADC1.
//!
//! The conversions are plain functions so they can be checked on the host.
//! Soil and light readings are ratiometric: they take the battery voltage
//! measured in the same wake cycle as their reference.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 through the oneshot API (initialised by hw_init).
//! On host/test: reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use log::{debug, warn};

use crate::app::ports::AnalogFrontend;
use crate::error::SensorError;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(not(target_os = "espidf"))]
static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(1982); // ≈3.0 V
#[cfg(not(target_os = "espidf"))]
static SIM_SOIL_ADC: AtomicU16 = AtomicU16::new(1000);
#[cfg(not(target_os = "espidf"))]
static SIM_LIGHT_ADC: AtomicU16 = AtomicU16::new(100);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_soil_adc(raw: u16) {
    SIM_SOIL_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_light_adc(raw: u16) {
    SIM_LIGHT_ADC.store(raw, Ordering::Relaxed);
}

const ADC_MAX: f32 = 4095.0;
/// Full-scale input at 12 dB attenuation.
const ADC_FULL_SCALE_V: f32 = 3.1;
/// Battery sense divider ratio (1:1 → ×2).
const BATTERY_DIVIDER: f32 = 2.0;

/// Resolution of the relative soil scale (0 = dry, 1023 = wet).
pub const SOIL_RELATIVE_SCALE: f32 = 1024.0;

/// Phototransistor load resistor (Ω).
const PHOTO_LOAD_OHMS: f32 = 470.0;
/// Phototransistor collector current in full sun (A at 100 klx).
const PHOTO_FULL_SUN_A: f32 = 3.59e-3;
const FULL_SUN_LUX: f32 = 100_000.0;

/// LDR series resistor (Ω).
const LDR_SERIES_OHMS: f32 = 10_000.0;

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Which light sensor the board revision carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightSensorKind {
    /// Light-dependent resistor (board v1.1).
    Ldr,
    /// Phototransistor (board v1.2).
    Phototransistor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    pub raw: i16,
    pub voltage: f32,
    pub millivolts: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilReading {
    pub raw: i16,
    /// 0 (dry) ..= 1023 (wet).
    pub relative: u16,
    pub percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightReading {
    pub raw: i16,
    pub voltage: f32,
    pub lux: u16,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn raw_to_volts(raw: i16) -> f32 {
    f32::from(raw.max(0)) / ADC_MAX * ADC_FULL_SCALE_V
}

pub fn battery_from_raw(raw: i16) -> BatteryReading {
    let voltage = raw_to_volts(raw) * BATTERY_DIVIDER;
    BatteryReading {
        raw,
        voltage,
        millivolts: (voltage * 1000.0) as u16,
    }
}

/// Sensor output counts when the soil is bone dry, for a given supply.
fn dry_counts(v: f32) -> f32 {
    -12.9 * v * v + 111.0 * v + 228.0
}

/// Sensor output counts when the sensor sits in water, for a given supply.
fn wet_counts(v: f32) -> f32 {
    -5.71 * v * v + 60.4 * v + 55.9
}

pub fn soil_from_raw(raw: i16, battery_v: f32) -> SoilReading {
    let counts = if battery_v > 0.0 {
        raw_to_volts(raw) / battery_v * SOIL_RELATIVE_SCALE
    } else {
        0.0
    };
    let dry = dry_counts(battery_v);
    let wet = wet_counts(battery_v);
    let span = wet - dry;
    let fraction = if span.abs() > f32::EPSILON {
        ((counts - dry) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    SoilReading {
        raw,
        relative: ((fraction * SOIL_RELATIVE_SCALE) as u16).min(1023),
        percent: fraction * 100.0,
    }
}

pub fn light_from_raw(raw: i16, battery_v: f32, kind: LightSensorKind) -> LightReading {
    let voltage = raw_to_volts(raw);
    let lux = match kind {
        LightSensorKind::Phototransistor => {
            let current = voltage / PHOTO_LOAD_OHMS;
            current / PHOTO_FULL_SUN_A * FULL_SUN_LUX
        }
        LightSensorKind::Ldr => {
            if voltage <= 0.0 || voltage >= battery_v {
                // Open / shorted divider: no meaningful reading.
                0.0
            } else {
                let r_ldr = LDR_SERIES_OHMS * (battery_v - voltage) / voltage;
                255.84 * (r_ldr / 1000.0).powf(-10.0 / 9.0)
            }
        }
    };
    LightReading {
        raw,
        voltage,
        lux: lux.clamp(0.0, f32::from(u16::MAX)) as u16,
    }
}

// ---------------------------------------------------------------------------
// ADC front end
// ---------------------------------------------------------------------------

/// The board's analog inputs behind [`AnalogFrontend`].
pub struct AdcFrontend {
    light: Option<LightSensorKind>,
}

impl AdcFrontend {
    pub fn new(light: Option<LightSensorKind>) -> Self {
        Self { light }
    }

    #[cfg(target_os = "espidf")]
    fn sample(&self, channel: u32) -> Result<i16, SensorError> {
        hw_init::adc1_read(channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn sample(&self, channel: Channel) -> Result<i16, SensorError> {
        let cell = match channel {
            Channel::Battery => &SIM_BATTERY_ADC,
            Channel::Soil => &SIM_SOIL_ADC,
            Channel::Light => &SIM_LIGHT_ADC,
        };
        Ok(cell.load(Ordering::Relaxed).min(4095) as i16)
    }
}

#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Copy)]
enum Channel {
    Battery,
    Soil,
    Light,
}

#[cfg(target_os = "espidf")]
const CH_BATTERY: u32 = pins::ADC1_CH_BATTERY;
#[cfg(target_os = "espidf")]
const CH_SOIL: u32 = pins::ADC1_CH_SOIL;
#[cfg(target_os = "espidf")]
const CH_LIGHT: u32 = pins::ADC1_CH_LIGHT;
#[cfg(not(target_os = "espidf"))]
const CH_BATTERY: Channel = Channel::Battery;
#[cfg(not(target_os = "espidf"))]
const CH_SOIL: Channel = Channel::Soil;
#[cfg(not(target_os = "espidf"))]
const CH_LIGHT: Channel = Channel::Light;

impl AnalogFrontend for AdcFrontend {
    fn read_battery(&mut self) -> Result<BatteryReading, SensorError> {
        let reading = battery_from_raw(self.sample(CH_BATTERY)?);
        debug!("ADC: battery raw={} {}mV", reading.raw, reading.millivolts);
        Ok(reading)
    }

    fn read_soil(&mut self, reference_v: f32) -> Result<SoilReading, SensorError> {
        let reading = soil_from_raw(self.sample(CH_SOIL)?, reference_v);
        debug!(
            "ADC: soil raw={} rel={} ({:.1}%)",
            reading.raw, reading.relative, reading.percent
        );
        Ok(reading)
    }

    fn read_light(&mut self, reference_v: f32) -> Result<LightReading, SensorError> {
        let Some(kind) = self.light else {
            warn!("ADC: light read requested on a board without a light sensor");
            return Err(SensorError::AdcReadFailed);
        };
        let reading = light_from_raw(self.sample(CH_LIGHT)?, reference_v, kind);
        debug!("ADC: light raw={} {}lx", reading.raw, reading.lux);
        Ok(reading)
    }
}
