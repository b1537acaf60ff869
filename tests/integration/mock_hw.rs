//! Mock hardware for integration tests.
//!
//! Every mock shares one call log so tests can assert on the full,
//! interleaved history: pin levels, PWM duty, sensor reads, settle delays,
//! radio calls and armed deadlines.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use soilbeacon::adapters::hardware::HardwareAdapter;
use soilbeacon::app::events::AppEvent;
use soilbeacon::app::ports::{
    AnalogFrontend, ClimateReading, ClimateSensor, EventSink, RadioPort, TimerPort,
};
use soilbeacon::error::{ActuatorError, RadioError, SensorError};
use soilbeacon::sensors::SensorHub;
use soilbeacon::sensors::analog::{
    self, BatteryReading, LightReading, LightSensorKind, SoilReading,
};

// ── Call record ───────────────────────────────────────────────

pub const INDICATOR: &str = "indicator";
pub const DISCHARGE: &str = "discharge";
pub const LIGHT_SUPPLY: &str = "light-supply";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Pin { name: &'static str, high: bool },
    Duty(u16),
    Climate,
    Battery,
    Soil,
    Light,
    DelayMs(u32),
    SetPayload(Vec<u8>),
    RadioStart,
    RadioStop,
    Arm(u32),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Raw counts fed to the analog conversions.
pub const BATTERY_RAW: i16 = 1982;
pub const SOIL_RAW: i16 = 1500;
pub const LIGHT_RAW: i16 = 200;

pub const TEMPERATURE_C: f32 = 21.5;
pub const HUMIDITY: u16 = 32_768;

// ── GPIO ──────────────────────────────────────────────────────

pub struct MockPin {
    name: &'static str,
    log: CallLog,
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Call::Pin { name: self.name, high: false });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Call::Pin { name: self.name, high: true });
        Ok(())
    }
}

// ── PWM ───────────────────────────────────────────────────────

pub struct MockPwm {
    log: CallLog,
}

impl pwm::ErrorType for MockPwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        100
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Call::Duty(duty));
        Ok(())
    }
}

// ── Delay ─────────────────────────────────────────────────────

pub struct MockDelay {
    log: CallLog,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Call::DelayMs(ms));
    }
}

// ── Sensors ───────────────────────────────────────────────────

pub struct MockClimate {
    log: CallLog,
    fail: bool,
}

impl ClimateSensor for MockClimate {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        self.log.borrow_mut().push(Call::Climate);
        if self.fail {
            return Err(SensorError::Unresponsive);
        }
        Ok(ClimateReading {
            temperature_c: TEMPERATURE_C,
            humidity: HUMIDITY,
        })
    }
}

pub struct MockAnalog {
    log: CallLog,
    light: Option<LightSensorKind>,
    fail_light: bool,
}

impl AnalogFrontend for MockAnalog {
    fn read_battery(&mut self) -> Result<BatteryReading, SensorError> {
        self.log.borrow_mut().push(Call::Battery);
        Ok(analog::battery_from_raw(BATTERY_RAW))
    }

    fn read_soil(&mut self, reference_v: f32) -> Result<SoilReading, SensorError> {
        self.log.borrow_mut().push(Call::Soil);
        Ok(analog::soil_from_raw(SOIL_RAW, reference_v))
    }

    fn read_light(&mut self, reference_v: f32) -> Result<LightReading, SensorError> {
        self.log.borrow_mut().push(Call::Light);
        match self.light {
            Some(kind) if !self.fail_light => Ok(analog::light_from_raw(LIGHT_RAW, reference_v, kind)),
            _ => Err(SensorError::AdcReadFailed),
        }
    }
}

// ── Radio and timer ───────────────────────────────────────────

pub struct MockRadio {
    log: CallLog,
    fail_start: bool,
}

impl RadioPort for MockRadio {
    fn set_payload(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log.borrow_mut().push(Call::SetPayload(payload.to_vec()));
        Ok(())
    }

    fn start(&mut self) -> Result<(), RadioError> {
        self.log.borrow_mut().push(Call::RadioStart);
        if self.fail_start {
            return Err(RadioError::StartFailed);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RadioError> {
        self.log.borrow_mut().push(Call::RadioStop);
        Ok(())
    }
}

pub struct MockTimer {
    log: CallLog,
}

impl TimerPort for MockTimer {
    fn arm(&mut self, secs: u32) -> Result<(), ActuatorError> {
        self.log.borrow_mut().push(Call::Arm(secs));
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type MockHub = SensorHub<MockClimate, MockAnalog, MockPwm, MockPin, MockPin, MockDelay>;
pub type MockHardware = HardwareAdapter<MockHub, MockRadio, MockTimer, MockPin>;

/// Knobs for one test rig.
#[derive(Debug, Clone, Copy, Default)]
pub struct RigOptions {
    pub light: Option<LightSensorKind>,
    pub climate_fails: bool,
    pub light_fails: bool,
    pub radio_start_fails: bool,
}

fn pin(name: &'static str, log: &CallLog) -> MockPin {
    MockPin { name, log: Rc::clone(log) }
}

/// Build a sensor hub on mocks sharing `log`.
pub fn hub(opts: RigOptions, log: &CallLog) -> MockHub {
    SensorHub::new(
        MockClimate { log: Rc::clone(log), fail: opts.climate_fails },
        MockAnalog {
            log: Rc::clone(log),
            light: opts.light,
            fail_light: opts.light_fails,
        },
        MockPwm { log: Rc::clone(log) },
        pin(DISCHARGE, log),
        opts.light.map(|_| pin(LIGHT_SUPPLY, log)),
        MockDelay { log: Rc::clone(log) },
    )
}

/// Indicator LED pin on `log`.
pub fn indicator(log: &CallLog) -> MockPin {
    pin(INDICATOR, log)
}

/// Build the full hardware adapter on mocks. Returns the shared log.
pub fn hardware(opts: RigOptions) -> (MockHardware, CallLog) {
    let log: CallLog = Rc::default();
    let hw = HardwareAdapter::new(
        hub(opts, &log),
        MockRadio { log: Rc::clone(&log), fail_start: opts.radio_start_fails },
        MockTimer { log: Rc::clone(&log) },
        indicator(&log),
    );
    (hw, log)
}

// ── Log queries ───────────────────────────────────────────────

/// Level the named pin was last driven to (`false` if never driven).
pub fn pin_high(log: &CallLog, name: &str) -> bool {
    log.borrow()
        .iter()
        .rev()
        .find_map(|c| match c {
            Call::Pin { name: n, high } if *n == name => Some(*high),
            _ => None,
        })
        .unwrap_or(false)
}

/// Last PWM duty written (0 if never written).
pub fn last_duty(log: &CallLog) -> u16 {
    log.borrow()
        .iter()
        .rev()
        .find_map(|c| match c {
            Call::Duty(d) => Some(*d),
            _ => None,
        })
        .unwrap_or(0)
}

pub fn armed(log: &CallLog) -> Vec<u32> {
    log.borrow()
        .iter()
        .filter_map(|c| match c {
            Call::Arm(s) => Some(*s),
            _ => None,
        })
        .collect()
}

pub fn payloads(log: &CallLog) -> Vec<Vec<u8>> {
    log.borrow()
        .iter()
        .filter_map(|c| match c {
            Call::SetPayload(p) => Some(p.clone()),
            _ => None,
        })
        .collect()
}

/// Every switched rail is off: discharge, light supply, excitation, indicator.
pub fn all_rails_off(log: &CallLog) -> bool {
    !pin_high(log, DISCHARGE)
        && !pin_high(log, LIGHT_SUPPLY)
        && !pin_high(log, INDICATOR)
        && last_duty(log) == 0
}
