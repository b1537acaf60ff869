//! SensorHub acquisition against recording mocks.

use super::mock_hw::*;

use soilbeacon::error::{Error, SensorError};
use soilbeacon::sensors::LIGHT_SETTLE_MS;
use soilbeacon::sensors::analog::LightSensorKind;

fn rails_touched(log: &CallLog) -> usize {
    log.borrow()
        .iter()
        .filter(|c| matches!(c, Call::Pin { .. } | Call::Duty(_)))
        .count()
}

#[test]
fn reading_set_carries_counter_and_every_field() {
    let log = CallLog::default();
    let mut hub = hub(
        RigOptions {
            light: Some(LightSensorKind::Phototransistor),
            ..RigOptions::default()
        },
        &log,
    );

    let r = hub.acquire(7).unwrap();

    assert_eq!(r.run_counter, 7);
    assert_eq!(r.temperature_c, TEMPERATURE_C);
    assert_eq!(r.humidity, HUMIDITY);
    assert_eq!(r.battery_raw, BATTERY_RAW);
    assert_eq!(r.battery_mv, 3000);
    assert!(r.soil_moisture <= 1023);
    assert!(r.lux.is_some());
    assert!(all_rails_off(&log));
}

#[test]
fn soil_read_happens_inside_the_powered_window() {
    let log = CallLog::default();
    let mut hub = hub(RigOptions::default(), &log);

    hub.acquire(0).unwrap();

    let calls = log.borrow();
    let pos = |needle: &Call| calls.iter().position(|c| c == needle).unwrap();
    let on = pos(&Call::Pin { name: DISCHARGE, high: true });
    let excite = pos(&Call::Duty(50));
    let soil = pos(&Call::Soil);
    let quiet = pos(&Call::Duty(0));
    let off = pos(&Call::Pin { name: DISCHARGE, high: false });
    assert!(on < excite && excite < soil && soil < quiet && quiet < off);
}

#[test]
fn light_settles_before_sampling() {
    let log = CallLog::default();
    let mut hub = hub(
        RigOptions {
            light: Some(LightSensorKind::Ldr),
            ..RigOptions::default()
        },
        &log,
    );

    hub.acquire(0).unwrap();

    let calls = log.borrow();
    let tail: Vec<_> = calls.iter().skip_while(|c| **c != Call::Pin { name: LIGHT_SUPPLY, high: true }).collect();
    assert_eq!(
        tail,
        vec![
            &Call::Pin { name: LIGHT_SUPPLY, high: true },
            &Call::DelayMs(LIGHT_SETTLE_MS),
            &Call::Light,
            &Call::Pin { name: LIGHT_SUPPLY, high: false },
        ]
    );
}

#[test]
fn climate_failure_touches_no_rail() {
    let log = CallLog::default();
    let mut hub = hub(
        RigOptions {
            climate_fails: true,
            light: Some(LightSensorKind::Phototransistor),
            ..RigOptions::default()
        },
        &log,
    );

    assert_eq!(hub.acquire(0), Err(Error::Sensor(SensorError::Unresponsive)));
    assert_eq!(rails_touched(&log), 0);
}

#[test]
fn light_failure_releases_the_light_rail() {
    let log = CallLog::default();
    let mut hub = hub(
        RigOptions {
            light_fails: true,
            light: Some(LightSensorKind::Phototransistor),
            ..RigOptions::default()
        },
        &log,
    );

    assert_eq!(hub.acquire(0), Err(Error::Sensor(SensorError::AdcReadFailed)));
    assert!(all_rails_off(&log));
    assert_eq!(
        log.borrow().last(),
        Some(&Call::Pin { name: LIGHT_SUPPLY, high: false })
    );
}
