//! NodeService integration tests against recording mock hardware.

use super::mock_hw::*;

use soilbeacon::adapters::ble::BleAdvertiser;
use soilbeacon::adapters::hardware::HardwareAdapter;
use soilbeacon::adapters::log_sink::LogEventSink;
use soilbeacon::app::events::AppEvent;
use soilbeacon::app::service::NodeService;
use soilbeacon::config::NodeConfig;
use soilbeacon::drivers::hw_timer::WakeTimer;
use soilbeacon::error::{Error, RadioError, SensorError};
use soilbeacon::events::{self, Event};
use soilbeacon::fsm::StateId;
use soilbeacon::identity::DeviceAddress;
use soilbeacon::payload::{Protocol, bthome, custom};
use soilbeacon::sensors::ReadingSet;
use soilbeacon::sensors::analog::LightSensorKind;

const ADDRESS: DeviceAddress = DeviceAddress::new([0xF0, 0xCA, 0xF0, 0xCA, 0x01, 0x01]);
const NAME: &str = "pb";
/// Name AD (2 + 2) + service-data AD header (2) + UUID (2).
const SERVICE_DATA_START: usize = 8;

fn config(protocol: Protocol, light: Option<LightSensorKind>) -> NodeConfig {
    NodeConfig {
        protocol,
        device_name: NAME,
        advertising_window_secs: 2,
        sleep_interval_secs: 300,
        light_sensor: light,
        blink_indicator: true,
        ..NodeConfig::default()
    }
}

fn rig(opts: RigOptions) -> (NodeService, MockHardware, CallLog, RecordingSink) {
    let protocol = Protocol::Custom;
    let (hw, log) = hardware(opts);
    let svc = NodeService::new(config(protocol, opts.light), ADDRESS);
    (svc, hw, log, RecordingSink::default())
}

fn measured(sink: &RecordingSink) -> Vec<ReadingSet> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Measured(r) => Some(*r),
            _ => None,
        })
        .collect()
}

fn with_light() -> RigOptions {
    RigOptions {
        light: Some(LightSensorKind::Phototransistor),
        ..RigOptions::default()
    }
}

// ── Scenario C: boot priming and deadlines ────────────────────

#[test]
fn boot_primes_then_alternates_window_and_interval() {
    let (mut svc, mut hw, log, mut sink) = rig(with_light());

    svc.start(&mut hw, &mut sink).unwrap();
    assert_eq!(svc.state(), StateId::Advertising);
    assert_eq!(armed(&log), vec![300, 2]);

    for _ in 0..3 {
        svc.on_timer(&mut hw, &mut sink).unwrap();
    }

    assert_eq!(armed(&log), vec![300, 2, 300, 2, 300]);
    assert_eq!(svc.state(), StateId::Sleeping);
    assert_eq!(payloads(&log).len(), 2);
    assert_eq!(svc.run_counter(), 2);
    assert!(all_rails_off(&log));
}

#[test]
fn first_cycle_runs_in_power_sequenced_order() {
    let (mut svc, mut hw, log, mut sink) = rig(with_light());

    svc.start(&mut hw, &mut sink).unwrap();

    let payload = payloads(&log)[0].clone();
    let expected = vec![
        Call::Arm(300),
        Call::Pin { name: INDICATOR, high: true },
        Call::Climate,
        Call::Pin { name: DISCHARGE, high: true },
        Call::Duty(50),
        Call::Battery,
        Call::Soil,
        Call::Duty(0),
        Call::Pin { name: DISCHARGE, high: false },
        Call::Pin { name: LIGHT_SUPPLY, high: true },
        Call::DelayMs(50),
        Call::Light,
        Call::Pin { name: LIGHT_SUPPLY, high: false },
        Call::SetPayload(payload),
        Call::RadioStart,
        Call::Arm(2),
        Call::Pin { name: INDICATOR, high: false },
    ];
    assert_eq!(*log.borrow(), expected);
}

#[test]
fn advertising_to_sleeping_only_stops_radio() {
    let (mut svc, mut hw, log, mut sink) = rig(with_light());
    svc.start(&mut hw, &mut sink).unwrap();
    log.borrow_mut().clear();

    svc.on_timer(&mut hw, &mut sink).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            Call::Pin { name: INDICATOR, high: true },
            Call::RadioStop,
            Call::Arm(300),
            Call::Pin { name: INDICATOR, high: false },
        ]
    );
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::StateChanged { from: StateId::Advertising, to: StateId::Sleeping })
    ));
}

// ── Scenario A: custom layout ─────────────────────────────────

#[test]
fn custom_payload_places_every_field() {
    let (mut svc, mut hw, log, mut sink) = rig(with_light());
    svc.start(&mut hw, &mut sink).unwrap();
    svc.on_timer(&mut hw, &mut sink).unwrap();
    svc.on_timer(&mut hw, &mut sink).unwrap();

    let all = payloads(&log);
    let readings = measured(&sink);
    assert_eq!(all.len(), 2);

    for (payload, r) in all.iter().zip(&readings) {
        assert_eq!(&payload[..4], &[3, 0x09, b'p', b'b']);
        assert_eq!(&payload[4..8], &[21, 0x16, 0x1A, 0x18]);

        let sd = &payload[SERVICE_DATA_START..];
        assert_eq!(sd.len(), custom::SERVICE_DATA_LEN);
        assert_eq!(sd[custom::OFFSET_FLAGS], 0x21);
        assert_eq!(sd[custom::OFFSET_COUNTER], r.run_counter & 0x0F);
        assert_eq!(&sd[2..4], &r.battery_mv.to_be_bytes());
        assert_eq!(&sd[4..6], &2150i16.to_be_bytes());
        assert_eq!(&sd[6..8], &HUMIDITY.to_be_bytes());
        assert_eq!(&sd[8..10], &r.soil_moisture.to_be_bytes());
        assert_eq!(&sd[10..16], &ADDRESS.bytes());
        assert_eq!(&sd[16..18], &r.lux.unwrap().to_be_bytes());
    }
    assert_eq!(readings[0].run_counter, 0);
    assert_eq!(readings[1].run_counter, 1);
    assert_eq!(readings[0].battery_mv, 3000);
}

#[test]
fn board_without_light_never_touches_light_rail() {
    let (mut svc, mut hw, log, mut sink) = rig(RigOptions::default());
    svc.start(&mut hw, &mut sink).unwrap();

    assert!(!log.borrow().iter().any(|c| matches!(
        c,
        Call::Light | Call::Pin { name: LIGHT_SUPPLY, .. }
    )));
    let payload = &payloads(&log)[0];
    let sd = &payload[SERVICE_DATA_START..];
    assert_eq!(sd[custom::OFFSET_FLAGS], 0x20);
    assert_eq!(&sd[16..18], &[0, 0]);
    assert_eq!(measured(&sink)[0].lux, None);
}

// ── Scenario B: BTHome ────────────────────────────────────────

/// Object ids in order of appearance.
fn bthome_ids(sd: &[u8]) -> Vec<u8> {
    assert_eq!(sd[0], bthome::DEVICE_INFO);
    let mut ids = Vec::new();
    let mut i = 1;
    while i < sd.len() {
        let id = sd[i];
        let size = match id {
            bthome::object_id::PACKET_ID => 1,
            bthome::object_id::ILLUMINANCE => 3,
            _ => 2,
        };
        ids.push(id);
        i += 1 + size;
    }
    assert_eq!(i, sd.len(), "objects must tile the service data exactly");
    ids
}

fn bthome_rig(light: Option<LightSensorKind>) -> (NodeService, MockHardware, CallLog) {
    let (hw, log) = hardware(RigOptions { light, ..RigOptions::default() });
    let svc = NodeService::new(config(Protocol::BtHome, light), ADDRESS);
    (svc, hw, log)
}

#[test]
fn bthome_objects_ascend_and_cover_every_sensor() {
    let (mut svc, mut hw, log) = bthome_rig(Some(LightSensorKind::Ldr));
    svc.start(&mut hw, &mut RecordingSink::default()).unwrap();

    let payload = &payloads(&log)[0];
    assert_eq!(&payload[6..8], &[0xD2, 0xFC]);
    let sd = &payload[SERVICE_DATA_START..];
    assert_eq!(sd.len(), bthome::encoded_len(true));
    assert_eq!(bthome_ids(sd), vec![0x00, 0x02, 0x03, 0x05, 0x0C, 0x14]);
    assert_eq!(&sd[3..6], &[0x02, 0x66, 0x08], "21.50 °C little-endian");
}

#[test]
fn bthome_omits_illuminance_without_light_sensor() {
    let (mut svc, mut hw, log) = bthome_rig(None);
    svc.start(&mut hw, &mut RecordingSink::default()).unwrap();

    let sd = &payloads(&log)[0][SERVICE_DATA_START..];
    assert_eq!(sd.len(), bthome::encoded_len(false));
    assert_eq!(bthome_ids(sd), vec![0x00, 0x02, 0x03, 0x0C, 0x14]);
}

// ── Failure paths ─────────────────────────────────────────────

#[test]
fn climate_failure_aborts_before_any_rail() {
    let (mut svc, mut hw, log, mut sink) = rig(RigOptions {
        climate_fails: true,
        ..with_light()
    });

    let err = svc.start(&mut hw, &mut sink).unwrap_err();

    assert_eq!(err, Error::Sensor(SensorError::Unresponsive));
    assert!(!log.borrow().iter().any(|c| matches!(c, Call::Pin { name: DISCHARGE, .. })));
    assert!(!log.borrow().contains(&Call::RadioStart));
    assert!(all_rails_off(&log));
    assert_eq!(svc.run_counter(), 0);
    assert_eq!(sink.events.last(), Some(&AppEvent::CycleFailed(err)));
}

#[test]
fn light_failure_leaves_every_rail_off() {
    let (mut svc, mut hw, log, mut sink) = rig(RigOptions {
        light_fails: true,
        ..with_light()
    });

    let err = svc.start(&mut hw, &mut sink).unwrap_err();

    assert_eq!(err, Error::Sensor(SensorError::AdcReadFailed));
    assert!(all_rails_off(&log));
    assert!(payloads(&log).is_empty());
    assert!(!log.borrow().contains(&Call::RadioStart));
}

#[test]
fn radio_failure_is_fatal_and_indicator_goes_dark() {
    let (mut svc, mut hw, log, mut sink) = rig(RigOptions {
        radio_start_fails: true,
        ..with_light()
    });

    let err = svc.start(&mut hw, &mut sink).unwrap_err();

    assert_eq!(err, Error::Radio(RadioError::StartFailed));
    assert_eq!(armed(&log), vec![300], "window must not be armed");
    assert!(all_rails_off(&log));
    assert_eq!(svc.run_counter(), 0);
}

// ── Simulated adapters ────────────────────────────────────────

#[test]
fn sim_radio_and_timer_follow_the_cycle() {
    let opts = with_light();
    let log = CallLog::default();
    let config = config(Protocol::Custom, opts.light);
    let mut hw = HardwareAdapter::new(
        hub(opts, &log),
        BleAdvertiser::new(ADDRESS, &config),
        WakeTimer::new().unwrap(),
        indicator(&log),
    );
    let mut sink = LogEventSink::new();
    let mut svc = NodeService::new(config, ADDRESS);

    svc.start(&mut hw, &mut sink).unwrap();
    assert!(hw.radio().is_advertising());
    assert_eq!(hw.radio().payload().len(), SERVICE_DATA_START + custom::SERVICE_DATA_LEN);
    assert_eq!(hw.timer().history(), &[300, 2]);

    svc.on_timer(&mut hw, &mut sink).unwrap();
    assert!(!hw.radio().is_advertising());
    assert_eq!(hw.timer().history(), &[300, 2, 300]);
    assert!(hw.timer().remaining_us() > 299_000_000);
}

#[test]
fn queued_timer_events_drive_the_cycle() {
    let opts = RigOptions::default();
    let log = CallLog::default();
    let config = config(Protocol::BtHome, None);
    let mut hw = HardwareAdapter::new(
        hub(opts, &log),
        BleAdvertiser::new(ADDRESS, &config),
        WakeTimer::new().unwrap(),
        indicator(&log),
    );
    let mut sink = RecordingSink::default();
    let mut svc = NodeService::new(config, ADDRESS);
    svc.start(&mut hw, &mut sink).unwrap();

    let mut timer = WakeTimer::new().unwrap();
    for _ in 0..4 {
        assert!(timer.sim_fire());
        events::drain_events(|event| match event {
            Event::TimerFired => svc.on_timer(&mut hw, &mut sink).unwrap(),
        });
    }

    assert!(events::queue_is_empty());
    assert_eq!(svc.wakeups(), 5);
    assert_eq!(svc.state(), StateId::Advertising);
    assert_eq!(measured(&sink).len(), 3);
    assert_eq!(timer.remaining_us(), 0);
}
