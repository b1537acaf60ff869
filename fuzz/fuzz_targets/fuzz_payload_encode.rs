//! Fuzz target: `payload::encode`
//!
//! Builds a reading set and a device name from arbitrary bytes and checks
//! that encoding never panics, never exceeds the advertising limit, and
//! fails exactly when the name is too long for the chosen protocol.
//!
//! cargo fuzz run fuzz_payload_encode

#![no_main]

use libfuzzer_sys::fuzz_target;
use soilbeacon::identity::DeviceAddress;
use soilbeacon::payload::{self, MAX_ADV_LEN, Protocol};
use soilbeacon::sensors::ReadingSet;

const HEADER: usize = 21;

fuzz_target!(|data: &[u8]| {
    if data.len() < HEADER {
        return;
    }
    let (head, name) = data.split_at(HEADER);
    let Ok(name) = core::str::from_utf8(name) else {
        return;
    };

    let u16_at = |i: usize| u16::from_be_bytes([head[i], head[i + 1]]);
    let protocol = if head[0] & 1 == 0 { Protocol::Custom } else { Protocol::BtHome };
    let has_light = head[0] & 2 != 0;

    let reading = ReadingSet {
        battery_mv: u16_at(1),
        battery_raw: u16_at(3) as i16,
        temperature_c: f32::from_be_bytes([head[5], head[6], head[7], head[8]]),
        humidity: u16_at(9),
        soil_moisture: u16_at(11),
        soil_percent: f32::from(head[13]),
        lux: has_light.then(|| u16_at(14)),
        run_counter: head[16],
    };
    let address = DeviceAddress::from_hardware_id([
        head[17], head[18], head[19], head[20], head[1], head[2],
    ]);

    let fits = name.len() <= payload::max_name_len(protocol, has_light);
    match payload::encode(&reading, protocol, &address, name) {
        Ok(out) => {
            assert!(fits, "accepted a name longer than the limit");
            assert!(out.len() <= MAX_ADV_LEN);
        }
        Err(_) => assert!(!fits, "rejected a name that fits"),
    }
});
