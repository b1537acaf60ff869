//! BTHome v2 service data.
//!
//! A device-information byte followed by `(object id, value)` pairs in
//! ascending object-id order. Values are little-endian. Objects for sensors
//! the board does not carry are omitted, never zero-filled.

use crate::sensors::ReadingSet;

pub const SERVICE_UUID: u16 = 0xFCD2;

/// Version 2, unencrypted, regularly sent (no trigger bit).
pub const DEVICE_INFO: u8 = 0x40;

pub mod object_id {
    pub const PACKET_ID: u8 = 0x00;
    pub const TEMPERATURE: u8 = 0x02;
    pub const HUMIDITY: u8 = 0x03;
    pub const ILLUMINANCE: u8 = 0x05;
    pub const VOLTAGE: u8 = 0x0C;
    pub const MOISTURE: u8 = 0x14;
}

/// Upper bound on the encoded length.
pub const MAX_LEN: usize = encoded_len(true);

/// Exact encoded length for a board with or without a light sensor.
pub const fn encoded_len(has_light: bool) -> usize {
    // info + packet id (1+1) + temperature, humidity, voltage, moisture (4 × (1+2))
    let base = 1 + 2 + 4 * 3;
    if has_light { base + 4 } else { base }
}

/// Fixed-capacity encoded service data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceData {
    buf: [u8; MAX_LEN],
    len: usize,
}

impl ServiceData {
    fn new() -> Self {
        Self { buf: [0; MAX_LEN], len: 0 }
    }

    fn push(&mut self, bytes: &[u8]) {
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    fn object(&mut self, id: u8, value: &[u8]) {
        self.push(&[id]);
        self.push(value);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Encode the service data. Pure and infallible.
pub fn encode(reading: &ReadingSet) -> ServiceData {
    let mut out = ServiceData::new();
    out.push(&[DEVICE_INFO]);

    out.object(object_id::PACKET_ID, &[reading.run_counter]);

    let centi_c = (reading.temperature_c * 100.0) as i16;
    out.object(object_id::TEMPERATURE, &centi_c.to_le_bytes());

    // 0..=65535 full scale → 0.01 % units.
    let humidity = (u32::from(reading.humidity) * 10_000 / 65_535) as u16;
    out.object(object_id::HUMIDITY, &humidity.to_le_bytes());

    if let Some(lux) = reading.lux {
        let centi_lux = u32::from(lux) * 100;
        out.object(object_id::ILLUMINANCE, &centi_lux.to_le_bytes()[..3]);
    }

    out.object(object_id::VOLTAGE, &reading.battery_mv.to_le_bytes());

    // 0..1024 relative → 0.01 % units.
    let moisture = (u32::from(reading.soil_moisture) * 10_000 / 1024) as u16;
    out.object(object_id::MOISTURE, &moisture.to_le_bytes());

    out
}
