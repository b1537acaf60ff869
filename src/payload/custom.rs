//! Custom binary service-data layout (protocol version 2).
//!
//! Filed under the Environmental Sensing service UUID. Multi-byte fields are
//! big-endian.
//!
//! | Offset | Size | Content                                              |
//! |--------|------|------------------------------------------------------|
//! | 0      | 1    | high nibble: version (2), bit 0: light data present  |
//! | 1      | 1    | run counter, low 4 bits                              |
//! | 2      | 2    | battery, mV                                          |
//! | 4      | 2    | temperature, centi-°C, signed                        |
//! | 6      | 2    | relative humidity, 0..=65535                         |
//! | 8      | 2    | soil moisture, 0..1024                               |
//! | 10     | 6    | device address, MSB first                            |
//! | 16     | 2    | lux (0 without a light sensor)                       |

use crate::identity::DeviceAddress;
use crate::sensors::ReadingSet;

pub const SERVICE_UUID: u16 = 0x181A;
pub const SERVICE_DATA_LEN: usize = 18;
pub const PROTOCOL_VERSION: u8 = 2;

/// Bit 0 of the flags byte.
pub const FLAG_HAS_LIGHT: u8 = 0x01;

pub const OFFSET_FLAGS: usize = 0;
pub const OFFSET_COUNTER: usize = 1;
pub const OFFSET_BATTERY: usize = 2;
pub const OFFSET_TEMPERATURE: usize = 4;
pub const OFFSET_HUMIDITY: usize = 6;
pub const OFFSET_SOIL: usize = 8;
pub const OFFSET_ADDRESS: usize = 10;
pub const OFFSET_LUX: usize = 16;

/// Encode the service data. Pure and infallible.
pub fn encode(reading: &ReadingSet, address: &DeviceAddress) -> [u8; SERVICE_DATA_LEN] {
    let mut buf = [0u8; SERVICE_DATA_LEN];

    let mut flags = PROTOCOL_VERSION << 4;
    if reading.lux.is_some() {
        flags |= FLAG_HAS_LIGHT;
    }
    buf[OFFSET_FLAGS] = flags;
    buf[OFFSET_COUNTER] = reading.run_counter & 0x0F;

    // `as` truncates toward zero and saturates at the i16 bounds.
    let centi_c = (reading.temperature_c * 100.0) as i16;

    put_be(&mut buf, OFFSET_BATTERY, &reading.battery_mv.to_be_bytes());
    put_be(&mut buf, OFFSET_TEMPERATURE, &centi_c.to_be_bytes());
    put_be(&mut buf, OFFSET_HUMIDITY, &reading.humidity.to_be_bytes());
    put_be(&mut buf, OFFSET_SOIL, &reading.soil_moisture.to_be_bytes());
    put_be(&mut buf, OFFSET_ADDRESS, &address.bytes());
    put_be(&mut buf, OFFSET_LUX, &reading.lux.unwrap_or(0).to_be_bytes());

    buf
}

fn put_be(buf: &mut [u8; SERVICE_DATA_LEN], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}
