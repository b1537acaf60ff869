//! Sensirion SHTC3 temperature / humidity sensor on I²C.
//!
//! One call to [`ClimateSensor::read`] runs the full power cycle: wake,
//! trigger a T-first normal-mode measurement, read the 6-byte frame, then
//! put the sensor back to sleep. A NACKed read or a bad CRC is treated as
//! transient and retried with a fixed backoff; exhausting the retry budget
//! surfaces [`SensorError::Unresponsive`].
//!
//! Generic over `embedded_hal::i2c::I2c` so host tests can script the bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, warn};

use crate::app::ports::{ClimateReading, ClimateSensor};
use crate::error::SensorError;

pub const ADDRESS: u8 = 0x70;

pub const CMD_WAKEUP: u16 = 0x3517;
pub const CMD_MEASURE_T_FIRST_NORMAL: u16 = 0x7866;
pub const CMD_SLEEP: u16 = 0xB098;

/// Wake-up time (datasheet max 240 µs, rounded up).
const WAKEUP_DELAY_MS: u32 = 1;
/// Normal-mode measurement takes up to 12.1 ms.
const MEASURE_DELAY_MS: u32 = 15;
const RETRY_BACKOFF_MS: u32 = 10;
pub const MAX_READ_ATTEMPTS: u8 = 10;

const CRC_POLY: u8 = 0x31;
const CRC_INIT: u8 = 0xFF;

pub struct Shtc3<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Shtc3<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Give the bus and delay back (used by tests to inspect the mock).
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_cmd(&mut self, cmd: u16) -> Result<(), SensorError> {
        self.i2c.write(ADDRESS, &cmd.to_be_bytes()).map_err(|e| {
            warn!("SHTC3: command 0x{:04x} failed: {:?}", cmd, e.kind());
            SensorError::BusWriteFailed
        })
    }

    fn measure_awake(&mut self) -> Result<[u8; 6], SensorError> {
        self.write_cmd(CMD_MEASURE_T_FIRST_NORMAL)?;
        self.delay.delay_ms(MEASURE_DELAY_MS);

        for attempt in 1..=MAX_READ_ATTEMPTS {
            let mut frame = [0u8; 6];
            match self.i2c.read(ADDRESS, &mut frame) {
                Ok(()) if frame_valid(&frame) => return Ok(frame),
                Ok(()) => debug!("SHTC3: CRC mismatch (attempt {})", attempt),
                Err(e) => debug!("SHTC3: read not ready: {:?} (attempt {})", e.kind(), attempt),
            }
            if attempt < MAX_READ_ATTEMPTS {
                self.delay.delay_ms(RETRY_BACKOFF_MS);
            }
        }

        warn!("SHTC3: no valid frame after {} attempts", MAX_READ_ATTEMPTS);
        Err(SensorError::Unresponsive)
    }
}

impl<I2C: I2c, D: DelayNs> ClimateSensor for Shtc3<I2C, D> {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        self.write_cmd(CMD_WAKEUP)?;
        self.delay.delay_ms(WAKEUP_DELAY_MS);

        // The sensor is awake from here on: always try to put it back to sleep.
        let measured = self.measure_awake();
        let slept = self.write_cmd(CMD_SLEEP);
        let frame = measured?;
        slept?;

        let reading = convert(&frame);
        debug!(
            "SHTC3: {:.2}\u{00b0}C rh={:.1}%",
            reading.temperature_c,
            f32::from(reading.humidity) * 100.0 / 65535.0
        );
        Ok(reading)
    }
}

/// Sensirion CRC-8 (poly 0x31, init 0xFF, no reflection, no final XOR).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn frame_valid(frame: &[u8; 6]) -> bool {
    crc8(&frame[0..2]) == frame[2] && crc8(&frame[3..5]) == frame[5]
}

fn convert(frame: &[u8; 6]) -> ClimateReading {
    let raw_t = u16::from_be_bytes([frame[0], frame[1]]);
    let raw_rh = u16::from_be_bytes([frame[3], frame[4]]);
    ClimateReading {
        temperature_c: -45.0 + 175.0 * f32::from(raw_t) / 65536.0,
        humidity: raw_rh,
    }
}
