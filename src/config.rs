//! Build-time node configuration.
//!
//! All tunables for the beacon. There is no runtime configuration surface:
//! [`NodeConfig::BUILD`] is resolved from Cargo features and the optional
//! `SOILBEACON_BLE_ADDR` environment variable, and the compiler folds the
//! unused variants away in firmware builds. Tests construct any variant
//! they need directly.

use crate::error::{Error, Result};
use crate::identity::{AddressSource, DeviceAddress};
use crate::payload::{self, Protocol};
use crate::sensors::analog::LightSensorKind;

/// TX power levels the radio controller accepts, in dBm.
pub const SUPPORTED_TX_POWER_DBM: [i8; 8] = [-12, -9, -6, -3, 0, 3, 6, 9];

/// Lowest legal advertising interval for non-connectable advertising.
pub const MIN_ADVERTISING_INTERVAL_MS: u16 = 20;

/// Core node configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeConfig {
    // --- Payload ---
    /// Wire format broadcast by this build.
    pub protocol: Protocol,
    /// Complete local name carried in every advertisement.
    pub device_name: &'static str,
    /// Source of the advertised address.
    pub address: AddressSource,

    // --- Timing ---
    /// How long each broadcast window lasts (seconds).
    pub advertising_window_secs: u32,
    /// Time spent asleep between broadcast windows (seconds).
    pub sleep_interval_secs: u32,
    /// Advertising event interval (milliseconds).
    pub advertising_interval_ms: u16,

    // --- Radio ---
    /// Transmit power (dBm), one of [`SUPPORTED_TX_POWER_DBM`].
    pub tx_power_dbm: i8,

    // --- Board ---
    /// Light sensor fitted on this board revision, if any.
    pub light_sensor: Option<LightSensorKind>,
    /// Drive the indicator LED while a wake-up is being handled.
    pub blink_indicator: bool,
}

const BUILD_PROTOCOL: Protocol = if cfg!(feature = "protocol-bthome") {
    Protocol::BtHome
} else {
    Protocol::Custom
};

const BUILD_LIGHT_SENSOR: Option<LightSensorKind> = if cfg!(feature = "board-v1-0") {
    None
} else if cfg!(feature = "board-v1-1") {
    Some(LightSensorKind::Ldr)
} else if cfg!(feature = "board-v1-2") {
    Some(LightSensorKind::Phototransistor)
} else {
    None
};

const BUILD_ADDRESS: AddressSource = match option_env!("SOILBEACON_BLE_ADDR") {
    Some(s) => match DeviceAddress::parse(s) {
        Some(addr) => AddressSource::Fixed(addr),
        None => panic!("SOILBEACON_BLE_ADDR must look like f0:ca:f0:ca:01:01"),
    },
    None => AddressSource::Hardware,
};

impl NodeConfig {
    /// Configuration baked into this build.
    pub const BUILD: Self = Self {
        protocol: BUILD_PROTOCOL,
        // U+1F331 SEEDLING, 4 bytes of UTF-8.
        device_name: "\u{1F331}",
        address: BUILD_ADDRESS,

        advertising_window_secs: 1,
        sleep_interval_secs: 600, // 10 min
        advertising_interval_ms: 30,

        tx_power_dbm: 9,

        light_sensor: BUILD_LIGHT_SENSOR,
        blink_indicator: cfg!(feature = "blink-indicator"),
    };

    pub fn has_light_sensor(&self) -> bool {
        self.light_sensor.is_some()
    }

    /// Reject values the firmware cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.advertising_window_secs == 0 {
            return Err(Error::Config("advertising window must be > 0 s"));
        }
        if self.sleep_interval_secs == 0 {
            return Err(Error::Config("sleep interval must be > 0 s"));
        }
        if self.advertising_interval_ms < MIN_ADVERTISING_INTERVAL_MS {
            return Err(Error::Config("advertising interval must be >= 20 ms"));
        }
        if !SUPPORTED_TX_POWER_DBM.contains(&self.tx_power_dbm) {
            return Err(Error::Config("unsupported TX power level"));
        }
        if self.device_name.len() > payload::max_name_len(self.protocol, self.has_light_sensor()) {
            return Err(Error::Config("device name does not fit the advertisement"));
        }
        if let AddressSource::Fixed(addr) = self.address {
            if !addr.is_random_static() {
                return Err(Error::Config("fixed address is not random static"));
            }
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::BUILD
    }
}
