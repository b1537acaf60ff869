//! Device identity: the 48-bit BLE address the beacon advertises from.
//!
//! The address is either provisioned at build time (`SOILBEACON_BLE_ADDR`)
//! or derived from the factory Bluetooth MAC. Both paths yield a *random
//! static* address: the two most significant bits are set and the remaining
//! 46 bits are neither all zeros nor all ones.

use core::fmt;

#[cfg(any(target_os = "espidf", test))]
use crate::error::Error;
use crate::error::Result;

/// A 48-bit device address, most significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Address bytes, most significant byte first (display order).
    pub const fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Parse `"aa:bb:cc:dd:ee:ff"` (either case). Returns `None` on any
    /// syntax error. Usable in const context so the build-time address is
    /// checked by the compiler.
    pub const fn parse(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() != 17 {
            return None;
        }
        let mut out = [0u8; 6];
        let mut i = 0;
        while i < 6 {
            let at = i * 3;
            let (Some(hi), Some(lo)) = (hex_nibble(b[at]), hex_nibble(b[at + 1])) else {
                return None;
            };
            out[i] = (hi << 4) | lo;
            if i < 5 && b[at + 2] != b':' {
                return None;
            }
            i += 1;
        }
        Some(Self(out))
    }

    /// `true` when the address satisfies the random static constraints.
    pub const fn is_random_static(&self) -> bool {
        let b = self.0;
        if b[0] & 0xC0 != 0xC0 {
            return false;
        }
        let head = b[0] & 0x3F;
        let rest_zero = b[1] == 0 && b[2] == 0 && b[3] == 0 && b[4] == 0 && b[5] == 0;
        let rest_ones =
            b[1] == 0xFF && b[2] == 0xFF && b[3] == 0xFF && b[4] == 0xFF && b[5] == 0xFF;
        !(head == 0 && rest_zero) && !(head == 0x3F && rest_ones)
    }

    /// Turn a factory MAC into a random static address: force the two
    /// type bits and flip one bit if the remainder is degenerate.
    pub fn from_hardware_id(mac: [u8; 6]) -> Self {
        let mut bytes = mac;
        bytes[0] |= 0xC0;
        let mut addr = Self(bytes);
        if !addr.is_random_static() {
            // Remainder was all-0 or all-1: toggle the lowest bit.
            addr.0[5] ^= 0x01;
        }
        addr
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

const fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Address source
// ---------------------------------------------------------------------------

/// Where the advertised address comes from. Chosen at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// Statically provisioned address.
    Fixed(DeviceAddress),
    /// Derived from the factory Bluetooth MAC.
    Hardware,
}

impl AddressSource {
    /// Resolve to a concrete address. Called once at boot; a failed MAC
    /// read is an init failure.
    pub fn resolve(self) -> Result<DeviceAddress> {
        self.resolve_with(read_hardware_id)
    }

    fn resolve_with(self, read_id: impl FnOnce() -> Result<[u8; 6]>) -> Result<DeviceAddress> {
        match self {
            Self::Fixed(addr) => Ok(addr),
            Self::Hardware => read_id().map(DeviceAddress::from_hardware_id),
        }
    }
}

/// Read the factory Bluetooth MAC from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_hardware_id() -> Result<[u8; 6]> {
    let mut mac = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer for the duration of the call.
    let ret = unsafe {
        esp_idf_svc::sys::esp_read_mac(
            mac.as_mut_ptr(),
            esp_idf_svc::sys::esp_mac_type_t_ESP_MAC_BT,
        )
    };
    if ret != esp_idf_svc::sys::ESP_OK as i32 {
        log::error!("identity: esp_read_mac failed (rc={})", ret);
        return Err(Error::Init("BT MAC"));
    }
    Ok(mac)
}

/// Simulation: deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_hardware_id() -> Result<[u8; 6]> {
    Ok([0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE])
}
