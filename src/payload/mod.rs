//! Advertisement payload encoder.
//!
//! Turns one [`ReadingSet`] into the complete raw advertising data for a
//! legacy (31-byte) BLE advertisement:
//!
//! ```text
//!  ┌─────┬──────┬──────────────┐┌─────┬──────┬──────────┬──────────────────┐
//!  │ len │ 0x09 │ local name   ││ len │ 0x16 │ UUID (LE)│ service data     │
//!  └─────┴──────┴──────────────┘└─────┴──────┴──────────┴──────────────────┘
//!   Complete Local Name AD        Service Data (16-bit UUID) AD
//! ```
//!
//! The service data is produced by one of two pure encoders, selected at
//! build time by [`Protocol`]: the custom big-endian layout in [`custom`]
//! or BTHome v2 in [`bthome`]. Encoding never touches the radio.

pub mod bthome;
pub mod custom;

use log::debug;

use crate::error::EncodeError;
use crate::identity::DeviceAddress;
use crate::sensors::ReadingSet;

/// Legacy advertising data limit.
pub const MAX_ADV_LEN: usize = 31;

/// Raw advertising data, ready for the radio.
pub type Payload = heapless::Vec<u8, MAX_ADV_LEN>;

/// AD type: Complete Local Name.
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
/// AD type: Service Data, 16-bit UUID.
pub const AD_TYPE_SERVICE_DATA_16: u8 = 0x16;

/// Length byte + AD type byte.
const AD_HEADER_LEN: usize = 2;
/// 16-bit service UUID inside the service-data structure.
const UUID16_LEN: usize = 2;

/// Wire format broadcast by a build. Exactly one per firmware image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Custom big-endian layout under service UUID 0x181A.
    Custom,
    /// BTHome v2 under service UUID 0xFCD2.
    BtHome,
}

impl Protocol {
    /// 16-bit service UUID the service data is filed under.
    pub const fn service_uuid(self) -> u16 {
        match self {
            Self::Custom => custom::SERVICE_UUID,
            Self::BtHome => bthome::SERVICE_UUID,
        }
    }

    /// Length of the service data (excluding UUID) this protocol emits.
    pub const fn service_data_len(self, has_light: bool) -> usize {
        match self {
            Self::Custom => custom::SERVICE_DATA_LEN,
            Self::BtHome => bthome::encoded_len(has_light),
        }
    }
}

/// Longest device name that still fits next to the service data.
pub const fn max_name_len(protocol: Protocol, has_light: bool) -> usize {
    MAX_ADV_LEN.saturating_sub(
        AD_HEADER_LEN + AD_HEADER_LEN + UUID16_LEN + protocol.service_data_len(has_light),
    )
}

/// Encode a reading set into raw advertising data.
///
/// Deterministic: the same inputs always yield the same bytes.
pub fn encode(
    reading: &ReadingSet,
    protocol: Protocol,
    address: &DeviceAddress,
    name: &str,
) -> Result<Payload, EncodeError> {
    let payload = match protocol {
        Protocol::Custom => {
            let data = custom::encode(reading, address);
            assemble(name, custom::SERVICE_UUID, &data)?
        }
        Protocol::BtHome => {
            let data = bthome::encode(reading);
            assemble(name, bthome::SERVICE_UUID, data.as_slice())?
        }
    };
    debug!("PAYLOAD: {:?} {} bytes {:02x?}", protocol, payload.len(), payload.as_slice());
    Ok(payload)
}

/// Frame a name and service data into AD structures.
pub fn assemble(name: &str, uuid: u16, service_data: &[u8]) -> Result<Payload, EncodeError> {
    let needed = AD_HEADER_LEN + name.len() + AD_HEADER_LEN + UUID16_LEN + service_data.len();
    if needed > MAX_ADV_LEN {
        return Err(EncodeError::PayloadTooLarge(needed));
    }

    let name_header = [(1 + name.len()) as u8, AD_TYPE_COMPLETE_LOCAL_NAME];
    let data_header = [
        (1 + UUID16_LEN + service_data.len()) as u8,
        AD_TYPE_SERVICE_DATA_16,
    ];
    let uuid_le = uuid.to_le_bytes();
    let chunks: [&[u8]; 5] = [
        &name_header,
        name.as_bytes(),
        &data_header,
        &uuid_le,
        service_data,
    ];

    let mut out = Payload::new();
    for chunk in chunks {
        out.extend_from_slice(chunk)
            .map_err(|()| EncodeError::PayloadTooLarge(needed))?;
    }
    Ok(out)
}
