//! Fuzz target: `DeviceAddress::parse`
//!
//! Arbitrary text must never panic the parser, and anything it accepts
//! must survive a `Display` round trip.
//!
//! cargo fuzz run fuzz_address_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use soilbeacon::identity::DeviceAddress;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Some(addr) = DeviceAddress::parse(text) {
        let shown = addr.to_string();
        assert_eq!(DeviceAddress::parse(&shown), Some(addr));
    }
});
