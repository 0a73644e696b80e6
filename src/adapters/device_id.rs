//! Device identity derived from the ESP32 factory MAC address.
//!
//! The default device name is `Project-good-boy-XXXXXXXXXXXX`: the six MAC
//! bytes read as one little-endian 48-bit word and printed as 12 uppercase
//! hex digits, so the last MAC byte comes first.  The MAC also seeds the
//! reconnect jitter so a fleet powered up together does not retry in
//! lockstep.

use core::fmt::Write;

use crate::config::DispenserConfig;

/// Device name string, same capacity as [`DispenserConfig::device_name`].
pub type DeviceName = heapless::String<32>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

const NAME_PREFIX: &str = "Project-good-boy-";

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer, as the call requires.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// `mac` as the 48-bit eFuse word: byte 0 is least significant.
pub fn mac_word(mac: &MacAddress) -> u64 {
    let [a, b, c, d, e, f] = *mac;
    u64::from_le_bytes([a, b, c, d, e, f, 0, 0])
}

/// `Project-good-boy-` followed by the 12 hex digits of [`mac_word`].
pub fn device_name(mac: &MacAddress) -> DeviceName {
    let mut name = DeviceName::new();
    // 17 + 12 chars always fit in 32, so neither write can fail.
    name.push_str(NAME_PREFIX).ok();
    write!(name, "{:012X}", mac_word(mac)).ok();
    name
}

/// Configured name, or the MAC-derived default when none is set.
pub fn resolve_device_name(config: &DispenserConfig, mac: &MacAddress) -> DeviceName {
    if config.device_name.is_empty() {
        device_name(mac)
    } else {
        config.device_name.clone()
    }
}

/// Jitter seed for the reconnect backoff.  Never zero for a real MAC;
/// `Backoff::set_seed` maps zero to its default anyway.
pub fn backoff_seed(mac: &MacAddress) -> u32 {
    let hi = u32::from_be_bytes([mac[0], mac[1], mac[2], mac[3]]);
    let lo = u32::from_be_bytes([mac[2], mac[3], mac[4], mac[5]]);
    hi.rotate_left(16) ^ lo
}
