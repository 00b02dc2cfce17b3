//! Device identity derived from the ESP32 factory MAC address.
//!
//! `gate-xxyyzz` from the last three MAC bytes, lowercase hex.  Stable
//! across reboots and reported as `device_id` in every status report.

/// Fixed-size device ID string.
pub type DeviceIdString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(feature = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    if let Err(e) = esp_idf_svc::sys::esp!(unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr())
    }) {
        log::warn!("Device ID: eFuse MAC read failed ({}), using zeros", e);
    }
    mac
}

/// Simulation: a deterministic fake MAC.
#[cfg(not(feature = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x24, 0x6F, 0x28, 0x5A, 0x3C, 0x10]
}

pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    use core::fmt::Write;
    let mut id = DeviceIdString::new();
    // 11 characters always fit.
    let _ = write!(id, "gate-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}
