//! Fixed registry mapping cloud device identifiers to relay and button
//! channels.
//!
//! Exactly four devices exist, fixed at build time. The table index
//! doubles as the channel number used by [`crate::relay::RelayBank`] and
//! [`crate::buttons::ButtonBank`], so the pin fields are informational
//! (they document the wiring and are echoed in log lines).

/// Number of switchable channels on the board.
pub const DEVICE_COUNT: usize = 4;

/// One switchable device: a cloud identifier plus its GPIO assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    /// Opaque identifier assigned by the cloud service.
    pub id: &'static str,
    /// Output pin driving the relay coil (active-low).
    pub relay_pin: u8,
    /// Input pin for the paired push-button (pull-up, active-low).
    pub button_pin: u8,
}

/// The four devices, in channel order.
pub const DEVICES: [Device; DEVICE_COUNT] = [
    Device { id: "DeviceID1", relay_pin: 5, button_pin: 14 },
    Device { id: "DeviceID2", relay_pin: 4, button_pin: 12 },
    Device { id: "DeviceID3", relay_pin: 0, button_pin: 13 },
    Device { id: "DeviceID4", relay_pin: 2, button_pin: 3 },
];

/// Channel number for a cloud identifier, or `None` if it is not ours.
pub fn channel_for(id: &str) -> Option<usize> {
    DEVICES.iter().position(|d| d.id == id)
}
