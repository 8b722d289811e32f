//! Relay output driver.
//!
//! Four channels mapped by the device table, each driving a relay coil
//! active-low: LOW energizes, HIGH releases. Pin errors are
//! `Infallible` on the target and are absorbed here; GPIO writes are
//! best-effort everywhere in this firmware.

use embedded_hal::digital::OutputPin;
use log::info;

use crate::devices::{self, DEVICE_COUNT};

pub struct RelayBank<P: OutputPin> {
    pins: [P; DEVICE_COUNT],
}

impl<P: OutputPin> RelayBank<P> {
    /// Take ownership of the four relay pins, forcing every channel to
    /// the de-energized level before anything else can run.
    pub fn new(mut pins: [P; DEVICE_COUNT]) -> Self {
        for pin in &mut pins {
            let _ = pin.set_high();
        }
        Self { pins }
    }

    /// Drive the relay mapped to `device_id`. Unknown identifiers are a
    /// silent no-op; repeated identical calls re-assert the same level.
    pub fn set_power(&mut self, device_id: &str, on: bool) {
        let Some(channel) = devices::channel_for(device_id) else {
            return;
        };
        self.set_channel(channel, on);
        info!("turned {}: {}", if on { "on" } else { "off" }, device_id);
    }

    /// Drive one channel directly by index. The coil is wired active-low.
    pub fn set_channel(&mut self, channel: usize, on: bool) {
        if let Some(pin) = self.pins.get_mut(channel) {
            let _ = if on { pin.set_low() } else { pin.set_high() };
        }
    }
}
