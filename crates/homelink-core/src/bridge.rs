//! Command dispatch and the process-context object driven by the main
//! loop.
//!
//! [`Bridge`] owns the relay bank, the button bank, the connection flag,
//! and the keep-alive timer, so the firmware's loop body and the
//! simulator drive identical logic. Inbound frames arrive through
//! [`Bridge::on_frame`]; everything time-driven happens in
//! [`Bridge::tick`].

use embassy_time::Instant;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info};

use crate::buttons::{ButtonBank, Edge};
use crate::devices::DEVICES;
use crate::link::Heartbeat;
use crate::protocol::{self, PowerState};
use crate::relay::RelayBank;

/// Best-effort outbound text transport.
///
/// Implementations drop the frame when the link is down; nothing is
/// queued across a disconnect and nothing is reported back to the
/// caller.
pub trait FrameSink {
    fn send_text(&mut self, frame: &str);
}

/// Sink used while no transport exists; every frame is discarded.
pub struct DroppingSink;

impl FrameSink for DroppingSink {
    fn send_text(&mut self, _frame: &str) {}
}

pub struct Bridge<R: OutputPin, B: InputPin> {
    relays: RelayBank<R>,
    buttons: ButtonBank<B>,
    heartbeat: Heartbeat,
    connected: bool,
}

impl<R: OutputPin, B: InputPin> Bridge<R, B> {
    pub fn new(relays: RelayBank<R>, buttons: ButtonBank<B>, now: Instant) -> Self {
        Self {
            relays,
            buttons,
            heartbeat: Heartbeat::new(now),
            connected: false,
        }
    }

    pub fn on_link_up(&mut self) {
        self.connected = true;
        info!("connected to cloud endpoint");
    }

    pub fn on_link_down(&mut self) {
        self.connected = false;
        info!("disconnected from cloud endpoint");
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Inbound path: OnOff commands drive the mapped relay; anything
    /// else is dropped without comment.
    pub fn on_frame(&mut self, raw: &str) {
        let Some(cmd) = protocol::parse_command(raw) else {
            debug!("ignoring unrecognized frame");
            return;
        };
        self.relays.set_power(&cmd.device_id, cmd.on);
    }

    /// Button path: Pressed sends an "ON" report then energizes the
    /// relay; Released sends "OFF" then de-energizes. The report goes
    /// out before the GPIO write.
    pub fn poll_buttons(&mut self, now: Instant, sink: &mut impl FrameSink) {
        for (channel, edge) in self.buttons.poll(now) {
            let device = DEVICES[channel];
            let state = PowerState::from_on(edge == Edge::Pressed);
            sink.send_text(&protocol::power_report(device.id, state));
            self.relays.set_power(device.id, state.is_on());
        }
    }

    /// Emit the keep-alive marker when it falls due.
    pub fn poll_heartbeat(&mut self, now: Instant, sink: &mut impl FrameSink) {
        if self.heartbeat.poll(now, self.connected) {
            debug!("sending heartbeat");
            sink.send_text(protocol::HEARTBEAT_FRAME);
        }
    }

    /// One cooperative tick, in fixed order: keep-alive, then button
    /// edges. The caller services the transport (and feeds frames via
    /// [`Bridge::on_frame`]) before calling this.
    pub fn tick(&mut self, now: Instant, sink: &mut impl FrameSink) {
        self.poll_heartbeat(now, sink);
        self.poll_buttons(now, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use core::convert::Infallible;

    use crate::devices::DEVICE_COUNT;

    /// Everything observable, in the order it happened.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Observed {
        Frame(String),
        Relay(usize, bool), // (channel, energized)
    }

    type Log = Rc<RefCell<Vec<Observed>>>;

    #[derive(Clone)]
    struct LoggedRelayPin {
        channel: usize,
        high: Rc<RefCell<bool>>,
        log: Log,
    }

    impl embedded_hal::digital::ErrorType for LoggedRelayPin {
        type Error = Infallible;
    }

    impl OutputPin for LoggedRelayPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            *self.high.borrow_mut() = false;
            self.log.borrow_mut().push(Observed::Relay(self.channel, true));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            *self.high.borrow_mut() = true;
            self.log.borrow_mut().push(Observed::Relay(self.channel, false));
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FakeButton(Rc<RefCell<bool>>); // true = HIGH (idle)

    impl embedded_hal::digital::ErrorType for FakeButton {
        type Error = Infallible;
    }

    impl InputPin for FakeButton {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(*self.0.borrow())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!*self.0.borrow())
        }
    }

    struct LoggedSink(Log);

    impl FrameSink for LoggedSink {
        fn send_text(&mut self, frame: &str) {
            self.0.borrow_mut().push(Observed::Frame(String::from(frame)));
        }
    }

    struct Fixture {
        log: Log,
        relay_levels: [Rc<RefCell<bool>>; DEVICE_COUNT],
        buttons: [FakeButton; DEVICE_COUNT],
        bridge: Bridge<LoggedRelayPin, FakeButton>,
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn fixture() -> Fixture {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let relay_levels: [Rc<RefCell<bool>>; DEVICE_COUNT] =
            core::array::from_fn(|_| Rc::new(RefCell::new(false)));
        let relay_pins: [LoggedRelayPin; DEVICE_COUNT] = core::array::from_fn(|i| LoggedRelayPin {
            channel: i,
            high: relay_levels[i].clone(),
            log: log.clone(),
        });
        let buttons: [FakeButton; DEVICE_COUNT] =
            core::array::from_fn(|_| FakeButton(Rc::new(RefCell::new(true))));

        let relays = RelayBank::new(relay_pins);
        let bank = ButtonBank::new(buttons.clone(), at(0));
        let mut bridge = Bridge::new(relays, bank, at(0));
        bridge.on_link_up();

        // Discard the boot-time forced-off writes; tests care about what
        // happens afterwards.
        log.borrow_mut().clear();

        Fixture {
            log,
            relay_levels,
            buttons,
            bridge,
        }
    }

    fn relay_energized(fx: &Fixture, channel: usize) -> bool {
        !*fx.relay_levels[channel].borrow()
    }

    /// Tick repeatedly until past the debounce window.
    fn settle(fx: &mut Fixture, sink: &mut LoggedSink, from_ms: u64) {
        fx.bridge.tick(at(from_ms), sink);
        fx.bridge.tick(at(from_ms + 30), sink);
    }

    #[test]
    fn boot_leaves_all_relays_deenergized() {
        let fx = fixture();
        for channel in 0..DEVICE_COUNT {
            assert!(!relay_energized(&fx, channel));
        }
    }

    #[test]
    fn press_reports_on_before_the_gpio_write() {
        let mut fx = fixture();
        let mut sink = LoggedSink(fx.log.clone());

        *fx.buttons[0].0.borrow_mut() = false; // press
        settle(&mut fx, &mut sink, 1);

        let events = fx.log.borrow();
        assert_eq!(
            events.as_slice(),
            &[
                Observed::Frame(String::from(
                    r#"{"deviceId":"DeviceID1","action":"setPowerState","value":"ON"}"#
                )),
                Observed::Relay(0, true),
            ]
        );
    }

    #[test]
    fn release_reports_off_then_deenergizes() {
        let mut fx = fixture();
        let mut sink = LoggedSink(fx.log.clone());

        *fx.buttons[2].0.borrow_mut() = false;
        settle(&mut fx, &mut sink, 1);
        *fx.buttons[2].0.borrow_mut() = true;
        settle(&mut fx, &mut sink, 100);

        assert!(!relay_energized(&fx, 2));
        let events = fx.log.borrow();
        assert_eq!(
            &events[2..],
            &[
                Observed::Frame(String::from(
                    r#"{"deviceId":"DeviceID3","action":"setPowerState","value":"OFF"}"#
                )),
                Observed::Relay(2, false),
            ]
        );
    }

    #[test]
    fn inbound_on_command_energizes_only_the_target() {
        let mut fx = fixture();
        fx.bridge.on_frame(
            r#"{"deviceId": "DeviceID2", "action": "action.devices.commands.OnOff", "value": {"on": true}}"#,
        );
        assert!(relay_energized(&fx, 1));
        for channel in [0, 2, 3] {
            assert!(!relay_energized(&fx, channel));
        }

        fx.bridge.on_frame(
            r#"{"deviceId": "DeviceID2", "action": "action.devices.commands.OnOff", "value": {"on": false}}"#,
        );
        assert!(!relay_energized(&fx, 1));
    }

    #[test]
    fn unknown_device_id_is_a_noop() {
        let mut fx = fixture();
        fx.bridge.on_frame(
            r#"{"deviceId": "SomebodyElse", "action": "action.devices.commands.OnOff", "value": {"on": true}}"#,
        );
        assert!(fx.log.borrow().is_empty());
        for channel in 0..DEVICE_COUNT {
            assert!(!relay_energized(&fx, channel));
        }
    }

    #[test]
    fn unrecognized_action_and_garbage_are_ignored() {
        let mut fx = fixture();
        fx.bridge.on_frame(
            r#"{"deviceId": "DeviceID1", "action": "action.devices.commands.ColorAbsolute", "value": {"on": true}}"#,
        );
        fx.bridge.on_frame("{{{{");
        assert!(fx.log.borrow().is_empty());
    }

    #[test]
    fn heartbeat_fires_exactly_once_per_interval() {
        let mut fx = fixture();
        let mut sink = LoggedSink(fx.log.clone());

        fx.bridge.tick(at(300_000), &mut sink);
        assert!(fx.log.borrow().is_empty());

        fx.bridge.tick(at(300_001), &mut sink);
        assert_eq!(
            fx.log.borrow().as_slice(),
            &[Observed::Frame(String::from("H"))]
        );

        // Next marker needs a full interval from the send, not from boot.
        fx.bridge.tick(at(400_000), &mut sink);
        fx.bridge.tick(at(600_001), &mut sink);
        assert_eq!(fx.log.borrow().len(), 1);
        fx.bridge.tick(at(600_002), &mut sink);
        assert_eq!(fx.log.borrow().len(), 2);
    }

    #[test]
    fn heartbeat_respects_link_state() {
        let mut fx = fixture();
        let mut sink = LoggedSink(fx.log.clone());

        fx.bridge.on_link_down();
        assert!(!fx.bridge.is_connected());
        fx.bridge.tick(at(900_000), &mut sink);
        assert!(fx.log.borrow().is_empty());

        fx.bridge.on_link_up();
        assert!(fx.bridge.is_connected());
        fx.bridge.tick(at(900_001), &mut sink);
        assert_eq!(
            fx.log.borrow().as_slice(),
            &[Observed::Frame(String::from("H"))]
        );
    }
}
