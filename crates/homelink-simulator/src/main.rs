//! Desktop simulator for the homelink-rs relay bridge.
//!
//! Drives the exact core logic the firmware runs, with fake GPIO pins
//! and stdin standing in for the hardware and the cloud link. Outbound
//! frames are printed instead of sent.
//!
//! # Commands
//!
//! | Input          | Action                                   |
//! |----------------|------------------------------------------|
//! | `press N`      | Hold button N (1-4) down                 |
//! | `release N`    | Let button N go                          |
//! | `up` / `down`  | Bring the simulated cloud link up / down |
//! | `state`        | Print relay levels                       |
//! | `{...}`        | Inject a raw inbound JSON frame          |
//! | `quit`         | Exit                                     |

use std::cell::Cell;
use std::convert::Infallible;
use std::io::BufRead;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration as StdDuration;

use embassy_time::Instant;
use embedded_hal::digital::{InputPin, OutputPin};
use log::info;

use homelink_core::bridge::{Bridge, FrameSink};
use homelink_core::buttons::ButtonBank;
use homelink_core::devices::{DEVICES, DEVICE_COUNT};
use homelink_core::relay::RelayBank;

/// Main-loop cadence, roughly what the firmware runs.
const TICK_PAUSE: StdDuration = StdDuration::from_millis(10);

/// Output pin fake whose level is observable from the outside.
/// `true` = HIGH (relay released).
#[derive(Clone)]
struct SimOutput(Rc<Cell<bool>>);

impl embedded_hal::digital::ErrorType for SimOutput {
    type Error = Infallible;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

/// Input pin fake driven by `press`/`release` commands.
/// `true` = HIGH (idle, pull-up).
#[derive(Clone)]
struct SimInput(Rc<Cell<bool>>);

impl embedded_hal::digital::ErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

/// Prints outbound frames; drops them while the simulated link is down,
/// like the real transport does.
struct ConsoleSink {
    link_up: Rc<Cell<bool>>,
}

impl FrameSink for ConsoleSink {
    fn send_text(&mut self, frame: &str) {
        if self.link_up.get() {
            println!(">> {frame}");
        } else {
            println!("-- dropped (link down): {frame}");
        }
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn parse_channel(arg: Option<&str>) -> Option<usize> {
    let n: usize = arg?.parse().ok()?;
    (1..=DEVICE_COUNT).contains(&n).then(|| n - 1)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let relay_levels: [Rc<Cell<bool>>; DEVICE_COUNT] =
        std::array::from_fn(|_| Rc::new(Cell::new(false)));
    let button_levels: [Rc<Cell<bool>>; DEVICE_COUNT] =
        std::array::from_fn(|_| Rc::new(Cell::new(true)));
    let link_up = Rc::new(Cell::new(false));

    let relays = RelayBank::new(std::array::from_fn(|i| SimOutput(relay_levels[i].clone())));
    let buttons = ButtonBank::new(
        std::array::from_fn(|i| SimInput(button_levels[i].clone())),
        Instant::now(),
    );
    let mut bridge = Bridge::new(relays, buttons, Instant::now());
    let mut sink = ConsoleSink {
        link_up: link_up.clone(),
    };

    // Simulated link starts up, like a freshly booted device that got
    // through its handshake.
    link_up.set(true);
    bridge.on_link_up();

    let commands = spawn_stdin_reader();
    let mut shown: [bool; DEVICE_COUNT] = std::array::from_fn(|i| relay_levels[i].get());

    info!("simulator running; type commands on stdin");
    loop {
        while let Ok(line) = commands.try_recv() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('{') {
                bridge.on_frame(line);
                continue;
            }
            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some("press"), arg) => match parse_channel(arg) {
                    Some(ch) => button_levels[ch].set(false),
                    None => eprintln!("usage: press <1-{DEVICE_COUNT}>"),
                },
                (Some("release"), arg) => match parse_channel(arg) {
                    Some(ch) => button_levels[ch].set(true),
                    None => eprintln!("usage: release <1-{DEVICE_COUNT}>"),
                },
                (Some("up"), _) => {
                    link_up.set(true);
                    bridge.on_link_up();
                }
                (Some("down"), _) => {
                    link_up.set(false);
                    bridge.on_link_down();
                }
                (Some("state"), _) => {
                    for (device, level) in DEVICES.iter().zip(&relay_levels) {
                        println!(
                            "{}: {}",
                            device.id,
                            if level.get() { "OFF" } else { "ON" }
                        );
                    }
                }
                (Some("quit"), _) => return,
                _ => eprintln!("unknown command: {line}"),
            }
        }

        bridge.tick(Instant::now(), &mut sink);

        for (channel, level) in relay_levels.iter().enumerate() {
            if level.get() != shown[channel] {
                shown[channel] = level.get();
                println!(
                    "relay {} ({}) -> {}",
                    channel + 1,
                    DEVICES[channel].id,
                    if level.get() { "OFF" } else { "ON" }
                );
            }
        }

        thread::sleep(TICK_PAUSE);
    }
}
