//! Hardware-independent core library for homelink-rs
//!
//! This crate contains all platform-agnostic logic for the four-channel
//! relay bridge: the fixed device registry, the relay output driver, the
//! debounced button monitor, the Sinric wire protocol, link bookkeeping
//! (keep-alive and reconnect pacing), and the bridge object the main loop
//! drives once per tick.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! the embedded target (ESP32-S3) and desktop hosts (for the simulator
//! and tests). Nothing in here reads a clock or touches a peripheral
//! directly; time comes in as [`embassy_time::Instant`] arguments and
//! GPIO goes through the `embedded-hal` digital traits.

#![no_std]

extern crate alloc;

pub mod bridge;
pub mod buttons;
pub mod config;
pub mod devices;
pub mod link;
pub mod protocol;
pub mod relay;
