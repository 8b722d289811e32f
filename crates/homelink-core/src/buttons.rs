//! Debounced button input monitor.
//!
//! Four pull-up, active-low inputs sampled once per main-loop tick. Each
//! channel runs a stable-state filter: a level change only becomes an
//! edge once it has held for [`DEBOUNCE_WINDOW`], which suppresses the
//! contact bounce of a mechanical switch.

use embassy_time::Instant;
use embedded_hal::digital::InputPin;
use heapless::Vec;
use log::debug;

use crate::config::DEBOUNCE_WINDOW;
use crate::devices::DEVICE_COUNT;

/// A reported input transition, after debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Stable-state filter for one mechanical switch.
struct Debouncer {
    /// Debounced pressed state last reported.
    stable: bool,
    /// Most recent raw sample.
    last_raw: bool,
    /// When the raw level last changed.
    changed_at: Instant,
}

impl Debouncer {
    fn new(now: Instant, pressed: bool) -> Self {
        Self {
            stable: pressed,
            last_raw: pressed,
            changed_at: now,
        }
    }

    /// Feed one raw sample; returns an edge once the new level has held
    /// for the debounce window.
    fn update(&mut self, now: Instant, raw: bool) -> Option<Edge> {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.changed_at = now;
            return None;
        }
        if raw != self.stable && now >= self.changed_at + DEBOUNCE_WINDOW {
            self.stable = raw;
            return Some(if raw { Edge::Pressed } else { Edge::Released });
        }
        None
    }
}

pub struct ButtonBank<P: InputPin> {
    pins: [P; DEVICE_COUNT],
    debouncers: [Debouncer; DEVICE_COUNT],
}

impl<P: InputPin> ButtonBank<P> {
    /// Inputs are pull-up wired, so a low level reads as pressed. A
    /// button already held at construction produces no edge.
    pub fn new(mut pins: [P; DEVICE_COUNT], now: Instant) -> Self {
        let debouncers = core::array::from_fn(|i| {
            let pressed = pins[i].is_low().unwrap_or(false);
            Debouncer::new(now, pressed)
        });
        Self { pins, debouncers }
    }

    /// Sample all channels once. Non-blocking; returns at most one edge
    /// per channel, possibly none at all.
    pub fn poll(&mut self, now: Instant) -> Vec<(usize, Edge), DEVICE_COUNT> {
        let mut edges = Vec::new();
        for (channel, (pin, debouncer)) in
            self.pins.iter_mut().zip(&mut self.debouncers).enumerate()
        {
            let pressed = pin.is_low().unwrap_or(false);
            if let Some(edge) = debouncer.update(now, pressed) {
                debug!("button {channel}: {edge:?}");
                let _ = edges.push((channel, edge));
            }
        }
        edges
    }
}
