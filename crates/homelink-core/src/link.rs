//! Link bookkeeping: idle keep-alive and reconnect pacing.
//!
//! Neither timer reads a clock; the main loop passes `now` in each tick
//! so the logic stays deterministic under test.

use embassy_time::Instant;
use thiserror_no_std::Error;

use crate::config::{HEARTBEAT_INTERVAL, RECONNECT_INTERVAL};

/// Failure labels for the transport layer. These are logged at the point
/// of failure and never propagate past it; recovery is always "close and
/// retry on the fixed interval".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("dns lookup failed")]
    Dns,
    #[error("tcp connect failed")]
    Connect,
    #[error("websocket handshake rejected")]
    Handshake,
    #[error("socket closed")]
    Closed,
}

/// Idle keep-alive timer.
///
/// Fires while connected once more than [`HEARTBEAT_INTERVAL`] has
/// passed since the last send, then re-arms itself. The timestamp is
/// deliberately not reset on link-up, matching the original firmware:
/// the interval measures time since the last marker, not connection age.
pub struct Heartbeat {
    last_sent: Instant,
}

impl Heartbeat {
    pub fn new(now: Instant) -> Self {
        Self { last_sent: now }
    }

    /// True exactly on the tick where the interval is crossed.
    pub fn poll(&mut self, now: Instant, connected: bool) -> bool {
        if connected && now > self.last_sent + HEARTBEAT_INTERVAL {
            self.last_sent = now;
            true
        } else {
            false
        }
    }
}

/// Paces connection attempts to one per [`RECONNECT_INTERVAL`]. The
/// first attempt is allowed immediately; there is no backoff and no
/// retry cap.
pub struct ReconnectTimer {
    last_attempt: Option<Instant>,
}

impl ReconnectTimer {
    pub const fn new() -> Self {
        Self { last_attempt: None }
    }

    /// True when the caller may attempt a connection; arming consumes
    /// the slot until the interval elapses again.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last_attempt {
            Some(last) if now < last + RECONNECT_INTERVAL => false,
            _ => {
                self.last_attempt = Some(now);
                true
            }
        }
    }
}

impl Default for ReconnectTimer {
    fn default() -> Self {
        Self::new()
    }
}
