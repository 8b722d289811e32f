//! Compile-time configuration: cloud endpoint, timing intervals.
//!
//! Everything here is a build-time constant; there is no configuration
//! file and no runtime tuning. Credentials (Wi-Fi, API key) live in the
//! firmware crate's `wifi_secrets` module, injected from `.env` at build
//! time.

use embassy_time::Duration;

/// Sinric cloud endpoint host.
pub const CLOUD_HOST: &str = "iot.sinric.com";

/// Sinric cloud endpoint port (plain WebSocket, no TLS).
pub const CLOUD_PORT: u16 = 80;

/// Request path used in the WebSocket upgrade.
pub const CLOUD_PATH: &str = "/";

/// Idle keep-alive interval on the cloud link.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(300);

/// Fixed delay between connection attempts while the link is down.
/// No backoff, no retry cap.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Minimum time an input level must hold before an edge is reported.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(20);

/// Delay between Wi-Fi association polls during startup.
pub const WIFI_POLL_INTERVAL: Duration = Duration::from_millis(500);
