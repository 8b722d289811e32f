//! Build-time injected credentials.
//!
//! Values come from a `.env` file next to the crate (or the environment)
//! via `build.rs`. They are baked into the binary; there is no runtime
//! provisioning.

pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

/// Sinric API key, presented once during the WebSocket upgrade.
pub const SINRIC_API_KEY: &str = env!("SINRIC_API_KEY");
