//! ESP32-S3 firmware-specific modules for homelink-rs
//!
//! This crate contains the code that cannot compile on desktop targets:
//! peripheral initialization, Wi-Fi credential management, and the
//! Sinric WebSocket client running over embassy-net.

#![no_std]

extern crate alloc;

pub mod sinric;
pub mod wifi_secrets;
