//! Zap MCU Library
//!
//! Traits the gateway daemon expects a platform port to implement:
//! WiFi association/scanning and a BLE GATT server. The daemon treats
//! both as black boxes; the protocol and routing layers never touch
//! them directly.
//!
//! # Note
//! This crate depends only on `zap-proto` so MCU ports can build it
//! without the host-side stack.

pub mod ble;
pub mod wifi;

pub use ble::*;
pub use wifi::*;
