//! Zap Gateway Library
//!
//! The gateway exposes one set of logical operations (WiFi
//! provisioning, status, reset, identity, signing) over two transports:
//! a local HTTP server and a BLE GATT link speaking the EGWTTP frame
//! format from `zap-proto`. Both transports feed the same router in
//! [`mapper`]; neither carries any business logic of its own.

pub mod ble;
pub mod http;
pub mod identity;
pub mod mapper;
pub mod sim;
pub mod state;
pub mod telemetry;

pub use identity::Identity;
pub use mapper::Gateway;
pub use state::GatewayState;
