//! Zap BLE Controller
//!
//! BLE client for configuring Zap gateways. Requests are EGWTTP frames
//! written to the request characteristic; responses come back chunked
//! to the transport frame limit and are reassembled by re-issuing the
//! request with the offset advanced until `Content-Length` bytes have
//! arrived.
//!
//! # Example
//!
//! ```ignore
//! use zap_ble_controller::ble;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Scan for gateways
//!     let devices = ble::scan(5).await?;
//!     for device in &devices {
//!         println!("{} ({})", device.name, device.address);
//!     }
//!
//!     // Read system info (chunked transparently)
//!     let body = ble::request(None, "GET", "/api/system/info", b"").await?;
//!     println!("{}", String::from_utf8_lossy(&body));
//!
//!     Ok(())
//! }
//! ```

pub mod ble;
pub mod reassemble;
