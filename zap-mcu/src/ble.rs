//! BLE GATT server trait for the gateway's request/response service
//!
//! Protocol constants (UUIDs, frame limit) are in `zap_proto::ble`.
//! The daemon's BLE adapter drains request-characteristic writes
//! through `poll_write` and pushes encoded response frames back with
//! `notify_response`; everything else (advertising parameters, GATT
//! table, descriptors) is the port's business.

// Re-export protocol constants for convenience
pub use zap_proto::ble::{
    DEVICE_NAME_PREFIX, MAX_FRAME_SIZE, REQUEST_CHAR_UUID, RESPONSE_CHAR_UUID, SERVICE_UUID,
};

/// Trait for BLE GATT server implementations
pub trait BleServer {
    /// Error type for BLE operations
    type Error: std::fmt::Display;

    /// Start advertising the gateway service under the given name
    fn start_advertising(&mut self, device_name: &str) -> Result<(), Self::Error>;

    /// Stop advertising and release the radio
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Restart advertising if the link layer dropped it
    fn ensure_advertising(&mut self) -> Result<(), Self::Error>;

    /// Take the next pending write to the request characteristic, if any
    fn poll_write(&mut self) -> Option<Vec<u8>>;

    /// Set the response characteristic value and notify subscribers
    fn notify_response(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
}
