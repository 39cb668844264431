//! BLE GATT Service Protocol Constants for the Zap Gateway
//!
//! One service with a write-capable request characteristic and a
//! read/notify/indicate response characteristic. Request frames are
//! written whole; responses come back EGWTTP-framed and offset-chunked
//! to [`MAX_FRAME_SIZE`].

/// BLE Service UUID
pub const SERVICE_UUID: &str = "5ac91000-6d3a-2f1b-0000-000000000000";

/// Request Characteristic UUID (write / write-without-response)
pub const REQUEST_CHAR_UUID: &str = "5ac91001-6d3a-2f1b-0000-000000000000";

/// Response Characteristic UUID (read / notify / indicate)
pub const RESPONSE_CHAR_UUID: &str = "5ac91002-6d3a-2f1b-0000-000000000000";

/// Advertised device name prefix; controllers match on this.
pub const DEVICE_NAME_PREFIX: &str = "Zap";

/// Largest frame (header + body chunk) the response characteristic
/// carries. Headers are always far below this, so body truncation is
/// the only truncation path.
pub const MAX_FRAME_SIZE: usize = 512;
