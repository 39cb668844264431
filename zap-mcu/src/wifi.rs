//! WiFi Abstraction Traits
//!
//! The daemon drives association and scanning through this trait; the
//! bounded-retry wait around `connect` lives in the control loop, not
//! here.

/// WiFi network scan result
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub ssid: String,
    pub rssi: i8,
}

/// WiFi connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// IP address info
#[derive(Debug, Clone)]
pub struct IpInfo {
    pub ip: [u8; 4],
}

impl IpInfo {
    pub fn ip_str(&self) -> String {
        format!("{}.{}.{}.{}", self.ip[0], self.ip[1], self.ip[2], self.ip[3])
    }
}

/// Trait for WiFi operations
///
/// Platform ports implement this using their WiFi stack. `connect`
/// starts an association attempt; callers poll `status` with their own
/// attempt/delay bound.
pub trait Wifi {
    /// Error type for WiFi operations
    type Error: std::fmt::Display;

    /// Scan for available networks
    fn scan(&mut self) -> Result<Vec<ScanResult>, Self::Error>;

    /// Begin connecting to a WiFi network
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Disconnect and clear association state
    fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Get current connection status
    fn status(&self) -> WifiStatus;

    /// Get IP info (if connected)
    fn ip_info(&self) -> Option<IpInfo>;

    /// Check if connected
    fn is_connected(&self) -> bool {
        self.status() == WifiStatus::Connected
    }
}
