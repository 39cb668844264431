//! Host stand-ins for the radio traits (no station radio in dev)
//!
//! `SimWifi` associates with anything given non-empty credentials and
//! reports a fixed neighborhood; `NullBle` is a GATT server that never
//! receives writes. A real MCU port replaces both behind the same
//! traits.

use zap_mcu::{BleServer, IpInfo, ScanResult, Wifi, WifiStatus};

pub struct SimWifi {
    connected: Option<String>,
    networks: Vec<ScanResult>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimWifiError {
    #[error("no WiFi credentials provided")]
    NoCredentials,
}

impl SimWifi {
    pub fn new() -> Self {
        Self {
            connected: None,
            networks: vec![
                ScanResult {
                    ssid: "may the source".to_string(),
                    rssi: -52,
                },
                ScanResult {
                    ssid: "corp-guest".to_string(),
                    rssi: -71,
                },
                // Same network on another channel, to exercise dedup.
                ScanResult {
                    ssid: "may the source".to_string(),
                    rssi: -80,
                },
                ScanResult {
                    ssid: "attic".to_string(),
                    rssi: -88,
                },
            ],
        }
    }
}

impl Default for SimWifi {
    fn default() -> Self {
        Self::new()
    }
}

impl Wifi for SimWifi {
    type Error = SimWifiError;

    fn scan(&mut self) -> Result<Vec<ScanResult>, Self::Error> {
        Ok(self.networks.clone())
    }

    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        if ssid.is_empty() || password.is_empty() {
            return Err(SimWifiError::NoCredentials);
        }
        self.connected = Some(ssid.to_string());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.connected = None;
        Ok(())
    }

    fn status(&self) -> WifiStatus {
        if self.connected.is_some() {
            WifiStatus::Connected
        } else {
            WifiStatus::Disconnected
        }
    }

    fn ip_info(&self) -> Option<IpInfo> {
        self.connected.as_ref().map(|_| IpInfo {
            ip: [192, 168, 4, 2],
        })
    }
}

/// BLE server stub: advertises nothing, yields no writes.
pub struct NullBle;

impl BleServer for NullBle {
    type Error = std::convert::Infallible;

    fn start_advertising(&mut self, _device_name: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn ensure_advertising(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn poll_write(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn notify_response(&mut self, _frame: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
}
