//! Gateway state - one struct owned by the control loop
//!
//! Everything the handlers mutate lives here and is touched only while
//! the gateway mutex is held, so single-writer discipline survives the
//! move off a single-threaded firmware loop.

use std::time::{Duration, Instant};

/// Scan results are served from cache for this long.
pub const SCAN_CACHE_TIME: Duration = Duration::from_secs(10);

/// Delay between a BLE stop request and the actual shutdown, so the
/// success response can still be read over BLE.
pub const BLE_SHUTDOWN_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct GatewayState {
    started_at: Instant,
    pub provisioned: bool,
    pub ssid: Option<String>,
    pub password: Option<String>,
    /// Credentials waiting for the control loop's bounded association
    /// attempt.
    pending_connect: Option<(String, String)>,
    scan_results: Vec<String>,
    scan_taken_at: Option<Instant>,
    ble_shutdown_at: Option<Instant>,
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            provisioned: false,
            ssid: None,
            password: None,
            pending_connect: None,
            scan_results: Vec::new(),
            scan_taken_at: None,
            ble_shutdown_at: None,
        }
    }

    pub fn uptime_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }

    /// Queue credentials for the control loop. The handler replies
    /// before the association attempt runs.
    pub fn record_credentials(&mut self, ssid: &str, password: &str) {
        self.pending_connect = Some((ssid.to_string(), password.to_string()));
    }

    pub fn take_pending_connect(&mut self) -> Option<(String, String)> {
        self.pending_connect.take()
    }

    pub fn mark_provisioned(&mut self, ssid: String, password: String) {
        self.ssid = Some(ssid);
        self.password = Some(password);
        self.provisioned = true;
    }

    pub fn clear_credentials(&mut self) {
        self.ssid = None;
        self.password = None;
        self.pending_connect = None;
        self.provisioned = false;
    }

    /// Cached SSID list, if still within the freshness window.
    pub fn cached_scan(&self, now: Instant) -> Option<&[String]> {
        let taken = self.scan_taken_at?;
        if now.duration_since(taken) < SCAN_CACHE_TIME {
            Some(&self.scan_results)
        } else {
            None
        }
    }

    /// Store scan results, deduplicated and sorted (networks broadcast
    /// on multiple channels show up more than once).
    pub fn store_scan(&mut self, mut ssids: Vec<String>, now: Instant) -> &[String] {
        ssids.sort();
        ssids.dedup();
        self.scan_results = ssids;
        self.scan_taken_at = Some(now);
        &self.scan_results
    }

    pub fn schedule_ble_shutdown(&mut self, now: Instant) {
        self.ble_shutdown_at = Some(now + BLE_SHUTDOWN_DELAY);
    }

    /// True once the scheduled shutdown deadline has passed; the
    /// deadline is consumed so the shutdown fires exactly once.
    pub fn take_due_ble_shutdown(&mut self, now: Instant) -> bool {
        match self.ble_shutdown_at {
            Some(at) if now >= at => {
                self.ble_shutdown_at = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}
