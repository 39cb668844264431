//! Endpoint router - maps resolved endpoints to handlers
//!
//! One handler per [`Endpoint`] variant, dispatched by exhaustive
//! match. The router never inspects which transport produced the
//! request, and it never fails once an endpoint (possibly `Unknown`)
//! has been resolved: malformed bodies are the handler's business and
//! come back as structured error payloads.
//!
//! Handlers are cheap and deterministic over unchanged state, which is
//! what lets the BLE adapter re-route the same request for every
//! offset-chunked read instead of buffering partial responses.

use std::time::Instant;

use serde_json::json;
use zap_mcu::{Wifi, WifiStatus};
use zap_proto::{Endpoint, EndpointRequest, EndpointResponse};

use crate::identity::Identity;
use crate::state::GatewayState;

pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The gateway: state, radio, identity. Both transport adapters hold
/// this behind one mutex and call [`Gateway::route`].
pub struct Gateway<W: Wifi> {
    pub state: GatewayState,
    pub wifi: W,
    pub identity: Identity,
    pub device_name: String,
}

fn json_response(status_code: u16, body: serde_json::Value) -> EndpointResponse {
    EndpointResponse {
        status_code,
        content_type: "application/json".to_string(),
        body: body.to_string(),
    }
}

fn error_response(status_code: u16, message: &str) -> EndpointResponse {
    json_response(status_code, json!({ "status": "error", "message": message }))
}

fn success_response(message: &str) -> EndpointResponse {
    json_response(200, json!({ "status": "success", "message": message }))
}

fn wifi_status_str(status: WifiStatus) -> &'static str {
    match status {
        WifiStatus::Disconnected => "disconnected",
        WifiStatus::Connecting => "connecting",
        WifiStatus::Connected => "connected",
        WifiStatus::Failed => "failed",
    }
}

impl<W: Wifi> Gateway<W> {
    pub fn new(state: GatewayState, wifi: W, identity: Identity, device_name: String) -> Self {
        Self {
            state,
            wifi,
            identity,
            device_name,
        }
    }

    /// Dispatch a request to its endpoint handler.
    pub fn route(&mut self, request: &EndpointRequest) -> EndpointResponse {
        match request.endpoint {
            Endpoint::WifiConfig => self.wifi_config(&request.content),
            Endpoint::WifiStatus => self.wifi_status(),
            Endpoint::SystemInfo => self.system_info(),
            Endpoint::WifiReset => self.wifi_reset(),
            Endpoint::CryptoInfo => self.crypto_info(),
            Endpoint::NameInfo => self.name_info(),
            Endpoint::WifiScan => self.wifi_scan(),
            Endpoint::Initialize => match request.method {
                zap_proto::Method::Post => self.initialize_post(&request.content),
                _ => self.initialize_get(),
            },
            Endpoint::BleStop => self.ble_stop(),
            Endpoint::CryptoSign => self.crypto_sign(&request.content),
            Endpoint::Unknown => error_response(404, "Endpoint not found"),
        }
    }

    fn wifi_config(&mut self, content: &str) -> EndpointResponse {
        let body: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => return error_response(400, "Invalid JSON"),
        };

        let ssid = body.get("ssid").and_then(|v| v.as_str()).unwrap_or("");
        let psk = body.get("psk").and_then(|v| v.as_str()).unwrap_or("");

        if ssid.is_empty() || psk.is_empty() {
            return error_response(400, "Missing credentials");
        }

        // The reply goes out before the association attempt; the
        // control loop runs the bounded connect.
        self.state.record_credentials(ssid, psk);
        success_response("WiFi credentials updated")
    }

    fn wifi_status(&mut self) -> EndpointResponse {
        json_response(
            200,
            json!({
                "connected": self.wifi.is_connected(),
                "ssid": self.state.ssid,
                "ip": self.wifi.ip_info().map(|info| info.ip_str()),
            }),
        )
    }

    fn system_info(&mut self) -> EndpointResponse {
        json_response(
            200,
            json!({
                "deviceId": self.identity.device_id,
                "deviceName": self.device_name,
                "version": FIRMWARE_VERSION,
                "uptime": self.state.uptime_ms() as u64,
                "provisioned": self.state.provisioned,
                "wifi": wifi_status_str(self.wifi.status()),
            }),
        )
    }

    fn wifi_reset(&mut self) -> EndpointResponse {
        if let Err(e) = self.wifi.disconnect() {
            eprintln!("WiFi disconnect failed: {e}");
        }
        self.state.clear_credentials();
        success_response("WiFi reset successful")
    }

    fn crypto_info(&mut self) -> EndpointResponse {
        if !self.identity.has_key() {
            return error_response(500, "Signing key unavailable");
        }
        json_response(
            200,
            json!({
                "deviceName": self.device_name,
                "serialNumber": self.identity.device_id,
                "publicKey": self.identity.public_key_hex(),
            }),
        )
    }

    fn name_info(&mut self) -> EndpointResponse {
        json_response(200, json!({ "name": self.identity.device_id }))
    }

    fn wifi_scan(&mut self) -> EndpointResponse {
        let now = Instant::now();
        if let Some(cached) = self.state.cached_scan(now) {
            return json_response(200, json!({ "ssids": cached }));
        }

        let results = match self.wifi.scan() {
            Ok(r) => r,
            Err(e) => return error_response(500, &format!("Scan failed: {e}")),
        };
        let ssids = results.into_iter().map(|r| r.ssid).collect();
        let stored = self.state.store_scan(ssids, now);
        json_response(200, json!({ "ssids": stored }))
    }

    fn initialize_get(&mut self) -> EndpointResponse {
        json_response(
            200,
            json!({
                "initialized": self.state.provisioned,
                "deviceId": self.identity.device_id,
            }),
        )
    }

    fn initialize_post(&mut self, content: &str) -> EndpointResponse {
        let body: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => return error_response(400, "Invalid JSON"),
        };

        let wallet = body.get("wallet").and_then(|v| v.as_str()).unwrap_or("");
        if wallet.is_empty() {
            return error_response(400, "Missing wallet");
        }

        let id_and_wallet = format!("{}:{}", self.identity.device_id, wallet);
        let signature = self.identity.sign_hex(&id_and_wallet);
        if signature.is_empty() {
            return error_response(500, "Signing failed");
        }

        json_response(
            200,
            json!({ "idAndWallet": id_and_wallet, "signature": signature }),
        )
    }

    fn crypto_sign(&mut self, content: &str) -> EndpointResponse {
        let body: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => return error_response(400, "Invalid JSON"),
        };

        let message = body.get("message").and_then(|v| v.as_str()).unwrap_or("");
        if message.is_empty() {
            return error_response(400, "Missing message");
        }

        let signature = self.identity.sign_hex(message);
        if signature.is_empty() {
            return error_response(500, "Signing failed");
        }

        json_response(200, json!({ "message": message, "sign": signature }))
    }

    fn ble_stop(&mut self) -> EndpointResponse {
        // Deferred so this response can still be read over BLE.
        self.state.schedule_ble_shutdown(Instant::now());
        success_response("BLE shutdown scheduled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWifi;
    use ed25519_dalek::SigningKey;
    use zap_proto::Method;

    fn gateway() -> Gateway<SimWifi> {
        Gateway::new(
            GatewayState::new(),
            SimWifi::new(),
            Identity::new(0xabcdef, Some(SigningKey::from_bytes(&[3u8; 32]))),
            "Zap Test".to_string(),
        )
    }

    fn request(method: Method, path: &str, content: &str) -> EndpointRequest {
        EndpointRequest {
            method,
            endpoint: Endpoint::resolve(method, path),
            content: content.to_string(),
            offset: 0,
        }
    }

    #[test]
    fn unknown_endpoint_is_fixed_404() {
        let mut gw = gateway();
        for method in [Method::Get, Method::Post, Method::Unknown] {
            let resp = gw.route(&request(method, "/api/bogus", ""));
            assert_eq!(resp.status_code, 404);
            assert_eq!(
                resp.body,
                r#"{"message":"Endpoint not found","status":"error"}"#
            );
        }
    }

    #[test]
    fn route_is_deterministic_over_unchanged_state() {
        // BLE pagination re-routes the same request once per chunk, so
        // repeated calls must produce byte-identical bodies.
        let mut gw = gateway();
        for path in ["/api/crypto", "/api/name", "/api/initialize"] {
            let req = request(Method::Get, path, "");
            let first = gw.route(&req);
            for _ in 0..3 {
                assert_eq!(gw.route(&req), first);
            }
        }
    }

    #[test]
    fn wifi_config_rejects_bad_bodies() {
        let mut gw = gateway();

        let resp = gw.route(&request(Method::Post, "/api/wifi", "not json"));
        assert_eq!(resp.status_code, 400);
        assert!(resp.body.contains("Invalid JSON"));

        let resp = gw.route(&request(Method::Post, "/api/wifi", r#"{"ssid":"net"}"#));
        assert_eq!(resp.status_code, 400);
        assert!(resp.body.contains("Missing credentials"));

        assert!(gw.state.take_pending_connect().is_none());
    }

    #[test]
    fn wifi_config_queues_credentials() {
        let mut gw = gateway();
        let resp = gw.route(&request(
            Method::Post,
            "/api/wifi",
            r#"{"ssid":"net","psk":"secret12"}"#,
        ));
        assert_eq!(resp.status_code, 200);
        assert!(resp.body.contains("WiFi credentials updated"));
        assert_eq!(
            gw.state.take_pending_connect(),
            Some(("net".to_string(), "secret12".to_string()))
        );
    }

    #[test]
    fn wifi_reset_clears_state() {
        let mut gw = gateway();
        gw.wifi.connect("net", "secret12").unwrap();
        gw.state.mark_provisioned("net".into(), "secret12".into());

        let resp = gw.route(&request(Method::Post, "/api/wifi/reset", ""));
        assert_eq!(resp.status_code, 200);
        assert!(!gw.state.provisioned);
        assert!(!gw.wifi.is_connected());
    }

    #[test]
    fn system_info_reports_identity_and_version() {
        let mut gw = gateway();
        let resp = gw.route(&request(Method::Get, "/api/system/info", ""));
        assert_eq!(resp.status_code, 200);

        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["deviceId"], gw.identity.device_id.as_str());
        assert_eq!(body["deviceName"], "Zap Test");
        assert_eq!(body["version"], FIRMWARE_VERSION);
        assert_eq!(body["provisioned"], false);
    }

    #[test]
    fn crypto_info_exposes_public_key() {
        let mut gw = gateway();
        let resp = gw.route(&request(Method::Get, "/api/crypto", ""));
        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["serialNumber"], gw.identity.device_id.as_str());
        assert_eq!(body["publicKey"], gw.identity.public_key_hex());
    }

    #[test]
    fn crypto_info_without_key_is_an_error() {
        let mut gw = gateway();
        gw.identity = Identity::new(1, None);
        let resp = gw.route(&request(Method::Get, "/api/crypto", ""));
        assert_eq!(resp.status_code, 500);
    }

    #[test]
    fn scan_serves_unique_sorted_ssids_from_cache() {
        let mut gw = gateway();
        let first = gw.route(&request(Method::Get, "/api/wifi/scan", ""));
        let body: serde_json::Value = serde_json::from_str(&first.body).unwrap();
        let ssids: Vec<&str> = body["ssids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();

        let mut sorted = ssids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ssids, sorted);

        // Second call inside the freshness window hits the cache and
        // must be byte-identical.
        assert_eq!(gw.route(&request(Method::Get, "/api/wifi/scan", "")), first);
    }

    #[test]
    fn initialize_signs_id_and_wallet() {
        let mut gw = gateway();
        let resp = gw.route(&request(
            Method::Post,
            "/api/initialize",
            r#"{"wallet":"Bygcy876b3bsjMvvhZxghvs3EyR5y6a7vpvAp5D62n2w"}"#,
        ));
        assert_eq!(resp.status_code, 200);

        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        let id_and_wallet = body["idAndWallet"].as_str().unwrap();
        assert_eq!(
            id_and_wallet,
            format!(
                "{}:Bygcy876b3bsjMvvhZxghvs3EyR5y6a7vpvAp5D62n2w",
                gw.identity.device_id
            )
        );
        assert_eq!(
            body["signature"].as_str().unwrap(),
            gw.identity.sign_hex(id_and_wallet)
        );
    }

    #[test]
    fn initialize_post_requires_wallet() {
        let mut gw = gateway();
        let resp = gw.route(&request(Method::Post, "/api/initialize", "{}"));
        assert_eq!(resp.status_code, 400);
    }

    #[test]
    fn crypto_sign_round_trip() {
        let mut gw = gateway();
        let resp = gw.route(&request(
            Method::Post,
            "/api/crypto/sign",
            r#"{"message":"hello"}"#,
        ));
        assert_eq!(resp.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["message"], "hello");
        assert_eq!(body["sign"].as_str().unwrap(), gw.identity.sign_hex("hello"));
    }

    #[test]
    fn ble_stop_schedules_shutdown() {
        let mut gw = gateway();
        let resp = gw.route(&request(Method::Post, "/api/ble/stop", ""));
        assert_eq!(resp.status_code, 200);
        assert!(gw.state.take_due_ble_shutdown(
            Instant::now() + crate::state::BLE_SHUTDOWN_DELAY
        ));
    }
}
