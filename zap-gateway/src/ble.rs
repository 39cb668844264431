//! BLE transport adapter - EGWTTP frames over a GATT server
//!
//! A write to the request characteristic carries one complete EGWTTP
//! request frame. The response is encoded at the client-supplied
//! offset and truncated to the transport frame limit; the client
//! retrieves the rest by re-sending the request with an advanced
//! offset. Each chunk request decodes and routes again - handlers are
//! cheap and deterministic, so no partial-response buffer is kept and
//! chunk requests may arrive in any order relative to other traffic.

use zap_mcu::{BleServer, Wifi};
use zap_proto::ble::MAX_FRAME_SIZE;
use zap_proto::{egwttp, Endpoint, EndpointRequest, Method};

use crate::mapper::Gateway;

/// Body of the response sent when a frame fails to decode.
pub const ERROR_INVALID_REQUEST: &str =
    r#"{"status":"error","message":"Invalid request format"}"#;

pub struct BleAdapter<B: BleServer> {
    server: B,
    active: bool,
}

impl<B: BleServer> BleAdapter<B> {
    pub fn new(server: B) -> Self {
        Self {
            server,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self, device_name: &str) -> Result<(), B::Error> {
        self.server.start_advertising(device_name)?;
        self.active = true;
        println!("BLE service started and advertising as {device_name}");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.server.stop() {
            eprintln!("BLE stop failed: {e}");
        }
        self.active = false;
        println!("BLE stopped and resources released");
    }

    /// One control-loop tick: keep advertising alive and drain pending
    /// request writes.
    pub fn tick<W: Wifi>(&mut self, gateway: &mut Gateway<W>) {
        if !self.active {
            return;
        }

        if let Err(e) = self.server.ensure_advertising() {
            eprintln!("BLE advertising restart failed: {e}");
        }

        while let Some(raw) = self.server.poll_write() {
            if raw.is_empty() {
                continue;
            }
            if let Some(frame) = handle_frame(&raw, gateway) {
                if let Err(e) = self.server.notify_response(&frame) {
                    eprintln!("BLE notify failed: {e}");
                }
            }
        }
    }
}

/// Decode, route and re-encode one request frame. Returns `None` only
/// when even the error frame cannot be encoded.
fn handle_frame<W: Wifi>(raw: &[u8], gateway: &mut Gateway<W>) -> Option<Vec<u8>> {
    let req = match egwttp::parse_request(raw) {
        Ok(req) => req,
        Err(e) => {
            eprintln!("BLE request rejected: {e}");
            return encode_or_log("", "", ERROR_INVALID_REQUEST.as_bytes(), 0);
        }
    };

    let method = Method::from_token(&req.method);
    let request = EndpointRequest {
        method,
        endpoint: Endpoint::resolve(method, &req.path),
        content: String::from_utf8_lossy(&req.body).into_owned(),
        offset: req.offset,
    };

    let response = gateway.route(&request);
    encode_or_log(&req.path, &req.method, response.body.as_bytes(), req.offset)
}

fn encode_or_log(location: &str, method: &str, body: &[u8], offset: usize) -> Option<Vec<u8>> {
    match egwttp::encode_response(location, method, body, offset, MAX_FRAME_SIZE) {
        Ok(frame) => Some(frame),
        Err(e) => {
            eprintln!("BLE response encode failed: {e}");
            None
        }
    }
}
