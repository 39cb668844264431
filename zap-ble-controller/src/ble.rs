//! BLE client for Zap gateways
//!
//! Scan, discover and issue EGWTTP requests against a gateway's GATT
//! service.

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::time::Duration;
use uuid::Uuid;

use zap_proto::ble::{DEVICE_NAME_PREFIX, REQUEST_CHAR_UUID, RESPONSE_CHAR_UUID};
use zap_proto::egwttp::{encode_request, parse_response};

use crate::reassemble::Reassembler;

/// A discovered BLE device
#[derive(Debug, Clone)]
pub struct ZapDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    pub is_zap: bool,
}

/// Parse UUID string into uuid::Uuid
fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("invalid UUID in zap_proto")
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, Box<dyn std::error::Error>> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters
        .into_iter()
        .next()
        .ok_or_else(|| "No Bluetooth adapter found".into())
}

/// Scan for BLE devices
///
/// Returns a list of discovered devices. Zap gateways have `is_zap = true`.
pub async fn scan(duration_secs: u64) -> Result<Vec<ZapDevice>, Box<dyn std::error::Error>> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let address = peripheral.address().to_string();
            let rssi = props.rssi;
            // Match "Zap-xxx" or "nimble [Zap-xxx]" style names
            let is_zap = name.starts_with(DEVICE_NAME_PREFIX)
                || name.contains(&format!("[{DEVICE_NAME_PREFIX}"));

            devices.push(ZapDevice {
                name,
                address,
                rssi,
                is_zap,
            });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Find a gateway by name/address pattern, or find any Zap gateway
pub async fn find_device(target: Option<&str>) -> Result<Peripheral, Box<dyn std::error::Error>> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_default();
            let addr = peripheral.address().to_string();

            let matches = match target {
                Some(t) => name.contains(t) || addr.contains(t),
                None => {
                    name.starts_with(DEVICE_NAME_PREFIX)
                        || name.contains(&format!("[{DEVICE_NAME_PREFIX}"))
                }
            };

            if matches {
                adapter.stop_scan().await?;
                return Ok(peripheral);
            }
        }
    }

    adapter.stop_scan().await?;
    Err("No Zap gateway found".into())
}

fn find_char<'a>(
    characteristics: &'a std::collections::BTreeSet<Characteristic>,
    uuid: Uuid,
    what: &str,
) -> Result<&'a Characteristic, Box<dyn std::error::Error>> {
    characteristics
        .iter()
        .find(|c| c.uuid == uuid)
        .ok_or_else(|| format!("{what} characteristic not found").into())
}

/// Issue one EGWTTP request and reassemble the full response body.
///
/// The same request frame is re-sent with an advanced `Offset` header
/// until `Content-Length` bytes have arrived; the gateway re-routes
/// each time, so responses larger than one transport frame cost one
/// round trip per chunk.
///
/// # Arguments
/// * `target` - Device name/address pattern, or None for any gateway
/// * `method` - "GET" or "POST"
/// * `path` - endpoint path, e.g. "/api/system/info"
/// * `body` - request body (empty for GET)
pub async fn request(
    target: Option<&str>,
    method: &str,
    path: &str,
    body: &[u8],
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let device = find_device(target).await?;

    device.connect().await?;
    device.discover_services().await?;

    let characteristics = device.characteristics();
    let request_char = find_char(&characteristics, parse_uuid(REQUEST_CHAR_UUID), "Request")?;
    let response_char = find_char(&characteristics, parse_uuid(RESPONSE_CHAR_UUID), "Response")?;

    let mut reassembler = Reassembler::new();

    let result = loop {
        let frame = encode_request(method, path, reassembler.next_offset(), body);
        if let Err(e) = device
            .write(request_char, &frame, WriteType::WithResponse)
            .await
        {
            break Err(e.into());
        }

        let raw = match device.read(response_char).await {
            Ok(raw) => raw,
            Err(e) => break Err(e.into()),
        };

        let (head, chunk) = match parse_response(&raw) {
            Ok(parsed) => parsed,
            Err(e) => break Err(e.into()),
        };

        match reassembler.feed(&head, &chunk) {
            Ok(Some(full)) => break Ok(full),
            Ok(None) => continue,
            Err(e) => break Err(e.into()),
        }
    };

    let _ = device.disconnect().await;
    result
}
