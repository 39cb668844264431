//! Outbound telemetry - a signed JWT POSTed on a fixed interval
//!
//! Independent of the BLE/HTTP request protocol: while WiFi is up and
//! BLE is inactive, the control loop builds a fresh token and POSTs it
//! as a plain-text body. Failures are logged and retried on the next
//! cycle, never fatal.

use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;

use crate::identity::{Identity, JWT_HEADER};

/// Fixed telemetry interval.
pub const JWT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Signing produced an empty token; an empty JWT is a hard failure
    /// and must never go on the wire.
    #[error("signing produced an empty token")]
    EmptyToken,
    #[error("bad telemetry request: {0}")]
    Http(#[from] hyper::http::Error),
    #[error("telemetry POST failed: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),
    #[error("telemetry endpoint replied {0}")]
    Status(u16),
}

/// Claims carried by every telemetry token.
#[derive(serde::Serialize)]
struct TelemetryClaims<'a> {
    sub: &'a str,
    iat: u64,
    uptime: u64,
}

/// Build the telemetry token for this cycle.
pub fn telemetry_jwt(identity: &Identity, uptime_ms: u128) -> String {
    let iat = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let claims = TelemetryClaims {
        sub: &identity.device_id,
        iat,
        uptime: uptime_ms as u64,
    };

    // An unserializable payload yields the empty token, which callers
    // already treat as a hard failure.
    let payload = match serde_json::to_string(&claims) {
        Ok(payload) => payload,
        Err(_) => return String::new(),
    };

    identity.create_jwt(JWT_HEADER, &payload)
}

/// POST a token to the data endpoint. Returns the HTTP status on
/// success.
pub async fn send_jwt(data_url: &str, jwt: String) -> Result<u16, TelemetryError> {
    if jwt.is_empty() {
        return Err(TelemetryError::EmptyToken);
    }

    let client = hyper_util::client::legacy::Client::builder(
        hyper_util::rt::TokioExecutor::new(),
    )
    .build_http::<Full<Bytes>>();

    let request = hyper::Request::post(data_url)
        .header(hyper::header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from(jwt)))?;

    let response = client.request(request).await?;
    let status = response.status();

    if status.is_success() {
        Ok(status.as_u16())
    } else {
        Err(TelemetryError::Status(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    #[test]
    fn token_carries_device_id() {
        let identity = Identity::new(0x77, Some(SigningKey::from_bytes(&[1u8; 32])));
        let jwt = telemetry_jwt(&identity, 1234);

        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);

        let payload = data_encoding::BASE64URL_NOPAD
            .decode(parts[1].as_bytes())
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(payload["sub"], identity.device_id.as_str());
        assert_eq!(payload["uptime"], 1234);
        assert!(payload["iat"].is_u64());
    }

    #[test]
    fn missing_key_means_no_token() {
        let identity = Identity::new(0x77, None);
        assert_eq!(telemetry_jwt(&identity, 0), "");
    }

    #[tokio::test]
    async fn empty_token_is_never_sent() {
        // No listener needed: the empty token is rejected before any
        // connection is attempted.
        let err = send_jwt("http://127.0.0.1:1/gw/data/", String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::EmptyToken));
    }

    #[tokio::test]
    async fn posts_token_as_plain_text() {
        use http_body_util::BodyExt;

        // Minimal one-shot server capturing the POST.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let io = hyper_util::rt::TokioIo::new(stream);
            let (tx, rx) = tokio::sync::oneshot::channel();
            let tx = std::sync::Arc::new(std::sync::Mutex::new(Some(tx)));

            let service = hyper::service::service_fn(move |r: hyper::Request<hyper::body::Incoming>| {
                let tx = tx.clone();
                async move {
                    let content_type = r
                        .headers()
                        .get(hyper::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    let body = r.into_body().collect().await.unwrap().to_bytes();
                    if let Some(tx) = tx.lock().unwrap().take() {
                        let _ = tx.send((content_type, body));
                    }
                    Ok::<_, std::convert::Infallible>(hyper::Response::new(
                        http_body_util::Full::new(Bytes::from_static(b"ok")),
                    ))
                }
            });

            // Serve in the background; the channel fires as soon as the
            // request lands, regardless of when the connection closes.
            tokio::spawn(async move {
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(io, service)
                    .await;
            });
            rx.await.unwrap()
        });

        let identity = Identity::new(0x9, Some(SigningKey::from_bytes(&[2u8; 32])));
        let jwt = telemetry_jwt(&identity, 5);
        let status = send_jwt(&format!("http://{addr}/gw/data/"), jwt.clone())
            .await
            .unwrap();
        assert_eq!(status, 200);

        let (content_type, body) = server.await.unwrap();
        assert_eq!(content_type, "text/plain");
        assert_eq!(body, Bytes::from(jwt));
    }
}
