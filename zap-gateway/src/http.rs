//! HTTP transport adapter - the same endpoint catalog over hyper
//!
//! HTTP needs no EGWTTP framing: the request body arrives whole and
//! the full response body goes back in one piece, so the adapter maps
//! (method, path) through the catalog, routes, and copies the
//! handler's status/content-type/body onto a plain HTTP response.

use http_body_util::BodyExt;
use zap_mcu::Wifi;
use zap_proto::{Endpoint, EndpointRequest, EndpointResponse, Method};

use crate::mapper::Gateway;

pub type HttpResult<E = std::io::Error> = Result<HttpResponse, E>;

pub type HttpResponse =
    hyper::Response<http_body_util::combinators::BoxBody<hyper::body::Bytes, std::io::Error>>;

pub type SharedGateway<W> = std::sync::Arc<tokio::sync::Mutex<Gateway<W>>>;

const SETUP_PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>Zap Gateway Setup</title></head>\n<body>\n<h1>Zap Gateway</h1>\n<p>This gateway is not provisioned yet. Configure WiFi over BLE, or\nPOST credentials as <code>{\"ssid\":\"...\",\"psk\":\"...\"}</code> to\n<code>/api/wifi</code>.</p>\n</body>\n</html>\n";

pub async fn run_server<W>(addr: String, gateway: SharedGateway<W>) -> std::io::Result<()>
where
    W: Wifi + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("Listening on http://{addr}");

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                tokio::task::spawn(handle_connection(stream, gateway.clone()));
            }
            Err(e) => {
                eprintln!("failed to accept: {e:?}");
                continue;
            }
        }
    }
}

async fn handle_connection<W>(stream: tokio::net::TcpStream, gateway: SharedGateway<W>)
where
    W: Wifi + Send + 'static,
{
    let io = hyper_util::rt::TokioIo::new(stream);

    let builder =
        hyper_util::server::conn::auto::Builder::new(hyper_util::rt::tokio::TokioExecutor::new());
    let conn = builder.serve_connection(
        io,
        hyper::service::service_fn(move |r| handle_request(r, gateway.clone())),
    );

    if let Err(e) = conn.await {
        eprintln!("connection error: {e:?}");
    }
}

async fn handle_request<W>(
    r: hyper::Request<hyper::body::Incoming>,
    gateway: SharedGateway<W>,
) -> HttpResult
where
    W: Wifi + Send + 'static,
{
    let method = match *r.method() {
        hyper::Method::GET => Method::Get,
        hyper::Method::POST => Method::Post,
        _ => Method::Unknown,
    };
    let path = r.uri().path().to_string();

    let body = r
        .into_body()
        .collect()
        .await
        .map_err(std::io::Error::other)?
        .to_bytes();

    // Root serves the setup page, or redirects once provisioned.
    if path == "/" && method == Method::Get {
        let provisioned = gateway.lock().await.state.provisioned;
        return if provisioned {
            found(Endpoint::SystemInfo.path())
        } else {
            bytes_to_resp(
                SETUP_PAGE.as_bytes().to_vec(),
                hyper::StatusCode::OK,
                "text/html",
            )
        };
    }

    let request = EndpointRequest {
        method,
        endpoint: Endpoint::resolve(method, &path),
        content: String::from_utf8_lossy(&body).into_owned(),
        offset: 0,
    };

    let response = gateway.lock().await.route(&request);
    endpoint_to_resp(response)
}

pub fn endpoint_to_resp(response: EndpointResponse) -> HttpResult {
    let status = hyper::StatusCode::from_u16(response.status_code)
        .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
    bytes_to_resp(response.body.into_bytes(), status, &response.content_type)
}

fn bytes_to_resp(bytes: Vec<u8>, status: hyper::StatusCode, content_type: &str) -> HttpResult {
    let mut r = hyper::Response::new(
        http_body_util::Full::new(hyper::body::Bytes::from(bytes))
            .map_err(|e| match e {})
            .boxed(),
    );
    *r.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        r.headers_mut().insert(hyper::header::CONTENT_TYPE, value);
    }
    Ok(r)
}

fn found(location: &'static str) -> HttpResult {
    let mut r = bytes_to_resp(Vec::new(), hyper::StatusCode::FOUND, "text/plain")?;
    r.headers_mut().insert(
        hyper::header::LOCATION,
        hyper::header::HeaderValue::from_static(location),
    );
    Ok(r)
}
