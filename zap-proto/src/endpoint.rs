//! Endpoint catalog - logical operations and the (method, path) pairs
//! that select them.
//!
//! The catalog is shared by both transports: the HTTP adapter registers
//! one route per entry, and the BLE adapter resolves decoded request
//! frames through [`Endpoint::resolve`]. Anything that does not match
//! exactly resolves to [`Endpoint::Unknown`], whose handler produces a
//! fixed not-found payload.

/// Request method carried in an EGWTTP request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Unknown,
}

impl Method {
    /// Parse a method token. Anything but GET/POST is `Unknown`, not an error.
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operations exposed identically over BLE and HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    WifiConfig,
    WifiStatus,
    SystemInfo,
    WifiReset,
    CryptoInfo,
    NameInfo,
    WifiScan,
    Initialize,
    BleStop,
    CryptoSign,
    Unknown,
}

impl Endpoint {
    /// Exact-match (method, path) table. No entry matches -> `Unknown`.
    pub fn resolve(method: Method, path: &str) -> Endpoint {
        match (method, path) {
            (Method::Post, "/api/wifi") => Endpoint::WifiConfig,
            (Method::Get, "/api/wifi") => Endpoint::WifiStatus,
            (Method::Get, "/api/system/info") => Endpoint::SystemInfo,
            (Method::Post, "/api/wifi/reset") => Endpoint::WifiReset,
            (Method::Get, "/api/crypto") => Endpoint::CryptoInfo,
            (Method::Get, "/api/name") => Endpoint::NameInfo,
            (Method::Get, "/api/wifi/scan") => Endpoint::WifiScan,
            (Method::Get, "/api/initialize") => Endpoint::Initialize,
            (Method::Post, "/api/initialize") => Endpoint::Initialize,
            (Method::Post, "/api/ble/stop") => Endpoint::BleStop,
            (Method::Post, "/api/crypto/sign") => Endpoint::CryptoSign,
            _ => Endpoint::Unknown,
        }
    }

    /// Canonical path; `resolve` maps it back under the endpoint's
    /// method(s). Transport adapters use it wherever they need a path
    /// for an endpoint rather than the other way around.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::WifiConfig | Endpoint::WifiStatus => "/api/wifi",
            Endpoint::SystemInfo => "/api/system/info",
            Endpoint::WifiReset => "/api/wifi/reset",
            Endpoint::CryptoInfo => "/api/crypto",
            Endpoint::NameInfo => "/api/name",
            Endpoint::WifiScan => "/api/wifi/scan",
            Endpoint::Initialize => "/api/initialize",
            Endpoint::BleStop => "/api/ble/stop",
            Endpoint::CryptoSign => "/api/crypto/sign",
            Endpoint::Unknown => "/",
        }
    }
}

/// A resolved request, ready for the router.
///
/// `offset` is only meaningful for response pagination over BLE; it
/// never applies to the request body.
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    pub method: Method,
    pub endpoint: Endpoint,
    pub content: String,
    pub offset: usize,
}

/// A full, untruncated handler response. Transport adapters may slice
/// the body multiple times without re-invoking business logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status_code: u16,
    pub content_type: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_paths() {
        assert_eq!(
            Endpoint::resolve(Method::Post, "/api/wifi"),
            Endpoint::WifiConfig
        );
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/wifi"),
            Endpoint::WifiStatus
        );
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/system/info"),
            Endpoint::SystemInfo
        );
        assert_eq!(
            Endpoint::resolve(Method::Post, "/api/wifi/reset"),
            Endpoint::WifiReset
        );
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/crypto"),
            Endpoint::CryptoInfo
        );
        assert_eq!(Endpoint::resolve(Method::Get, "/api/name"), Endpoint::NameInfo);
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/wifi/scan"),
            Endpoint::WifiScan
        );
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/initialize"),
            Endpoint::Initialize
        );
        assert_eq!(
            Endpoint::resolve(Method::Post, "/api/initialize"),
            Endpoint::Initialize
        );
        assert_eq!(
            Endpoint::resolve(Method::Post, "/api/ble/stop"),
            Endpoint::BleStop
        );
        assert_eq!(
            Endpoint::resolve(Method::Post, "/api/crypto/sign"),
            Endpoint::CryptoSign
        );
    }

    #[test]
    fn resolve_requires_exact_method() {
        // Wrong method on a known path is a miss, not a partial match.
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/ble/stop"),
            Endpoint::Unknown
        );
        assert_eq!(
            Endpoint::resolve(Method::Post, "/api/system/info"),
            Endpoint::Unknown
        );
        assert_eq!(
            Endpoint::resolve(Method::Unknown, "/api/wifi"),
            Endpoint::Unknown
        );
    }

    #[test]
    fn resolve_unknown_path() {
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/nope"),
            Endpoint::Unknown
        );
        assert_eq!(Endpoint::resolve(Method::Post, ""), Endpoint::Unknown);
        // Prefixes and trailing slashes do not match.
        assert_eq!(
            Endpoint::resolve(Method::Get, "/api/wifi/"),
            Endpoint::Unknown
        );
    }

    #[test]
    fn canonical_paths_resolve_back() {
        for (method, endpoint) in [
            (Method::Post, Endpoint::WifiConfig),
            (Method::Get, Endpoint::WifiStatus),
            (Method::Get, Endpoint::SystemInfo),
            (Method::Post, Endpoint::WifiReset),
            (Method::Get, Endpoint::CryptoInfo),
            (Method::Get, Endpoint::NameInfo),
            (Method::Get, Endpoint::WifiScan),
            (Method::Get, Endpoint::Initialize),
            (Method::Post, Endpoint::Initialize),
            (Method::Post, Endpoint::BleStop),
            (Method::Post, Endpoint::CryptoSign),
        ] {
            assert_eq!(Endpoint::resolve(method, endpoint.path()), endpoint);
        }
    }

    #[test]
    fn method_tokens() {
        assert_eq!(Method::from_token("GET"), Method::Get);
        assert_eq!(Method::from_token("POST"), Method::Post);
        assert_eq!(Method::from_token("get"), Method::Unknown);
        assert_eq!(Method::from_token("DELETE"), Method::Unknown);
        assert_eq!(Method::Post.as_str(), "POST");
    }
}
