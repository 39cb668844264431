//! Identity and signing - device id derivation, detached signatures,
//! compact JWTs
//!
//! The device id is derived once from a hardware-unique seed and never
//! regenerated; downstream systems parse it, so the 18-character
//! padding/truncation rule is exact. The signing key is an Ed25519 key
//! stored hex-encoded under `ZAP_HOME`.

use std::path::{Path, PathBuf};

use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};

/// Fixed width of the device id.
pub const DEVICE_ID_LEN: usize = 18;

/// Pad character for short ids.
const DEVICE_ID_PAD: char = 'e';

/// Compact JWT header used for all gateway tokens.
pub const JWT_HEADER: &str = r#"{"alg":"EdDSA","typ":"JWT"}"#;

const KEY_FILE: &str = "gateway.key";

/// Get the ZAP_HOME directory, creating it if needed.
pub fn zap_home() -> PathBuf {
    let home = std::env::var("ZAP_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .expect("no home directory")
                .join(".zap")
        });

    if !home.exists() {
        std::fs::create_dir_all(&home).expect("failed to create ZAP_HOME");
    }

    home
}

pub fn create_key(home: &Path) {
    let path = home.join(KEY_FILE);

    if path.exists() {
        eprintln!("Key already exists at {}", path.display());
        std::process::exit(1);
    }

    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    let hex = data_encoding::HEXLOWER.encode(&key.to_bytes());

    std::fs::write(&path, hex).unwrap_or_else(|e| {
        eprintln!("Failed to write key to {}: {e}", path.display());
        std::process::exit(1);
    });

    println!("Created key at {}", path.display());
    println!(
        "Public key: {}",
        data_encoding::HEXLOWER.encode(&key.verifying_key().to_bytes())
    );
}

#[derive(Debug, thiserror::Error)]
pub enum ReadKeyError {
    #[error("signing key file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read signing key file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid signing key format: {0}")]
    Parse(String),
}

pub fn read_key(home: &Path) -> Result<SigningKey, ReadKeyError> {
    let path = home.join(KEY_FILE);

    if !path.exists() {
        return Err(ReadKeyError::NotFound(path));
    }

    let content = std::fs::read_to_string(&path)?;
    let bytes = data_encoding::HEXLOWER
        .decode(content.trim().as_bytes())
        .map_err(|e| ReadKeyError::Parse(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ReadKeyError::Parse("key must be 32 bytes".to_string()))?;

    Ok(SigningKey::from_bytes(&bytes))
}

/// Hardware-unique seed: the MAC of the first non-loopback network
/// interface, or a stable hash of the hostname when no interface
/// exposes one. The same box always derives the same id.
pub fn hardware_seed() -> u64 {
    mac_seed().unwrap_or_else(hostname_seed)
}

fn mac_seed() -> Option<u64> {
    let mut interfaces: Vec<String> = std::fs::read_dir("/sys/class/net")
        .ok()?
        .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
        .filter(|name| name != "lo")
        .collect();
    // Interface enumeration order is not stable; the derived id must be.
    interfaces.sort();

    for name in interfaces {
        let path = Path::new("/sys/class/net").join(&name).join("address");
        if let Ok(text) = std::fs::read_to_string(&path) {
            if let Some(seed) = parse_mac(&text) {
                return Some(seed);
            }
        }
    }
    None
}

/// Parse a colon-separated MAC into the low 48 bits of a seed.
/// All-zero MACs (interfaces without hardware addresses) are skipped.
fn parse_mac(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() != 6 {
        return None;
    }

    let mut bytes = [0u8; 8];
    for (i, part) in parts.iter().enumerate() {
        bytes[2 + i] = u8::from_str_radix(part, 16).ok()?;
    }

    if bytes.iter().all(|&b| b == 0) {
        None
    } else {
        Some(u64::from_be_bytes(bytes))
    }
}

fn hostname_seed() -> u64 {
    let hostname = std::env::var("HOSTNAME")
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "zap-host".to_string());

    let digest = Sha256::digest(hostname.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}

/// Derive the fixed-width device id from the hardware seed.
pub fn device_id(seed: u64) -> String {
    pad_device_id(format!("zap-{:016x}", seed))
}

/// Truncate or right-pad to exactly [`DEVICE_ID_LEN`] characters.
fn pad_device_id(mut id: String) -> String {
    if id.len() > DEVICE_ID_LEN {
        id.truncate(DEVICE_ID_LEN);
    } else {
        while id.len() < DEVICE_ID_LEN {
            id.push(DEVICE_ID_PAD);
        }
    }
    id
}

/// Device identity: fixed id plus the optional signing key.
///
/// All signing operations return empty strings when no key is loaded;
/// callers treat an empty signature or token as a hard failure and
/// never transmit it.
pub struct Identity {
    pub device_id: String,
    key: Option<SigningKey>,
}

impl Identity {
    pub fn new(seed: u64, key: Option<SigningKey>) -> Self {
        Self {
            device_id: device_id(seed),
            key,
        }
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Hex of the public key, empty without a key.
    pub fn public_key_hex(&self) -> String {
        match &self.key {
            Some(key) => data_encoding::HEXLOWER.encode(&key.verifying_key().to_bytes()),
            None => String::new(),
        }
    }

    /// Detached signature, raw hex encoding.
    pub fn sign_hex(&self, message: &str) -> String {
        match &self.key {
            Some(key) => {
                data_encoding::HEXLOWER.encode(&key.sign(message.as_bytes()).to_bytes())
            }
            None => String::new(),
        }
    }

    /// Detached signature, URL-safe base64 without padding (JWT
    /// compatible).
    pub fn sign_base64url(&self, message: &str) -> String {
        match &self.key {
            Some(key) => {
                data_encoding::BASE64URL_NOPAD.encode(&key.sign(message.as_bytes()).to_bytes())
            }
            None => String::new(),
        }
    }

    /// Standard compact JWT serialization: base64url(header) "."
    /// base64url(payload) "." base64url(sign(header "." payload)).
    pub fn create_jwt(&self, header: &str, payload: &str) -> String {
        if self.key.is_none() {
            return String::new();
        }

        let signing_input = format!(
            "{}.{}",
            data_encoding::BASE64URL_NOPAD.encode(header.as_bytes()),
            data_encoding::BASE64URL_NOPAD.encode(payload.as_bytes())
        );
        let signature = self.sign_base64url(&signing_input);
        if signature.is_empty() {
            return String::new();
        }

        format!("{}.{}", signing_input, signature)
    }
}
