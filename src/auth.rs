//! HMAC request authentication for the CLOB and builder APIs
//!
//! Both schemes sign `timestamp + method + path + body` with HMAC-SHA256 and
//! send the MAC as URL-safe base64 (the encoding Polymarket's SDKs use).
//! They differ in timestamp resolution and header names:
//!
//! - builder: milliseconds, `POLY_BUILDER_*` headers
//! - L2: seconds, `POLY_*` headers plus the account address

use std::sync::Arc;

use alloy::primitives::Address;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use sha2::Sha256;
use tracing::debug;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

pub const POLY_BUILDER_API_KEY: &str = "POLY_BUILDER_API_KEY";
pub const POLY_BUILDER_TIMESTAMP: &str = "POLY_BUILDER_TIMESTAMP";
pub const POLY_BUILDER_SIGNATURE: &str = "POLY_BUILDER_SIGNATURE";
pub const POLY_BUILDER_PASSPHRASE: &str = "POLY_BUILDER_PASSPHRASE";

pub const POLY_ADDRESS: &str = "POLY_ADDRESS";
pub const POLY_API_KEY: &str = "POLY_API_KEY";
pub const POLY_TIMESTAMP: &str = "POLY_TIMESTAMP";
pub const POLY_SIGNATURE: &str = "POLY_SIGNATURE";
pub const POLY_PASSPHRASE: &str = "POLY_PASSPHRASE";

/// HMAC-SHA256 over `timestamp || method || path || body`, URL-safe base64
pub fn sign_request(secret: &[u8], method: &str, path: &str, body: &[u8], timestamp: u64) -> Result<String> {
    if secret.is_empty() {
        return Err(Error::validation("HMAC secret is empty"));
    }
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::validation(format!("method {:?} must be uppercase letters", method)));
    }
    if !path.starts_with('/') || path.chars().any(char::is_whitespace) {
        return Err(Error::validation(format!("path {:?} must start with '/' and contain no whitespace", path)));
    }

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| Error::validation(format!("HMAC key: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(method.as_bytes());
    mac.update(path.as_bytes());
    mac.update(body);

    Ok(base64::engine::general_purpose::URL_SAFE.encode(mac.finalize().into_bytes()))
}

/// Decode an API secret the way the dashboard hands it out (any base64 flavour)
fn decode_secret(encoded: &str) -> Result<Vec<u8>> {
    let encoded = encoded.trim();
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(encoded))
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(encoded))
        .map_err(|e| Error::validation(format!("API secret is not base64: {}", e)))
}

/// API key, decoded HMAC secret and passphrase
#[derive(Debug)]
pub struct ApiCredentials {
    key: String,
    secret: SecretSlice<u8>,
    passphrase: SecretString,
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>, secret_b64: &str, passphrase: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::validation("API key is empty"));
        }
        let secret = decode_secret(secret_b64)?;
        if secret.is_empty() {
            return Err(Error::validation("API secret is empty"));
        }
        Ok(Self {
            key,
            secret: SecretSlice::from(secret),
            passphrase: SecretString::from(passphrase.into()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Time source for request timestamps
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Frozen clock for reproducible signatures
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Resolution of the signed timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    Seconds,
    Millis,
}

impl TimestampUnit {
    fn from_millis(self, millis: u64) -> u64 {
        match self {
            TimestampUnit::Seconds => millis / 1000,
            TimestampUnit::Millis => millis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Builder,
    L2 { address: Address },
}

/// One signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub key_id: String,
    pub timestamp: u64,
    pub signature: String,
}

/// Signs outgoing API requests with one set of credentials
pub struct RequestAuthenticator {
    credentials: ApiCredentials,
    scheme: Scheme,
    clock: Arc<dyn Clock>,
}

impl RequestAuthenticator {
    /// Builder relay / order attribution scheme
    pub fn builder(credentials: ApiCredentials) -> Self {
        Self {
            credentials,
            scheme: Scheme::Builder,
            clock: Arc::new(SystemClock),
        }
    }

    /// CLOB L2 scheme for the account at `address`
    pub fn l2(credentials: ApiCredentials, address: Address) -> Self {
        Self {
            credentials,
            scheme: Scheme::L2 { address },
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn key_id(&self) -> &str {
        self.credentials.key()
    }

    pub fn timestamp_unit(&self) -> TimestampUnit {
        match self.scheme {
            Scheme::Builder => TimestampUnit::Millis,
            Scheme::L2 { .. } => TimestampUnit::Seconds,
        }
    }

    /// Sign with an explicit timestamp (already in this scheme's unit)
    pub fn sign(&self, method: &str, path: &str, body: &[u8], timestamp: u64) -> Result<AuthHeaders> {
        let signature = sign_request(
            self.credentials.secret.expose_secret(),
            method,
            path,
            body,
            timestamp,
        )?;

        debug!(
            "[Auth] Signed {} {} ts={} body_len={}",
            method,
            path,
            timestamp,
            body.len()
        );

        Ok(AuthHeaders {
            key_id: self.credentials.key.clone(),
            timestamp,
            signature,
        })
    }

    /// Sign with the current time from the clock
    pub fn authenticate(&self, method: &str, path: &str, body: &[u8]) -> Result<AuthHeaders> {
        let timestamp = self.timestamp_unit().from_millis(self.clock.now_millis());
        self.sign(method, path, body, timestamp)
    }

    /// Header list for the transport, in a stable order
    pub fn header_pairs(&self, headers: &AuthHeaders) -> Vec<(&'static str, String)> {
        let passphrase = self.credentials.passphrase.expose_secret().to_string();
        match self.scheme {
            Scheme::Builder => vec![
                (POLY_BUILDER_API_KEY, headers.key_id.clone()),
                (POLY_BUILDER_TIMESTAMP, headers.timestamp.to_string()),
                (POLY_BUILDER_SIGNATURE, headers.signature.clone()),
                (POLY_BUILDER_PASSPHRASE, passphrase),
            ],
            Scheme::L2 { address } => vec![
                (POLY_ADDRESS, address.to_checksum(None)),
                (POLY_API_KEY, headers.key_id.clone()),
                (POLY_TIMESTAMP, headers.timestamp.to_string()),
                (POLY_SIGNATURE, headers.signature.clone()),
                (POLY_PASSPHRASE, passphrase),
            ],
        }
    }
}

impl std::fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("key", &self.credentials.key)
            .field("scheme", &self.scheme)
            .finish()
    }
}
