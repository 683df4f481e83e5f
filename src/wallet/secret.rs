//! In-memory signing secret
//!
//! The secret only exists after a successful vault decryption, a fresh key
//! generation or an explicit import. It zeroizes on drop and has no
//! serialization impl, so it cannot end up in a file or a log by accident.

use std::fmt;

use secrecy::{ExposeSecret, SecretSlice};

use crate::error::{Error, Result};

/// Raw private key bytes
pub struct Secret(SecretSlice<u8>);

impl Secret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(SecretSlice::new(bytes.into_boxed_slice()))
    }

    /// Import a hex-encoded key (with or without `0x` prefix)
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| Error::format(format!("secret is not valid hex: {}", e)))?;
        if bytes.is_empty() {
            return Err(Error::format("secret is empty"));
        }
        Ok(Self::new(bytes))
    }

    /// Borrow the raw bytes. Callers must not copy them into long-lived storage.
    pub fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.expose().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_accepts_prefix() {
        let a = Secret::from_hex("0xaabb").unwrap();
        let b = Secret::from_hex("aabb").unwrap();
        assert_eq!(a.expose(), &[0xaa_u8, 0xbb]);
        assert_eq!(a.expose(), b.expose());
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(matches!(Secret::from_hex("0xzz"), Err(Error::Format(_))));
        assert!(matches!(Secret::from_hex("0x"), Err(Error::Format(_))));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::new(vec![0xaa; 32]);
        let printed = format!("{:?}", secret);
        assert_eq!(printed, "Secret([REDACTED; 32 bytes])");
        assert!(!printed.contains("aa"));
    }
}
