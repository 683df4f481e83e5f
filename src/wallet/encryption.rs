//! Private key encryption using AES-256-GCM with PBKDF2-HMAC-SHA256 key derivation
//!
//! The vault keeps the GCM tag in its own `mac` field so a truncated or
//! spliced record is caught by [`EncryptedVault::validate`] before any key
//! derivation happens.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Key, Nonce, Tag,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::zeroize::Zeroize;
use secrecy::{ExposeSecret, ExposeSecretMut, SecretBox};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use super::secret::Secret;
use crate::error::{Error, Result};

/// Current vault record version
pub const VAULT_VERSION: u8 = 1;
/// Default PBKDF2 rounds for new vaults
pub const DEFAULT_ITERATIONS: u32 = 480_000;
/// Vaults below this round count are refused both ways
pub const MIN_ITERATIONS: u32 = 100_000;
/// Vaults above this round count are refused both ways
pub const MAX_ITERATIONS: u32 = 10_000_000;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const MAC_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Bound into every tag so a record cannot be replayed under another format
const ASSOCIATED_DATA: &[u8] = b"polymarket-gasless/vault/v1";

/// Key derivation function recorded in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kdf {
    #[serde(rename = "pbkdf2-sha256")]
    Pbkdf2Sha256,
}

/// Encrypted signing key with everything needed for decryption except the password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVault {
    pub version: u8,
    pub kdf: Kdf,
    /// PBKDF2 salt (16 bytes)
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
    pub iterations: u32,
    /// AES-GCM nonce (12 bytes)
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
    /// AES-256-GCM ciphertext without the tag
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
    /// AES-GCM authentication tag (16 bytes)
    #[serde(with = "hex_bytes")]
    pub mac: Vec<u8>,
}

impl EncryptedVault {
    /// Structural checks only; says nothing about the password
    pub fn validate(&self) -> Result<()> {
        if self.version != VAULT_VERSION {
            return Err(Error::format(format!("unsupported vault version {}", self.version)));
        }
        if self.salt.len() < SALT_LEN {
            return Err(Error::format(format!(
                "salt is {} bytes, need at least {}",
                self.salt.len(),
                SALT_LEN
            )));
        }
        if self.iterations < MIN_ITERATIONS {
            return Err(Error::format(format!(
                "{} iterations is below the minimum of {}",
                self.iterations, MIN_ITERATIONS
            )));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(Error::format(format!(
                "{} iterations is above the maximum of {}",
                self.iterations, MAX_ITERATIONS
            )));
        }
        if self.nonce.len() != NONCE_LEN {
            return Err(Error::format(format!("nonce is {} bytes, expected {}", self.nonce.len(), NONCE_LEN)));
        }
        if self.mac.len() != MAC_LEN {
            return Err(Error::format(format!("mac is {} bytes, expected {}", self.mac.len(), MAC_LEN)));
        }
        if self.ciphertext.is_empty() {
            return Err(Error::format("ciphertext is empty"));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::format(format!("failed to encode vault: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let vault: Self =
            serde_json::from_str(json).map_err(|e| Error::format(format!("failed to parse vault: {}", e)))?;
        vault.validate()?;
        Ok(vault)
    }
}

/// Encrypt a secret with a user-provided password
///
/// Fresh salt and nonce are drawn on every call, so encrypting the same
/// secret twice never yields the same record.
pub fn encrypt(secret: &[u8], password: &str, iterations: u32) -> Result<EncryptedVault> {
    if iterations < MIN_ITERATIONS {
        return Err(Error::validation(format!(
            "{} iterations is below the minimum of {}",
            iterations, MIN_ITERATIONS
        )));
    }
    if iterations > MAX_ITERATIONS {
        return Err(Error::validation(format!(
            "{} iterations is above the maximum of {}",
            iterations, MAX_ITERATIONS
        )));
    }
    if secret.is_empty() {
        return Err(Error::validation("refusing to encrypt an empty secret"));
    }

    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let key = derive_key(password, &salt, iterations);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));

    let mut buffer = secret.to_vec();
    let tag = match cipher.encrypt_in_place_detached(Nonce::from_slice(&nonce), ASSOCIATED_DATA, &mut buffer) {
        Ok(tag) => tag,
        Err(_) => {
            buffer.zeroize();
            return Err(Error::validation("secret is too large to encrypt"));
        }
    };

    debug!("[Vault] Sealed {} byte secret ({} iterations)", secret.len(), iterations);

    Ok(EncryptedVault {
        version: VAULT_VERSION,
        kdf: Kdf::Pbkdf2Sha256,
        salt: salt.to_vec(),
        iterations,
        nonce: nonce.to_vec(),
        ciphertext: buffer,
        mac: tag.to_vec(),
    })
}

/// Decrypt a vault using the user's password
pub fn decrypt(vault: &EncryptedVault, password: &str) -> Result<Secret> {
    vault.validate()?;
    let key = derive_key(password, &vault.salt, vault.iterations);
    open(&key, vault)
}

/// Re-encrypt under a new password with fresh salt and nonce
pub fn rotate(vault: &EncryptedVault, old_password: &str, new_password: &str, iterations: u32) -> Result<EncryptedVault> {
    let secret = decrypt(vault, old_password)?;
    encrypt(secret.expose(), new_password, iterations)
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> SecretBox<[u8; KEY_LEN]> {
    let mut key = SecretBox::new(Box::new([0u8; KEY_LEN]));
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, key.expose_secret_mut());
    key
}

fn open(key: &SecretBox<[u8; KEY_LEN]>, vault: &EncryptedVault) -> Result<Secret> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
    let mut buffer = vault.ciphertext.clone();

    let opened = cipher.decrypt_in_place_detached(
        Nonce::from_slice(&vault.nonce),
        ASSOCIATED_DATA,
        &mut buffer,
        Tag::from_slice(&vault.mac),
    );
    if opened.is_err() {
        buffer.zeroize();
        return Err(Error::Authentication);
    }

    Ok(Secret::new(buffer))
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const TEST_ITERATIONS: u32 = MIN_ITERATIONS;

    #[test]
    fn test_encrypt_decrypt() {
        let secret = [0xaa_u8; 32];
        let password = "my_secure_password";

        let vault = encrypt(&secret, password, TEST_ITERATIONS).unwrap();
        let decrypted = decrypt(&vault, password).unwrap();

        assert_eq!(decrypted.expose(), &secret);
    }

    #[test]
    fn test_round_trip_secret_lengths() {
        let mut rng = rand::thread_rng();
        for len in [16usize, 31, 32, 48, 64] {
            let mut secret = vec![0u8; len];
            rng.fill_bytes(&mut secret);
            let password: String = format!("pw-{}", rng.gen::<u32>());

            let vault = encrypt(&secret, &password, TEST_ITERATIONS).unwrap();
            assert_eq!(vault.ciphertext.len(), len);
            assert_eq!(decrypt(&vault, &password).unwrap().expose(), secret.as_slice());
        }
    }

    #[test]
    fn test_wrong_password() {
        let vault = encrypt(&[0x11; 32], "correct-horse", 100_000).unwrap();
        let result = decrypt(&vault, "wrong-horse");

        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_fresh_salt_and_nonce_each_time() {
        let a = encrypt(&[7; 32], "pw", TEST_ITERATIONS).unwrap();
        let b = encrypt(&[7; 32], "pw", TEST_ITERATIONS).unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_every_byte_flip_is_detected() {
        let password = "tamper";
        let vault = encrypt(&[0x42; 32], password, TEST_ITERATIONS).unwrap();
        // Derive once; each flip only needs the cheap GCM check
        let key = derive_key(password, &vault.salt, vault.iterations);

        for i in 0..vault.ciphertext.len() {
            let mut tampered = vault.clone();
            tampered.ciphertext[i] ^= 0x01;
            assert!(matches!(open(&key, &tampered), Err(Error::Authentication)), "ciphertext byte {}", i);
        }
        for i in 0..vault.mac.len() {
            let mut tampered = vault.clone();
            tampered.mac[i] ^= 0x80;
            assert!(matches!(open(&key, &tampered), Err(Error::Authentication)), "mac byte {}", i);
        }
        assert!(open(&key, &vault).is_ok());
    }

    #[test]
    fn test_tampered_vault_through_public_api() {
        let mut vault = encrypt(&[0x42; 32], "pw", TEST_ITERATIONS).unwrap();
        vault.ciphertext[0] ^= 0xff;
        assert!(matches!(decrypt(&vault, "pw"), Err(Error::Authentication)));
    }

    #[test]
    fn test_malformed_vault_is_format_error() {
        let vault = encrypt(&[1; 32], "pw", TEST_ITERATIONS).unwrap();

        let mut short_salt = vault.clone();
        short_salt.salt.truncate(8);
        assert!(matches!(decrypt(&short_salt, "pw"), Err(Error::Format(_))));

        let mut short_mac = vault.clone();
        short_mac.mac.pop();
        assert!(matches!(decrypt(&short_mac, "pw"), Err(Error::Format(_))));

        let mut bad_nonce = vault.clone();
        bad_nonce.nonce.push(0);
        assert!(matches!(decrypt(&bad_nonce, "pw"), Err(Error::Format(_))));

        let mut weak = vault.clone();
        weak.iterations = 1_000;
        assert!(matches!(decrypt(&weak, "pw"), Err(Error::Format(_))));

        let mut hostile = vault.clone();
        hostile.iterations = u32::MAX;
        assert!(matches!(decrypt(&hostile, "pw"), Err(Error::Format(_))));

        let mut empty = vault.clone();
        empty.ciphertext.clear();
        assert!(matches!(decrypt(&empty, "pw"), Err(Error::Format(_))));

        let mut future = vault;
        future.version = 2;
        assert!(matches!(decrypt(&future, "pw"), Err(Error::Format(_))));
    }

    #[test]
    fn test_encrypt_rejects_weak_parameters() {
        assert!(matches!(encrypt(&[1; 32], "pw", 99_999), Err(Error::Validation(_))));
        assert!(matches!(encrypt(&[1; 32], "pw", MAX_ITERATIONS + 1), Err(Error::Validation(_))));
        assert!(matches!(encrypt(&[], "pw", TEST_ITERATIONS), Err(Error::Validation(_))));
    }

    #[test]
    fn test_vault_json_round_trip() {
        let vault = encrypt(&[9; 32], "password", TEST_ITERATIONS).unwrap();

        let json = vault.to_json().unwrap();
        assert!(json.contains("\"kdf\": \"pbkdf2-sha256\""));
        let parsed = EncryptedVault::from_json(&json).unwrap();
        assert_eq!(parsed, vault);

        assert_eq!(decrypt(&parsed, "password").unwrap().expose(), &[9u8; 32]);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(EncryptedVault::from_json("{}"), Err(Error::Format(_))));
        assert!(matches!(EncryptedVault::from_json("not json"), Err(Error::Format(_))));

        let vault = encrypt(&[9; 32], "password", TEST_ITERATIONS).unwrap();
        let json = vault.to_json().unwrap().replace("pbkdf2-sha256", "scrypt");
        assert!(matches!(EncryptedVault::from_json(&json), Err(Error::Format(_))));
    }

    #[test]
    fn test_rotate_changes_password() {
        let vault = encrypt(&[3; 32], "old", TEST_ITERATIONS).unwrap();
        let rotated = rotate(&vault, "old", "new", TEST_ITERATIONS).unwrap();

        assert_ne!(rotated.salt, vault.salt);
        assert!(matches!(decrypt(&rotated, "old"), Err(Error::Authentication)));
        assert_eq!(decrypt(&rotated, "new").unwrap().expose(), &[3u8; 32]);
        assert!(matches!(rotate(&vault, "nope", "new", TEST_ITERATIONS), Err(Error::Authentication)));
    }
}
