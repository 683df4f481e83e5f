//! Wallet management: key generation, password-encrypted vault and its on-disk store
//!
//! Decrypted key material lives in [`Secret`] and nowhere else.

mod encryption;
mod generator;
mod secret;
mod store;

pub use encryption::{
    decrypt, encrypt, rotate, EncryptedVault, Kdf, DEFAULT_ITERATIONS, MAX_ITERATIONS, MIN_ITERATIONS, VAULT_VERSION,
};
pub use generator::{address_of, generate_wallet, GeneratedWallet};
pub(crate) use generator::signer_from_secret;
pub use secret::Secret;
pub use store::VaultStore;
