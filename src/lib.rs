//! Polymarket Gasless Trading Client
//!
//! The signing core of a Polymarket trading client that never pays gas:
//!
//! 1. **Key vault**: the signing key is stored encrypted under a password
//!    (PBKDF2-HMAC-SHA256 + AES-256-GCM) and only decrypted into memory.
//!
//! 2. **Order signing**: orders are scaled to integer base units once and
//!    signed as EIP-712 typed data for the CTF Exchange.
//!
//! 3. **Request authentication**: API and builder requests carry an
//!    HMAC-SHA256 signature over timestamp, method, path and body.
//!
//! Transport is left to the caller: a [`TradingSession`] hands back the exact
//! body and headers to send.

pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod signing;
pub mod types;
pub mod wallet;

pub use auth::{sign_request, ApiCredentials, AuthHeaders, Clock, FixedClock, RequestAuthenticator, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{Submission, TradingSession};
pub use signing::{DomainParams, OrderIntent, OrderSigner, ScalingRules, SignedOrder};
pub use types::{OrderRequest, Side, SignatureType, TimeInForce};
pub use wallet::{generate_wallet, EncryptedVault, GeneratedWallet, Secret, VaultStore};
