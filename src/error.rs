//! Error taxonomy for the signing core
//!
//! Every failure is returned to the immediate caller. Nothing in the core
//! retries: a wrong password or a misconfigured domain needs a human.

use alloy::primitives::Address;
use thiserror::Error;

/// Errors raised by the vault, the order signer and the request authenticator
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input is malformed or out of range
    #[error("validation failed: {0}")]
    Validation(String),

    /// Vault tag did not verify (wrong password or tampered data)
    #[error("wrong password or corrupted credential file")]
    Authentication,

    /// Persisted vault or key material is structurally invalid
    #[error("malformed credential data: {0}")]
    Format(String),

    /// Signature recovers to someone other than the order's signer
    #[error("signature recovers to {recovered}, expected {expected} (wrong chain or exchange contract?)")]
    DomainMismatch { expected: Address, recovered: Address },

    /// ECDSA backend failure
    #[error("signing failed: {0}")]
    Signing(String),

    /// Vault file could not be read or written
    #[error("vault I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Whether the error means the setup itself is broken and must be redone
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Format(_) | Error::DomainMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_message_is_user_facing() {
        assert_eq!(
            Error::Authentication.to_string(),
            "wrong password or corrupted credential file"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::format("short salt").is_fatal());
        assert!(Error::DomainMismatch {
            expected: Address::ZERO,
            recovered: Address::repeat_byte(1),
        }
        .is_fatal());
        assert!(!Error::Authentication.is_fatal());
        assert!(!Error::validation("price").is_fatal());
    }
}
