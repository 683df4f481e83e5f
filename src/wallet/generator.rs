//! Wallet generation using alloy

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use super::secret::Secret;
use crate::error::{Error, Result};

/// A newly generated signing key and its address
#[derive(Debug)]
pub struct GeneratedWallet {
    pub address: Address,
    /// Raw key, to be sealed into a vault right away
    pub secret: Secret,
}

/// Generate a new random wallet
pub fn generate_wallet() -> GeneratedWallet {
    let signer = PrivateKeySigner::random();

    GeneratedWallet {
        address: signer.address(),
        secret: Secret::new(signer.to_bytes().to_vec()),
    }
}

/// Parse a secret as a secp256k1 private key
pub(crate) fn signer_from_secret(secret: &Secret) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_slice(secret.expose())
        .map_err(|_| Error::format(format!("{} byte secret is not a valid secp256k1 private key", secret.len())))
}

/// Get the wallet address controlled by a secret
pub fn address_of(secret: &Secret) -> Result<Address> {
    Ok(signer_from_secret(secret)?.address())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_generate_wallet() {
        let wallet = generate_wallet();

        assert_eq!(wallet.secret.len(), 32);
        assert_ne!(wallet.address, Address::ZERO);
    }

    #[test]
    fn test_address_of_generated_key() {
        let wallet = generate_wallet();
        let recovered_address = address_of(&wallet.secret).unwrap();

        assert_eq!(wallet.address, recovered_address);
    }

    #[test]
    fn test_known_key_address() {
        let secret = Secret::new(vec![0xaa; 32]);
        assert_eq!(
            address_of(&secret).unwrap(),
            address!("0x8fd379246834eac74b8419ffda202cf8051f7a03")
        );
    }

    #[test]
    fn test_invalid_key_material() {
        assert!(matches!(address_of(&Secret::new(vec![0u8; 32])), Err(Error::Format(_))));
        assert!(matches!(address_of(&Secret::new(vec![1u8; 16])), Err(Error::Format(_))));
    }
}
