//! EIP-712 order signing
//!
//! The digest is `keccak256(0x19 0x01 || domainSeparator || hashStruct(order))`
//! and is signed with deterministic (RFC 6979) ECDSA. Every signed order is
//! recovered once before it leaves this module, so a domain or key mix-up
//! surfaces here and not as a rejected order at the exchange.

use alloy::primitives::{Address, Signature, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::SolStruct;
use tracing::{debug, warn};

use super::domain::{clob_auth_domain, DomainParams};
use super::intent::OrderIntent;
use super::order::{checksum, ClobAuth, Order, SignedOrder, CLOB_AUTH_MESSAGE};
use crate::error::{Error, Result};
use crate::types::SignatureType;
use crate::wallet::{signer_from_secret, Secret};

/// Signs orders for one key and one maker account
///
/// Immutable after construction, so it can be shared behind an `Arc`.
pub struct OrderSigner {
    key: PrivateKeySigner,
    maker: Address,
    signature_type: SignatureType,
}

impl std::fmt::Debug for OrderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSigner")
            .field("address", &self.key.address())
            .field("maker", &self.maker)
            .field("signature_type", &self.signature_type)
            .finish()
    }
}

impl OrderSigner {
    /// `funder` is the Safe or proxy wallet that holds the funds. Without it
    /// the signing key's own address is the maker, which only works for EOA.
    pub fn new(secret: &Secret, funder: Option<Address>, signature_type: SignatureType) -> Result<Self> {
        let key = signer_from_secret(secret)?;

        let maker = match (funder, signature_type) {
            (Some(funder), _) if funder == Address::ZERO => {
                return Err(Error::validation("funder address is the zero address"))
            }
            (Some(funder), _) => funder,
            (None, SignatureType::Eoa) => key.address(),
            (None, other) => {
                return Err(Error::validation(format!(
                    "signature type {:?} needs a funder address",
                    other
                )))
            }
        };

        debug!(
            "[Signer] Ready: signer={} maker={} type={:?}",
            key.address(),
            maker,
            signature_type
        );

        Ok(Self {
            key,
            maker,
            signature_type,
        })
    }

    /// Address of the signing key
    pub fn address(&self) -> Address {
        self.key.address()
    }

    /// Address that owns the funds
    pub fn maker(&self) -> Address {
        self.maker
    }

    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    /// Fill the exchange struct from a validated intent
    pub fn build_order(&self, intent: &OrderIntent, domain: &DomainParams) -> Result<Order> {
        domain.validate()?;

        let amounts = intent.amounts();
        Ok(Order {
            salt: U256::from(intent.salt()),
            maker: self.maker,
            signer: self.address(),
            taker: Address::ZERO,
            tokenId: intent.token_id(),
            makerAmount: U256::from(amounts.maker),
            takerAmount: U256::from(amounts.taker),
            expiration: U256::from(intent.expiration()),
            nonce: U256::from(intent.nonce()),
            feeRateBps: U256::from(intent.fee_rate_bps()),
            side: intent.side().as_u8(),
            signatureType: self.signature_type.as_u8(),
        })
    }

    pub fn sign(&self, order: &Order, domain: &DomainParams) -> Result<Signature> {
        domain.validate()?;
        let hash = signing_hash(order, domain);
        self.sign_digest(&hash)
    }

    /// Build, sign and self-verify an order
    pub fn sign_order(&self, intent: &OrderIntent, domain: &DomainParams) -> Result<SignedOrder> {
        let order = self.build_order(intent, domain)?;
        let signature = self.sign(&order, domain)?;
        verify_order(&order, domain, &signature)?;

        debug!(
            "[Signer] Signed {} {} token={} maker_amount={} taker_amount={}",
            intent.time_in_force(),
            intent.side(),
            intent.token_id(),
            order.makerAmount,
            order.takerAmount
        );

        Ok(SignedOrder {
            order,
            signature,
            side: intent.side(),
            time_in_force: intent.time_in_force(),
        })
    }

    /// Sign the L1 attestation used to create or derive CLOB API keys
    pub fn sign_clob_auth(&self, chain_id: u64, timestamp: u64, nonce: u64) -> Result<Signature> {
        if chain_id == 0 {
            return Err(Error::validation("chain id is zero"));
        }
        let hash = clob_auth_signing_hash(self.address(), chain_id, timestamp, nonce);
        self.sign_digest(&hash)
    }

    /// Headers for L1-authenticated endpoints (API key creation and derivation)
    pub fn l1_headers(&self, chain_id: u64, timestamp: u64, nonce: u64) -> Result<Vec<(&'static str, String)>> {
        let signature = self.sign_clob_auth(chain_id, timestamp, nonce)?;
        Ok(vec![
            ("POLY_ADDRESS", checksum(self.address())),
            ("POLY_SIGNATURE", format!("0x{}", hex::encode(signature.as_bytes()))),
            ("POLY_TIMESTAMP", timestamp.to_string()),
            ("POLY_NONCE", nonce.to_string()),
        ])
    }

    /// EIP-191 personal-sign of a plain message
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        self.key
            .sign_message_sync(message)
            .map_err(|e| Error::Signing(e.to_string()))
    }

    fn sign_digest(&self, hash: &B256) -> Result<Signature> {
        self.key
            .sign_hash_sync(hash)
            .map_err(|e| Error::Signing(e.to_string()))
    }
}

/// EIP-712 digest of an order under a domain
pub fn signing_hash(order: &Order, domain: &DomainParams) -> B256 {
    order.eip712_signing_hash(&domain.eip712())
}

/// Recover the address that produced `signature` over `order`
pub fn recover_signer(order: &Order, domain: &DomainParams, signature: &Signature) -> Result<Address> {
    let hash = signing_hash(order, domain);
    signature
        .recover_address_from_prehash(&hash)
        .map_err(|e| Error::Signing(format!("recovery failed: {}", e)))
}

/// Check that `signature` was made by `order.signer` under this domain
pub fn verify_order(order: &Order, domain: &DomainParams, signature: &Signature) -> Result<()> {
    let recovered = recover_signer(order, domain, signature)?;
    if recovered != order.signer {
        warn!(
            "[Signer] Signature recovers to {} instead of {} (chain {}, contract {})",
            recovered, order.signer, domain.chain_id, domain.verifying_contract
        );
        return Err(Error::DomainMismatch {
            expected: order.signer,
            recovered,
        });
    }
    Ok(())
}

/// Parse a 65-byte `r || s || v` signature
pub fn parse_signature(bytes: &[u8]) -> Result<Signature> {
    Signature::from_raw(bytes).map_err(|e| Error::format(format!("bad signature: {}", e)))
}

/// Digest signed by [`OrderSigner::sign_clob_auth`]
pub fn clob_auth_signing_hash(address: Address, chain_id: u64, timestamp: u64, nonce: u64) -> B256 {
    let auth = ClobAuth {
        address,
        timestamp: timestamp.to_string(),
        nonce: U256::from(nonce),
        message: CLOB_AUTH_MESSAGE.to_string(),
    };
    auth.eip712_signing_hash(&clob_auth_domain(chain_id))
}
