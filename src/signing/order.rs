//! Exchange order struct and the JSON shape the CLOB expects
//!
//! The `Order` struct mirrors the CTF Exchange contract field for field.
//! Reordering fields changes the type hash and invalidates every signature.

use alloy::primitives::{Address, Signature};
use alloy::sol;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Side, TimeInForce};

sol! {
    /// CTF Exchange order
    #[derive(Debug, PartialEq, Eq)]
    struct Order {
        uint256 salt;
        address maker;
        address signer;
        address taker;
        uint256 tokenId;
        uint256 makerAmount;
        uint256 takerAmount;
        uint256 expiration;
        uint256 nonce;
        uint256 feeRateBps;
        uint8 side;
        uint8 signatureType;
    }

    /// L1 attestation used to create or derive API keys
    #[derive(Debug, PartialEq, Eq)]
    struct ClobAuth {
        address address;
        string timestamp;
        uint256 nonce;
        string message;
    }
}

/// Text every ClobAuth message must carry
pub const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

/// An order plus the signature that authorizes it
#[derive(Debug, Clone)]
pub struct SignedOrder {
    pub order: Order,
    pub signature: Signature,
    pub side: Side,
    pub time_in_force: TimeInForce,
}

impl SignedOrder {
    /// 65-byte `r || s || v` signature as 0x-prefixed hex
    pub fn signature_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signature.as_bytes()))
    }

    /// Fails only for hand-built orders whose salt does not fit a JSON integer
    pub fn to_payload(&self) -> Result<OrderPayload> {
        let o = &self.order;
        let salt = u64::try_from(o.salt)
            .map_err(|_| Error::validation(format!("salt {} does not fit in 64 bits", o.salt)))?;
        Ok(OrderPayload {
            salt,
            maker: o.maker.to_checksum(None),
            signer: o.signer.to_checksum(None),
            taker: o.taker.to_checksum(None),
            token_id: o.tokenId.to_string(),
            maker_amount: o.makerAmount.to_string(),
            taker_amount: o.takerAmount.to_string(),
            expiration: o.expiration.to_string(),
            nonce: o.nonce.to_string(),
            fee_rate_bps: o.feeRateBps.to_string(),
            side: self.side,
            signature_type: o.signatureType,
            signature: self.signature_hex(),
        })
    }

    /// Wrap the payload in the POST /order body
    pub fn to_post_body(&self, owner: impl Into<String>) -> Result<PostOrderBody> {
        Ok(PostOrderBody {
            order: self.to_payload()?,
            owner: owner.into(),
            order_type: self.time_in_force,
        })
    }
}

/// Signed order as sent to the CLOB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub salt: u64,
    pub maker: String,
    pub signer: String,
    pub taker: String,
    pub token_id: String,
    pub maker_amount: String,
    pub taker_amount: String,
    pub expiration: String,
    pub nonce: String,
    pub fee_rate_bps: String,
    pub side: Side,
    pub signature_type: u8,
    pub signature: String,
}

/// Body of an order submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOrderBody {
    pub order: OrderPayload,
    /// API key of the account the order is booked under
    pub owner: String,
    pub order_type: TimeInForce,
}

impl PostOrderBody {
    /// Compact JSON; the auth signature is computed over these exact bytes
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Checksummed address, as the CLOB expects
pub(crate) fn checksum(address: Address) -> String {
    address.to_checksum(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{b256, keccak256, U256};
    use alloy::sol_types::SolStruct;

    fn sample_order() -> Order {
        Order {
            salt: U256::from(42u64),
            maker: Address::repeat_byte(0x22),
            signer: Address::repeat_byte(0x33),
            taker: Address::ZERO,
            tokenId: U256::from(12345u64),
            makerAmount: U256::from(6_500_000u64),
            takerAmount: U256::from(10_000_000u64),
            expiration: U256::ZERO,
            nonce: U256::ZERO,
            feeRateBps: U256::ZERO,
            side: 0,
            signatureType: 0,
        }
    }

    #[test]
    fn test_order_type_hash() {
        let encoded = Order::eip712_encode_type();
        assert_eq!(
            encoded,
            "Order(uint256 salt,address maker,address signer,address taker,uint256 tokenId,uint256 makerAmount,uint256 takerAmount,uint256 expiration,uint256 nonce,uint256 feeRateBps,uint8 side,uint8 signatureType)"
        );
        assert_eq!(
            keccak256(encoded.as_bytes()),
            b256!("0xa852566c4e14d00869b6db0220888a9090a13eccdaea03713ff0a3d27bf9767c")
        );
    }

    #[test]
    fn test_clob_auth_type() {
        assert_eq!(
            ClobAuth::eip712_encode_type(),
            "ClobAuth(address address,string timestamp,uint256 nonce,string message)"
        );
    }

    #[test]
    fn test_payload_shape() {
        let signed = SignedOrder {
            order: sample_order(),
            signature: Signature::new(U256::from(1u64), U256::from(2u64), true),
            side: Side::Buy,
            time_in_force: TimeInForce::Gtc,
        };

        let body = signed.to_post_body("api-key").unwrap();
        let json: serde_json::Value = serde_json::from_str(&body.to_json().unwrap()).unwrap();

        assert_eq!(json["orderType"], "GTC");
        assert_eq!(json["owner"], "api-key");

        let order = &json["order"];
        assert_eq!(order["salt"], 42);
        assert_eq!(order["tokenId"], "12345");
        assert_eq!(order["makerAmount"], "6500000");
        assert_eq!(order["takerAmount"], "10000000");
        assert_eq!(order["feeRateBps"], "0");
        assert_eq!(order["side"], "BUY");
        assert_eq!(order["signatureType"], 0);
        assert_eq!(order["maker"], "0x2222222222222222222222222222222222222222");
        assert_eq!(order["taker"], "0x0000000000000000000000000000000000000000");

        let sig = order["signature"].as_str().unwrap();
        assert!(sig.starts_with("0x"));
        assert_eq!(sig.len(), 2 + 65 * 2);
        assert!(sig.ends_with("1c"));
    }

    #[test]
    fn test_oversized_salt_is_rejected() {
        let signed = SignedOrder {
            order: Order { salt: U256::from(u64::MAX) + U256::from(1u64), ..sample_order() },
            signature: Signature::new(U256::from(1u64), U256::from(2u64), false),
            side: Side::Sell,
            time_in_force: TimeInForce::Fok,
        };
        assert!(matches!(signed.to_payload(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_checksum_address() {
        assert_eq!(
            checksum("0x4bfb41d5b3570defd03c39a9a4d8de6bd8b8982e".parse().unwrap()),
            "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E"
        );
    }
}
