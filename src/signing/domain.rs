//! EIP-712 domain parameters for the exchange contracts

use std::borrow::Cow;

use alloy::primitives::{address, Address, B256, U256};
use alloy::sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Polygon mainnet
pub const POLYGON_CHAIN_ID: u64 = 137;
/// Polygon Amoy testnet
pub const AMOY_CHAIN_ID: u64 = 80002;

/// CTF Exchange on Polygon
pub const CTF_EXCHANGE: Address = address!("0x4bfb41d5b3570defd03c39a9a4d8de6bd8b8982e");
/// Neg-risk CTF Exchange on Polygon
pub const NEG_RISK_CTF_EXCHANGE: Address = address!("0xc5d563a36ae78145c45a50134d48a1215220f80a");

pub const CTF_EXCHANGE_NAME: &str = "Polymarket CTF Exchange";
pub const CTF_EXCHANGE_VERSION: &str = "1";

/// Longest accepted domain name or version, in bytes
pub const MAX_DOMAIN_FIELD_LEN: usize = 64;

/// Identifies which exchange deployment a signature is valid for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainParams {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl DomainParams {
    pub fn new(name: impl Into<String>, version: impl Into<String>, chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Standard binary-outcome exchange on Polygon
    pub fn polymarket_ctf() -> Self {
        Self::new(CTF_EXCHANGE_NAME, CTF_EXCHANGE_VERSION, POLYGON_CHAIN_ID, CTF_EXCHANGE)
    }

    /// Neg-risk (multi-outcome) exchange on Polygon
    pub fn polymarket_neg_risk() -> Self {
        Self::new(CTF_EXCHANGE_NAME, CTF_EXCHANGE_VERSION, POLYGON_CHAIN_ID, NEG_RISK_CTF_EXCHANGE)
    }

    /// Oversized fields are rejected rather than truncated
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [("name", &self.name), ("version", &self.version)] {
            if value.is_empty() {
                return Err(Error::validation(format!("domain {} is empty", label)));
            }
            if value.len() > MAX_DOMAIN_FIELD_LEN {
                return Err(Error::validation(format!(
                    "domain {} is {} bytes, limit is {}",
                    label,
                    value.len(),
                    MAX_DOMAIN_FIELD_LEN
                )));
            }
        }
        if self.chain_id == 0 {
            return Err(Error::validation("domain chain id is zero"));
        }
        if self.verifying_contract == Address::ZERO {
            return Err(Error::validation("domain verifying contract is the zero address"));
        }
        Ok(())
    }

    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }

    /// keccak256 of the encoded domain struct
    pub fn separator(&self) -> B256 {
        self.eip712().separator()
    }
}

/// Domain for L1 API-key derivation messages (no verifying contract)
pub(crate) fn clob_auth_domain(chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed("ClobAuthDomain")),
        Some(Cow::Borrowed("1")),
        Some(U256::from(chain_id)),
        None,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;

    #[test]
    fn test_reference_domain_separator() {
        let domain = DomainParams::new("Exchange", "1", 137, Address::repeat_byte(0x11));
        assert_eq!(
            domain.separator(),
            b256!("0xd441426f59d8bfc4e68173a6fbee0fa8f27bf4354a25d2c6e6ab51d1ef8bc04c")
        );
    }

    #[test]
    fn test_polygon_ctf_separator() {
        assert_eq!(
            DomainParams::polymarket_ctf().separator(),
            b256!("0x1a573e3617c78403b5b4b892827992f027b03d4eaf570048b8ee8cdd84d151be")
        );
    }

    #[test]
    fn test_separator_depends_on_every_field() {
        let base = DomainParams::polymarket_ctf();
        let variants = [
            DomainParams { name: "Other".into(), ..base.clone() },
            DomainParams { version: "2".into(), ..base.clone() },
            DomainParams { chain_id: AMOY_CHAIN_ID, ..base.clone() },
            DomainParams::polymarket_neg_risk(),
        ];
        for variant in variants {
            assert_ne!(variant.separator(), base.separator(), "{:?}", variant);
        }
    }

    #[test]
    fn test_validate_rejects_bad_domains() {
        assert!(DomainParams::polymarket_ctf().validate().is_ok());

        let long_name = DomainParams { name: "x".repeat(MAX_DOMAIN_FIELD_LEN + 1), ..DomainParams::polymarket_ctf() };
        assert!(matches!(long_name.validate(), Err(Error::Validation(_))));

        let empty_version = DomainParams { version: String::new(), ..DomainParams::polymarket_ctf() };
        assert!(empty_version.validate().is_err());

        let zero_chain = DomainParams { chain_id: 0, ..DomainParams::polymarket_ctf() };
        assert!(zero_chain.validate().is_err());

        let zero_contract = DomainParams { verifying_contract: Address::ZERO, ..DomainParams::polymarket_ctf() };
        assert!(zero_contract.validate().is_err());
    }

    #[test]
    fn test_domain_json_is_camel_case() {
        let json = serde_json::to_value(DomainParams::polymarket_ctf()).unwrap();
        assert_eq!(json["chainId"], 137);
        assert!(json.get("verifyingContract").is_some());
    }
}
