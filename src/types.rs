//! Core types shared by the signer, the session and the CLI

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// On-chain encoding used in the order struct
    pub fn as_u8(self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("invalid side: {}", other)),
        }
    }
}

/// Order time-in-force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good till cancelled
    #[default]
    Gtc,
    /// Good till date; needs an expiration
    Gtd,
    /// Fill or kill
    Fok,
    /// Fill and kill (partial fills allowed)
    Fak,
}

impl TimeInForce {
    /// Market orders get a different amount precision from the exchange
    pub fn is_market(self) -> bool {
        matches!(self, TimeInForce::Fok | TimeInForce::Fak)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Gtc => write!(f, "GTC"),
            TimeInForce::Gtd => write!(f, "GTD"),
            TimeInForce::Fok => write!(f, "FOK"),
            TimeInForce::Fak => write!(f, "FAK"),
        }
    }
}

impl FromStr for TimeInForce {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GTC" => Ok(TimeInForce::Gtc),
            "GTD" => Ok(TimeInForce::Gtd),
            "FOK" => Ok(TimeInForce::Fok),
            "FAK" => Ok(TimeInForce::Fak),
            other => Err(format!("invalid time in force: {}", other)),
        }
    }
}

/// How the exchange should verify the order signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureType {
    /// Plain externally-owned account; maker == signer
    #[default]
    Eoa,
    /// Polymarket email/magic proxy wallet
    PolyProxy,
    /// Gnosis Safe owned by the signer
    GnosisSafe,
}

impl SignatureType {
    pub fn as_u8(self) -> u8 {
        match self {
            SignatureType::Eoa => 0,
            SignatureType::PolyProxy => 1,
            SignatureType::GnosisSafe => 2,
        }
    }
}

impl FromStr for SignatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "eoa" => Ok(SignatureType::Eoa),
            "1" | "proxy" | "poly_proxy" => Ok(SignatureType::PolyProxy),
            "2" | "safe" | "gnosis_safe" => Ok(SignatureType::GnosisSafe),
            other => Err(format!("invalid signature type: {}", other)),
        }
    }
}

/// Raw order input as received from a caller, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// ERC-1155 outcome token id, as a decimal string
    pub token_id: String,
    pub side: Side,
    /// Price per share in [0, 1]
    pub price: Decimal,
    /// Number of shares
    pub size: Decimal,
    #[serde(default)]
    pub time_in_force: TimeInForce,
    /// Unix seconds; only for GTD orders
    #[serde(default)]
    pub expiration: Option<u64>,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub fee_rate_bps: u32,
    /// Fixed salt; a random one is drawn when absent
    #[serde(default)]
    pub salt: Option<u64>,
}

impl OrderRequest {
    /// A GTC limit order with default nonce, fee and salt
    pub fn limit(token_id: impl Into<String>, side: Side, price: Decimal, size: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side,
            price,
            size,
            time_in_force: TimeInForce::Gtc,
            expiration: None,
            nonce: 0,
            fee_rate_bps: 0,
            salt: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_parsing_and_display() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.as_u8(), 1);
    }

    #[test]
    fn test_signature_type_aliases() {
        assert_eq!("2".parse::<SignatureType>().unwrap(), SignatureType::GnosisSafe);
        assert_eq!("proxy".parse::<SignatureType>().unwrap(), SignatureType::PolyProxy);
        assert_eq!(SignatureType::default().as_u8(), 0);
    }

    #[test]
    fn test_order_request_json_defaults() {
        let json = r#"{"token_id":"12345","side":"BUY","price":"0.65","size":10}"#;
        let req: OrderRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req, OrderRequest::limit("12345", Side::Buy, dec!(0.65), dec!(10)));
        assert!(!req.time_in_force.is_market());
        assert!(TimeInForce::Fak.is_market());
    }
}
