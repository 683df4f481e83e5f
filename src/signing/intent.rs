//! Validated order intent
//!
//! This is the one place where caller decimals become integers.

use alloy::primitives::U256;
use rand::Rng;

use super::amounts::{Amounts, ScalingRules, BASE_UNIT};
use crate::error::{Error, Result};
use crate::types::{OrderRequest, Side, TimeInForce};

/// Longest decimal token id that can fit a uint256
pub const MAX_TOKEN_ID_LEN: usize = 78;
/// 100% in basis points
pub const MAX_FEE_RATE_BPS: u32 = 10_000;
/// Random salts stay below 2^40, like the web client's
const SALT_BOUND: u64 = 1 << 40;

/// An order that passed validation, with all amounts fixed in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    token_id: U256,
    side: Side,
    time_in_force: TimeInForce,
    price: u64,
    size: u64,
    amounts: Amounts,
    expiration: u64,
    nonce: u64,
    fee_rate_bps: u32,
    salt: u64,
}

impl OrderIntent {
    pub fn new(request: &OrderRequest, rules: &ScalingRules) -> Result<Self> {
        rules.validate()?;

        let token_id = parse_token_id(&request.token_id)?;

        if request.price <= rust_decimal::Decimal::ZERO || request.price > rust_decimal::Decimal::ONE {
            return Err(Error::validation(format!("price {} is outside (0, 1]", request.price)));
        }
        let price = rules.to_base_units(request.price, rules.price_decimals)?;
        if price == 0 || price > BASE_UNIT {
            return Err(Error::validation(format!(
                "price {} rounds outside (0, 1] at {} decimals",
                request.price, rules.price_decimals
            )));
        }

        if request.size <= rust_decimal::Decimal::ZERO {
            return Err(Error::validation(format!("size {} must be positive", request.size)));
        }
        let precision = rules.precision(request.side, request.time_in_force);
        let size = rules.to_base_units(request.size, precision.shares)?;
        if size == 0 {
            return Err(Error::validation(format!(
                "size {} rounds to zero at {} decimals",
                request.size, precision.shares
            )));
        }

        let expiration = match (request.time_in_force, request.expiration) {
            (TimeInForce::Gtd, Some(at)) if at > 0 => at,
            (TimeInForce::Gtd, _) => return Err(Error::validation("GTD orders need a non-zero expiration")),
            (_, None) | (_, Some(0)) => 0,
            (tif, Some(_)) => {
                return Err(Error::validation(format!("{} orders cannot carry an expiration", tif)))
            }
        };

        if request.fee_rate_bps > MAX_FEE_RATE_BPS {
            return Err(Error::validation(format!(
                "fee rate {} bps exceeds {}",
                request.fee_rate_bps, MAX_FEE_RATE_BPS
            )));
        }

        let amounts = rules.amounts(request.side, price, size, precision)?;
        let salt = request.salt.unwrap_or_else(|| rand::thread_rng().gen_range(1..SALT_BOUND));

        Ok(Self {
            token_id,
            side: request.side,
            time_in_force: request.time_in_force,
            price,
            size,
            amounts,
            expiration,
            nonce: request.nonce,
            fee_rate_bps: request.fee_rate_bps,
            salt,
        })
    }

    pub fn token_id(&self) -> U256 {
        self.token_id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Price in base units (1.0 == 1_000_000)
    pub fn price(&self) -> u64 {
        self.price
    }

    /// Size in base units
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn amounts(&self) -> Amounts {
        self.amounts
    }

    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn fee_rate_bps(&self) -> u32 {
        self.fee_rate_bps
    }

    pub fn salt(&self) -> u64 {
        self.salt
    }
}

fn parse_token_id(raw: &str) -> Result<U256> {
    if raw.is_empty() {
        return Err(Error::validation("token id is empty"));
    }
    if raw.len() > MAX_TOKEN_ID_LEN {
        return Err(Error::validation(format!(
            "token id is {} bytes, limit is {}",
            raw.len(),
            MAX_TOKEN_ID_LEN
        )));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(format!("token id {:?} is not a decimal integer", raw)));
    }
    U256::from_str_radix(raw, 10).map_err(|_| Error::validation("token id does not fit in uint256"))
}
