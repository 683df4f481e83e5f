//! Decimal to base-unit conversion for order amounts
//!
//! Everything on the exchange is denominated in 6-decimal base units (USDC
//! and outcome shares alike). Prices and sizes are rounded once, at the
//! boundary, with the configured [`RoundingPolicy`]. From there on all math
//! is integer. The notional gets exactly one more rounding step, to the
//! USDC precision the exchange accepts for the order kind.
//!
//! | order kind       | shares dp | USDC dp | maker  | taker  |
//! |------------------|-----------|---------|--------|--------|
//! | limit BUY        | 2         | 4       | USDC   | shares |
//! | market BUY       | 4         | 2       | USDC   | shares |
//! | SELL (any)       | 2         | 4       | shares | USDC   |

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{Side, TimeInForce};

/// Decimals of the settlement asset and of outcome shares
pub const BASE_DECIMALS: u32 = 6;
/// One whole unit in base units
pub const BASE_UNIT: u64 = 1_000_000;

/// How values that fall between representable units are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Round to nearest, ties to even
    #[default]
    HalfEven,
    /// Drop the excess digits
    Truncate,
}

impl RoundingPolicy {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingPolicy::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingPolicy::Truncate => RoundingStrategy::ToZero,
        }
    }

    /// `numerator / denominator` rounded to an integer under this policy
    fn div(self, numerator: u128, denominator: u128) -> u128 {
        let quotient = numerator / denominator;
        let remainder = numerator % denominator;
        match self {
            RoundingPolicy::Truncate => quotient,
            RoundingPolicy::HalfEven => {
                let twice = remainder * 2;
                if twice > denominator || (twice == denominator && quotient % 2 == 1) {
                    quotient + 1
                } else {
                    quotient
                }
            }
        }
    }
}

impl FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "half_even" | "half-even" | "bankers" => Ok(RoundingPolicy::HalfEven),
            "truncate" | "down" => Ok(RoundingPolicy::Truncate),
            other => Err(format!("invalid rounding policy: {}", other)),
        }
    }
}

/// Decimal places the exchange accepts for each leg of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    pub shares: u32,
    pub usdc: u32,
}

/// Maker/taker amounts in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amounts {
    pub maker: u64,
    pub taker: u64,
}

/// The decimal-to-integer contract with the exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingRules {
    /// Price tick as decimal places (2 = 0.01 tick)
    pub price_decimals: u32,
    /// GTC/GTD buys
    pub limit: Precision,
    /// FOK/FAK buys
    pub market_buy: Precision,
    /// All sells
    pub sell: Precision,
    pub rounding: RoundingPolicy,
}

impl Default for ScalingRules {
    fn default() -> Self {
        Self {
            price_decimals: 2,
            limit: Precision { shares: 2, usdc: 4 },
            market_buy: Precision { shares: 4, usdc: 2 },
            sell: Precision { shares: 2, usdc: 4 },
            rounding: RoundingPolicy::HalfEven,
        }
    }
}

impl ScalingRules {
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.price_decimals,
            self.limit.shares,
            self.limit.usdc,
            self.market_buy.shares,
            self.market_buy.usdc,
            self.sell.shares,
            self.sell.usdc,
        ];
        if all.iter().any(|dp| *dp > BASE_DECIMALS) {
            return Err(Error::validation(format!(
                "scaling rules may not exceed {} decimal places",
                BASE_DECIMALS
            )));
        }
        Ok(())
    }

    pub fn precision(&self, side: Side, time_in_force: TimeInForce) -> Precision {
        match (side, time_in_force.is_market()) {
            (Side::Buy, false) => self.limit,
            (Side::Buy, true) => self.market_buy,
            (Side::Sell, _) => self.sell,
        }
    }

    /// Round `value` to `decimals` places and express it in base units
    pub fn to_base_units(&self, value: Decimal, decimals: u32) -> Result<u64> {
        if value.is_sign_negative() {
            return Err(Error::validation(format!("{} is negative", value)));
        }
        let rounded = value.round_dp_with_strategy(decimals, self.rounding.strategy());
        rounded
            .checked_mul(Decimal::from(BASE_UNIT))
            .and_then(|units| units.to_u64())
            .ok_or_else(|| Error::validation(format!("{} does not fit in base units", value)))
    }

    /// Compute maker/taker amounts from already-scaled price and size
    pub fn amounts(&self, side: Side, price: u64, size: u64, precision: Precision) -> Result<Amounts> {
        if precision.usdc > BASE_DECIMALS || precision.shares > BASE_DECIMALS {
            return Err(Error::validation(format!(
                "precision {:?} exceeds {} decimal places",
                precision, BASE_DECIMALS
            )));
        }

        // size * price carries 12 decimals
        let notional = size as u128 * price as u128;
        let step = 10u128.pow(2 * BASE_DECIMALS - precision.usdc);
        let usdc = self.rounding.div(notional, step) * 10u128.pow(BASE_DECIMALS - precision.usdc);

        if usdc == 0 {
            return Err(Error::validation("order notional rounds to zero"));
        }
        let usdc = u64::try_from(usdc).map_err(|_| Error::validation("order notional overflows"))?;

        Ok(match side {
            Side::Buy => Amounts { maker: usdc, taker: size },
            Side::Sell => Amounts { maker: size, taker: usdc },
        })
    }
}
