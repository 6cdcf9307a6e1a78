//! Fee Rate
//!
//! Integer fee rate in smallest currency units per 1000 virtual bytes.
//!
//! # Rules (enforced in code)
//!
//! - No floats in fee arithmetic, u128 internally
//! - `fee_for` rounds down
//! - A zero rate charges nothing for any size

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ParseFeeRateError;
use crate::primitives::{Amount, COIN, MAX_MONEY};

/// Number of decimal places in a whole-coin amount
const COIN_DECIMALS: usize = 8;

/// Fee rate in smallest units per 1000 virtual bytes (sat/kvB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate {
    sat_per_kvb: Amount,
}

impl FeeRate {
    /// Rate that charges nothing
    pub const ZERO: FeeRate = FeeRate { sat_per_kvb: 0 };

    /// Create a rate from smallest units per 1000 virtual bytes
    pub const fn from_sat_per_kvb(sat_per_kvb: Amount) -> Self {
        Self { sat_per_kvb }
    }

    /// Smallest units per 1000 virtual bytes
    pub const fn sat_per_kvb(&self) -> Amount {
        self.sat_per_kvb
    }

    pub const fn is_zero(&self) -> bool {
        self.sat_per_kvb == 0
    }

    /// Fee for `bytes` virtual bytes at this rate, rounded down
    ///
    /// ```
    /// use lib_types::FeeRate;
    ///
    /// let rate = FeeRate::from_sat_per_kvb(3000);
    /// assert_eq!(rate.fee_for(98), 294);
    /// assert_eq!(FeeRate::ZERO.fee_for(1_000_000), 0);
    /// ```
    pub fn fee_for(&self, bytes: u64) -> Amount {
        let fee = (self.sat_per_kvb as u128).saturating_mul(bytes as u128) / 1_000;
        fee.min(Amount::MAX as u128) as Amount
    }

    /// Parse a decimal coin-per-kvB string such as `"0.00003000"`
    pub fn from_coin_str(text: &str) -> Result<Self, ParseFeeRateError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseFeeRateError::Empty);
        }
        if text.starts_with('-') {
            return Err(ParseFeeRateError::Negative(text.to_string()));
        }

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(ParseFeeRateError::Malformed(text.to_string()));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(ParseFeeRateError::Malformed(text.to_string()));
        }
        if fraction.len() > COIN_DECIMALS {
            return Err(ParseFeeRateError::TooPrecise(text.to_string()));
        }

        let out_of_range = || ParseFeeRateError::OutOfRange(text.to_string());
        let whole_units: Amount = if whole.is_empty() {
            0
        } else {
            whole.parse::<Amount>().map_err(|_| out_of_range())?
        };
        let fraction_units: Amount = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", fraction, width = COIN_DECIMALS);
            padded.parse::<Amount>().map_err(|_| ParseFeeRateError::Malformed(text.to_string()))?
        };

        let total = whole_units
            .checked_mul(COIN)
            .and_then(|units| units.checked_add(fraction_units))
            .ok_or_else(out_of_range)?;
        if total > MAX_MONEY {
            return Err(out_of_range());
        }
        Ok(Self::from_sat_per_kvb(total))
    }

    /// Convert a floating coin-per-kvB value
    ///
    /// The value must land on a whole unit up to float representation
    /// error; anything finer than 8 decimals is `TooPrecise`.
    pub fn from_coin_f64(value: f64) -> Result<Self, ParseFeeRateError> {
        if !value.is_finite() {
            return Err(ParseFeeRateError::NotFinite(value.to_string()));
        }
        if value < 0.0 {
            return Err(ParseFeeRateError::Negative(value.to_string()));
        }
        let scaled = value * COIN as f64;
        let units = scaled.round();
        if units > MAX_MONEY as f64 {
            return Err(ParseFeeRateError::OutOfRange(value.to_string()));
        }
        let tolerance = (scaled * 1e-12).max(1e-6);
        if (scaled - units).abs() > tolerance {
            return Err(ParseFeeRateError::TooPrecise(value.to_string()));
        }
        Ok(Self::from_sat_per_kvb(units as Amount))
    }

    /// Decimal coin-per-kvB notation, always with 8 decimals
    pub fn to_coin_string(&self) -> String {
        format!(
            "{}.{:08}",
            self.sat_per_kvb / COIN,
            self.sat_per_kvb % COIN
        )
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/kvB", self.sat_per_kvb)
    }
}

impl FromStr for FeeRate {
    type Err = ParseFeeRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_coin_str(s)
    }
}
