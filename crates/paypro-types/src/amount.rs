//! Conversion between integer minor units and decimal amounts.
//!
//! Merchants quote every amount as an integer count of minor units together
//! with the number of decimals of the currency. [`MinorUnits`] turns such a
//! pair into a precise [`Decimal`] for display.
//!
//! # Example
//!
//! ```rust
//! use paypro_types::amount::MinorUnits;
//!
//! let amount = MinorUnits::new(150_000, 8).to_decimal().unwrap();
//! assert_eq!(amount.to_string(), "0.00150000");
//! ```

use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;

/// An integer amount in the smallest unit of a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinorUnits {
    /// Amount in minor units (e.g. satoshis or wei).
    pub value: u128,
    /// Number of decimal places of the currency (e.g. 8 for BTC).
    pub decimals: u32,
}

/// Errors that can occur when converting minor units.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MinorUnitsError {
    #[error("Too many decimals: {0}, at most {max} supported", max = MinorUnits::MAX_DECIMALS)]
    TooManyDecimals(u32),
    #[error("Amount {0} does not fit a 96-bit decimal mantissa")]
    Overflow(u128),
}

impl MinorUnits {
    /// Largest scale a [`Decimal`] can carry.
    pub const MAX_DECIMALS: u32 = 28;

    pub fn new(value: u128, decimals: u32) -> Self {
        Self { value, decimals }
    }

    /// Returns `value × 10^(−decimals)`.
    ///
    /// The scale of the result equals `decimals`, so trailing zeros are kept.
    pub fn to_decimal(&self) -> Result<Decimal, MinorUnitsError> {
        if self.decimals > Self::MAX_DECIMALS {
            return Err(MinorUnitsError::TooManyDecimals(self.decimals));
        }
        let overflow = || MinorUnitsError::Overflow(self.value);
        let value = i128::try_from(self.value).map_err(|_| overflow())?;
        Decimal::try_from_i128_with_scale(value, self.decimals).map_err(|_| overflow())
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Ok(decimal) => write!(f, "{}", decimal.normalize()),
            Err(_) => write!(f, "{}e-{}", self.value, self.decimals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_to_decimal_btc() {
        let amount = MinorUnits::new(12_345_678, 8).to_decimal().unwrap();
        assert_eq!(amount, Decimal::from_str("0.12345678").unwrap());
    }

    #[test]
    fn test_to_decimal_eth_wei() {
        let amount = MinorUnits::new(1_500_000_000_000_000_000, 18)
            .to_decimal()
            .unwrap();
        assert_eq!(amount, Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_zero_decimals() {
        let amount = MinorUnits::new(42, 0).to_decimal().unwrap();
        assert_eq!(amount, Decimal::from(42));
    }

    #[test]
    fn test_too_many_decimals() {
        let err = MinorUnits::new(1, 29).to_decimal().unwrap_err();
        assert_eq!(err, MinorUnitsError::TooManyDecimals(29));
    }

    #[test]
    fn test_to_decimal_above_u64() {
        let amount = MinorUnits::new(25_000_000_000_000_000_000, 18)
            .to_decimal()
            .unwrap();
        assert_eq!(amount.normalize(), Decimal::from(25));
    }

    #[test]
    fn test_mantissa_overflow() {
        let err = MinorUnits::new(u128::MAX, 18).to_decimal().unwrap_err();
        assert_eq!(err, MinorUnitsError::Overflow(u128::MAX));
        let err = MinorUnits::new(1 << 96, 0).to_decimal().unwrap_err();
        assert_eq!(err, MinorUnitsError::Overflow(1 << 96));
    }

    #[test]
    fn test_display_normalizes() {
        assert_eq!(MinorUnits::new(150_000, 8).to_string(), "0.0015");
    }
}
