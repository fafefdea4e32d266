//! Monetary amount units.
//!
//! All host-facing amounts are fixed-point [`Decimal`] values with two
//! fractional digits. Providers serialize them either as major-unit strings
//! (`"220.00"`) or as integral minor units (cents), depending on the wire
//! protocol.

use error_stack::report;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    consts,
    errors::{CustomResult, ValidationError},
};

/// A major-unit amount on the wire: a decimal string with two fractional
/// digits, rounded half-up.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StringMajorUnit(String);

impl StringMajorUnit {
    /// Convert a decimal amount to its wire representation.
    pub fn from_decimal(amount: Decimal) -> Self {
        let rounded = amount.round_dp_with_strategy(
            consts::AMOUNT_FRACTIONAL_DIGITS,
            RoundingStrategy::MidpointAwayFromZero,
        );
        Self(format!("{rounded:.2}"))
    }

    /// The wire string.
    pub fn get_amount_as_string(&self) -> &str {
        &self.0
    }

    /// Parse the wire string back into a decimal amount.
    pub fn to_decimal(&self) -> CustomResult<Decimal, ValidationError> {
        self.0.parse().map_err(|_| {
            report!(ValidationError::InvalidValue {
                message: format!("not a decimal amount: {}", self.0),
            })
        })
    }
}

/// An amount in the smallest currency unit (e.g. cents).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MinorUnit(i64);

impl MinorUnit {
    /// Forms a new minor unit from an integral amount.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Gets the amount as an i64 value.
    pub fn get_amount_as_i64(self) -> i64 {
        self.0
    }

    /// Convert a major-unit decimal into minor units.
    ///
    /// `zero_decimal` currencies (e.g. JPY) carry the amount as-is; all
    /// others are multiplied by 100. Fractional remainders after conversion
    /// are rejected rather than silently truncated.
    pub fn from_major(amount: Decimal, zero_decimal: bool) -> CustomResult<Self, ValidationError> {
        let scaled = if zero_decimal {
            amount
        } else {
            amount * Decimal::ONE_HUNDRED
        };
        let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        if rounded != scaled {
            return Err(report!(ValidationError::InvalidValue {
                message: format!("amount {amount} does not convert to whole minor units"),
            }));
        }
        rounded.try_into().map(Self).map_err(|_| {
            report!(ValidationError::InvalidValue {
                message: format!("amount {amount} out of range for minor units"),
            })
        })
    }
}

impl std::fmt::Display for MinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn string_major_unit_keeps_two_fractional_digits() {
        assert_eq!(
            StringMajorUnit::from_decimal(Decimal::new(220, 0)).get_amount_as_string(),
            "220.00"
        );
        assert_eq!(
            StringMajorUnit::from_decimal(Decimal::new(1999, 2)).get_amount_as_string(),
            "19.99"
        );
    }

    #[test]
    fn string_major_unit_rounds_half_up() {
        assert_eq!(
            StringMajorUnit::from_decimal(Decimal::new(10005, 3)).get_amount_as_string(),
            "10.01"
        );
    }

    #[test]
    fn string_major_unit_round_trips_through_decimal() {
        let amount = Decimal::new(12345, 2);
        let wire = StringMajorUnit::from_decimal(amount);
        assert_eq!(wire.to_decimal().unwrap(), amount);
    }

    #[test]
    fn minor_unit_scales_regular_currencies_by_one_hundred() {
        let minor = MinorUnit::from_major(Decimal::new(1999, 2), false).unwrap();
        assert_eq!(minor.get_amount_as_i64(), 1999);
    }

    #[test]
    fn minor_unit_passes_zero_decimal_currencies_through() {
        let minor = MinorUnit::from_major(Decimal::new(500, 0), true).unwrap();
        assert_eq!(minor.get_amount_as_i64(), 500);
    }

    #[test]
    fn minor_unit_rejects_fractional_remainders() {
        assert!(MinorUnit::from_major(Decimal::new(19999, 4), false).is_err());
        assert!(MinorUnit::from_major(Decimal::new(5005, 1), true).is_err());
    }
}
