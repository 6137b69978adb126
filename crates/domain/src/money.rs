//! Decimal money amounts as the backend reports them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A money amount in major currency units (e.g. rupees).
///
/// Amounts are taken verbatim from the backend and never derived from
/// one another on the client. The only arithmetic performed is the
/// conversion of a payable amount into minor units for the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Wraps a decimal amount.
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Creates an amount from an integer mantissa and a decimal scale,
    /// e.g. `Amount::from_parts(49950, 2)` is `499.50`.
    pub fn from_parts(mantissa: i64, scale: u32) -> Self {
        Self(Decimal::new(mantissa, scale))
    }

    /// Returns zero.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Converts to minor units (paise, cents), rounding half away from zero.
    ///
    /// `499.50` becomes `49950` and `499.505` becomes `49951`.
    pub fn to_minor_units(&self) -> Result<i64, DomainError> {
        let scaled = self
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| DomainError::AmountOutOfRange(self.0.to_string()))?;
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| DomainError::AmountOutOfRange(self.0.to_string()))
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_exact() {
        assert_eq!(Amount::from_parts(49950, 2).to_minor_units().unwrap(), 49950);
        assert_eq!(Amount::from_parts(850, 0).to_minor_units().unwrap(), 85000);
    }

    #[test]
    fn test_minor_units_round_half_up_not_truncate() {
        assert_eq!(
            Amount::from_parts(499505, 3).to_minor_units().unwrap(),
            49951
        );
        assert_eq!(
            Amount::from_parts(499504, 3).to_minor_units().unwrap(),
            49950
        );
        assert_eq!(Amount::from_parts(10999, 3).to_minor_units().unwrap(), 1100);
    }

    #[test]
    fn test_minor_units_overflow() {
        let huge = Amount::new(Decimal::MAX);
        assert!(matches!(
            huge.to_minor_units(),
            Err(DomainError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Amount::from_parts(850, 0).to_string(), "850.00");
        assert_eq!(Amount::from_parts(4995, 1).to_string(), "499.50");
    }

    #[test]
    fn test_positive() {
        assert!(Amount::from_parts(1, 2).is_positive());
        assert!(!Amount::zero().is_positive());
        assert!(!Amount::from_parts(-1, 0).is_positive());
    }

    #[test]
    fn test_deserialize_json_number() {
        let amount: Amount = serde_json::from_str("499.505").unwrap();
        assert_eq!(amount, Amount::from_parts(499505, 3));
        assert_eq!(amount.to_minor_units().unwrap(), 49951);
    }
}
