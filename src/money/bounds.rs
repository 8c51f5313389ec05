//! Order bounds
//!
//! The per-order minimum and maximum fill, denominated in one currency.

use serde::Serialize;
use std::fmt;

use crate::error::Result;
use crate::money::{Currency, Money, MoneyRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBounds {
    range: MoneyRange,
}

impl OrderBounds {
    /// Both bounds must share a currency and satisfy `min <= max`; they are
    /// normalized to the max of their scales.
    pub fn new(min: Money, max: Money) -> Result<Self> {
        Ok(Self {
            range: MoneyRange::new(min, max)?,
        })
    }

    pub fn parse(currency: &str, min: &str, max: &str, scale: u32) -> Result<Self> {
        Self::new(
            Money::parse(currency, min, scale)?,
            Money::parse(currency, max, scale)?,
        )
    }

    pub fn currency(&self) -> &Currency {
        self.range.currency()
    }

    pub fn min(&self) -> &Money {
        self.range.min()
    }

    pub fn max(&self) -> &Money {
        self.range.max()
    }

    pub fn scale(&self) -> u32 {
        self.range.scale()
    }

    /// Inclusive membership; the comparison happens at the max of the
    /// bounds' scale and the input's.
    pub fn contains(&self, amount: &Money) -> Result<bool> {
        self.range.contains(amount)
    }

    pub fn clamp(&self, amount: &Money) -> Result<Money> {
        self.range.clamp(amount)
    }

    pub fn as_range(&self) -> &MoneyRange {
        &self.range
    }
}

impl fmt::Display for OrderBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidInputKind;

    #[test]
    fn test_bounds_normalize_to_common_scale() {
        let b = OrderBounds::new(
            Money::parse("USD", "10", 0).unwrap(),
            Money::parse("USD", "1000.00", 2).unwrap(),
        )
        .unwrap();
        assert_eq!(b.scale(), 2);
        assert_eq!(b.min().canonical_amount(), "10.00");
    }

    #[test]
    fn test_inverted_bounds_fail() {
        let err = OrderBounds::parse("USD", "500", "200", 0).unwrap_err();
        assert_eq!(err.input_kind(), Some(InvalidInputKind::InvertedBounds));
    }

    #[test]
    fn test_contains_mixed_scale() {
        let b = OrderBounds::parse("USD", "10.0", "1000.0", 1).unwrap();
        assert!(b.contains(&Money::parse("USD", "10", 0).unwrap()).unwrap());
        assert!(!b.contains(&Money::parse("USD", "9.99", 2).unwrap()).unwrap());
        assert!(b.contains(&Money::parse("USD", "1000.00", 2).unwrap()).unwrap());
    }

    #[test]
    fn test_cross_currency_contains_fails() {
        let b = OrderBounds::parse("USD", "10", "1000", 0).unwrap();
        assert!(b.contains(&Money::parse("EUR", "50", 0).unwrap()).is_err());
    }
}
