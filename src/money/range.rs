//! Money ranges
//!
//! An inclusive `[min, max]` window in a single currency. Both endpoints are
//! normalized to the max of their scales so a range has one canonical shape;
//! signatures and capacity math rely on that.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::money::{Currency, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoneyRange {
    min: Money,
    max: Money,
}

impl MoneyRange {
    pub fn new(min: Money, max: Money) -> Result<Self> {
        min.ensure_same_currency(&max)?;
        if min.compare(&max)? == Ordering::Greater {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::InvertedBounds,
                format!("range minimum {min} above maximum {max}"),
            ));
        }
        let scale = min.scale().max(max.scale());
        Ok(Self {
            min: min.rescale(scale)?,
            max: max.rescale(scale)?,
        })
    }

    /// A degenerate range holding a single value.
    pub fn point(value: Money) -> Self {
        Self {
            min: value.clone(),
            max: value,
        }
    }

    pub fn currency(&self) -> &Currency {
        self.min.currency()
    }

    pub fn min(&self) -> &Money {
        &self.min
    }

    pub fn max(&self) -> &Money {
        &self.max
    }

    pub fn scale(&self) -> u32 {
        self.min.scale()
    }

    /// True when the range holds no headroom at all.
    pub fn is_zero(&self) -> bool {
        self.max.is_zero()
    }

    pub fn contains(&self, value: &Money) -> Result<bool> {
        Ok(self.min.compare(value)? != Ordering::Greater
            && self.max.compare(value)? != Ordering::Less)
    }

    /// Intersection of two ranges; `None` when they do not overlap.
    pub fn intersect(&self, other: &Self) -> Result<Option<Self>> {
        let min = Money::max_of(&self.min, &other.min)?;
        let max = Money::min_of(&self.max, &other.max)?;
        if min.compare(&max)? == Ordering::Greater {
            return Ok(None);
        }
        Ok(Some(Self::new(min, max)?))
    }

    /// Clamp `value` into the range.
    pub fn clamp(&self, value: &Money) -> Result<Money> {
        value.ensure_same_currency(&self.min)?;
        if value.compare(&self.min)? == Ordering::Less {
            return Ok(self.min.clone());
        }
        if value.compare(&self.max)? == Ordering::Greater {
            return Ok(self.max.clone());
        }
        Ok(value.clone())
    }

    /// Canonical signature fragment, e.g. `USD:1.500:3.000:3`.
    pub fn signature_fragment(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.currency(),
            self.min.canonical_amount(),
            self.max.canonical_amount(),
            self.scale()
        )
    }
}

impl fmt::Display for MoneyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(amount: &str, scale: u32) -> Money {
        Money::parse("USD", amount, scale).unwrap()
    }

    fn range(min: &str, max: &str, scale: u32) -> MoneyRange {
        MoneyRange::new(usd(min, scale), usd(max, scale)).unwrap()
    }

    #[test]
    fn test_endpoints_share_the_max_scale() {
        let r = MoneyRange::new(usd("1.5", 1), usd("3", 3)).unwrap();
        assert_eq!(r.scale(), 3);
        assert_eq!(r.signature_fragment(), "USD:1.500:3.000:3");
    }

    #[test]
    fn test_inverted_range_fails() {
        let err = MoneyRange::new(usd("2.00", 2), usd("1.00", 2)).unwrap_err();
        assert_eq!(err.input_kind(), Some(InvalidInputKind::InvertedBounds));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = range("1.00", "3.00", 2);
        assert!(r.contains(&usd("1.00", 2)).unwrap());
        assert!(r.contains(&usd("3.00", 2)).unwrap());
        assert!(r.contains(&usd("2.5", 1)).unwrap());
        assert!(!r.contains(&usd("0.99", 2)).unwrap());
        assert!(!r.contains(&usd("3.01", 2)).unwrap());
    }

    #[test]
    fn test_intersect() {
        let a = range("1.00", "3.00", 2);
        let b = range("2.00", "5.00", 2);
        let both = a.intersect(&b).unwrap().unwrap();
        assert_eq!(both.min(), &usd("2.00", 2));
        assert_eq!(both.max(), &usd("3.00", 2));

        let c = range("4.00", "5.00", 2);
        assert!(a.intersect(&c).unwrap().is_none());
        // Touching endpoints overlap in a single point.
        let d = range("3.00", "5.00", 2);
        let point = a.intersect(&d).unwrap().unwrap();
        assert_eq!(point.min(), point.max());
    }

    #[test]
    fn test_clamp() {
        let r = range("1.00", "3.00", 2);
        assert_eq!(r.clamp(&usd("0.50", 2)).unwrap(), usd("1.00", 2));
        assert_eq!(r.clamp(&usd("9.00", 2)).unwrap(), usd("3.00", 2));
        assert_eq!(r.clamp(&usd("2.00", 2)).unwrap(), usd("2.00", 2));
    }
}
