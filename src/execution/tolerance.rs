//! Residual tolerance evaluation
//!
//! The residual is the achieved relative deviation of the actual spend
//! from the desired spend, at the canonical scale. A path whose residual
//! falls outside the configured window is rejected with absence, never an
//! error.

use bigdecimal::BigDecimal;

use crate::decimal::{self, SCALE};
use crate::error::Result;
use crate::money::{Money, ToleranceWindow};

pub struct ToleranceEvaluator;

impl ToleranceEvaluator {
    /// `|actual - desired| / desired` at scale 18. A zero desired spend
    /// admits only a zero actual (residual zero); anything else is `None`.
    pub fn residual(actual: &Money, desired: &Money) -> Result<Option<BigDecimal>> {
        actual.ensure_same_currency(desired)?;
        if desired.is_zero() {
            if actual.is_zero() {
                return Ok(Some(decimal::normalize(&BigDecimal::from(0), SCALE)));
            }
            return Ok(None);
        }
        let diff = (actual.amount() - desired.amount()).abs();
        Ok(Some(decimal::div(&diff, desired.amount(), SCALE)?))
    }

    /// The residual when it falls inside `window`, `None` otherwise.
    pub fn evaluate(
        actual: &Money,
        desired: &Money,
        window: &ToleranceWindow,
    ) -> Result<Option<BigDecimal>> {
        match Self::residual(actual, desired)? {
            Some(residual) if window.accepts(&residual) => Ok(Some(residual)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(amount: &str, scale: u32) -> Money {
        Money::parse("USD", amount, scale).unwrap()
    }

    #[test]
    fn test_residual_is_relative_deviation() {
        let residual = ToleranceEvaluator::residual(&usd("95.00", 2), &usd("100.00", 2))
            .unwrap()
            .unwrap();
        assert_eq!(residual.to_string(), "0.050000000000000000");

        // Symmetric for overshoot.
        let residual = ToleranceEvaluator::residual(&usd("105.00", 2), &usd("100.00", 2))
            .unwrap()
            .unwrap();
        assert_eq!(residual.to_string(), "0.050000000000000000");

        let exact = ToleranceEvaluator::residual(&usd("100.00", 2), &usd("100", 0))
            .unwrap()
            .unwrap();
        assert!(exact.eq(&BigDecimal::from(0)));
    }

    #[test]
    fn test_zero_desired_spend() {
        let zero = usd("0.00", 2);
        assert!(ToleranceEvaluator::residual(&zero, &zero).unwrap().unwrap().eq(&BigDecimal::from(0)));
        assert!(ToleranceEvaluator::residual(&usd("0.01", 2), &zero).unwrap().is_none());
    }

    #[test]
    fn test_currency_mismatch_is_an_error() {
        let eur = Money::parse("EUR", "100.00", 2).unwrap();
        assert!(ToleranceEvaluator::residual(&eur, &usd("100.00", 2)).is_err());
    }

    #[test]
    fn test_evaluate_gates_on_the_window() {
        let window = ToleranceWindow::parse("0", "0.05").unwrap();
        assert!(ToleranceEvaluator::evaluate(&usd("95.00", 2), &usd("100.00", 2), &window)
            .unwrap()
            .is_some());
        assert!(ToleranceEvaluator::evaluate(&usd("94.99", 2), &usd("100.00", 2), &window)
            .unwrap()
            .is_none());

        // A window with a positive minimum rejects an exact spend.
        let window = ToleranceWindow::parse("0.01", "0.05").unwrap();
        assert!(ToleranceEvaluator::evaluate(&usd("100.00", 2), &usd("100.00", 2), &window)
            .unwrap()
            .is_none());
    }
}
