//! Decimal kernel
//!
//! Fixed-scale arithmetic with HALF_UP rounding. Every cost, ratio,
//! tolerance and serialized amount in the crate goes through this module,
//! which makes comparisons bit-identical across runs and platforms.
//!
//! HALF_UP rounds a half away from zero: `0.5 -> 1`, `-0.5 -> -1`.

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{InvalidInputKind, PathSearchError, Result};

/// Canonical scale for all cost, tolerance, ratio and residual decisions.
pub const SCALE: u32 = 18;

/// Extra precision carried by intermediate ratios before normalizing.
pub const RATIO_EXTRA_SCALE: u32 = 4;

/// Extra precision carried by intermediate sums before normalizing.
pub const SUM_EXTRA_SCALE: u32 = 2;

static ONE_CANONICAL: Lazy<BigDecimal> =
    Lazy::new(|| BigDecimal::from(1).with_scale(SCALE as i64));

/// The multiplicative identity at the canonical scale.
pub fn one() -> BigDecimal {
    ONE_CANONICAL.clone()
}

/// Rescale `value` to exactly `scale` decimal places, HALF_UP.
pub fn normalize(value: &BigDecimal, scale: u32) -> BigDecimal {
    value.with_scale_round(scale as i64, RoundingMode::HalfUp)
}

/// `a + b` normalized to `scale`. The sum is exact before rounding.
pub fn add(a: &BigDecimal, b: &BigDecimal, scale: u32) -> BigDecimal {
    normalize(&(a + b), scale)
}

/// `a - b` normalized to `scale`. The difference is exact before rounding.
pub fn sub(a: &BigDecimal, b: &BigDecimal, scale: u32) -> BigDecimal {
    normalize(&(a - b), scale)
}

/// `a * b` normalized to `scale`. The product is exact before rounding.
pub fn mul(a: &BigDecimal, b: &BigDecimal, scale: u32) -> BigDecimal {
    normalize(&(a * b), scale)
}

/// `a / b` normalized to `scale`. Fails on a zero divisor. The quotient is
/// produced at the backend's extended precision and then rounded once.
pub fn div(a: &BigDecimal, b: &BigDecimal, scale: u32) -> Result<BigDecimal> {
    if b.is_zero() {
        return Err(PathSearchError::invalid_input(
            InvalidInputKind::DivisionByZero,
            format!("division of {a} by zero"),
        ));
    }
    Ok(normalize(&(a / b), scale))
}

/// Compare `a` and `b` after normalizing both to `scale`.
pub fn compare(a: &BigDecimal, b: &BigDecimal, scale: u32) -> Ordering {
    normalize(a, scale).cmp(&normalize(b, scale))
}

/// Parse a decimal string. Surfaces `MalformedNumber` on failure.
pub fn parse(text: &str) -> Result<BigDecimal> {
    let trimmed = text.trim();
    BigDecimal::from_str(trimmed).map_err(|e| {
        PathSearchError::invalid_input(
            InvalidInputKind::MalformedNumber,
            format!("not a decimal number: {trimmed:?} ({e})"),
        )
    })
}

/// The canonical string at `scale`: `.` separator, trailing zeros preserved.
pub fn to_canonical_string(value: &BigDecimal, scale: u32) -> String {
    normalize(value, scale).to_string()
}

/// True when `value` is strictly below zero.
pub fn is_negative(value: &BigDecimal) -> bool {
    value < &BigDecimal::zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        parse(s).unwrap()
    }

    #[test]
    fn test_half_up_rounding_laws() {
        assert_eq!(to_canonical_string(&dec("0.5"), 0), "1");
        assert_eq!(to_canonical_string(&dec("-0.5"), 0), "-1");
        assert_eq!(to_canonical_string(&dec("2.5"), 0), "3");
        assert_eq!(to_canonical_string(&dec("2.4"), 0), "2");
        assert_eq!(to_canonical_string(&dec("-2.5"), 0), "-3");
    }

    #[test]
    fn test_normalize_preserves_trailing_zeros() {
        assert_eq!(to_canonical_string(&dec("1.5"), 4), "1.5000");
        assert_eq!(to_canonical_string(&dec("100"), 2), "100.00");
        assert_eq!(to_canonical_string(&dec("0"), 18), "0.000000000000000000");
    }

    #[test]
    fn test_normalize_rounds_at_requested_scale() {
        assert_eq!(to_canonical_string(&dec("1.005"), 2), "1.01");
        assert_eq!(to_canonical_string(&dec("1.0049"), 2), "1.00");
        assert_eq!(to_canonical_string(&dec("1.111"), 2), "1.11");
    }

    #[test]
    fn test_add_sub_at_scale() {
        assert_eq!(to_canonical_string(&add(&dec("1.05"), &dec("2.005"), 3), 3), "3.055");
        assert_eq!(to_canonical_string(&add(&dec("1.05"), &dec("2.005"), 2), 2), "3.06");
        assert_eq!(to_canonical_string(&sub(&dec("3.00"), &dec("1.999"), 2), 2), "1.00");
    }

    #[test]
    fn test_mul_div() {
        assert_eq!(to_canonical_string(&mul(&dec("1.5"), &dec("1.5"), 2), 2), "2.25");
        let q = div(&dec("1"), &dec("3"), 6).unwrap();
        assert_eq!(q.to_string(), "0.333333");
        let q = div(&dec("2"), &dec("3"), 6).unwrap();
        assert_eq!(q.to_string(), "0.666667");
    }

    #[test]
    fn test_div_by_zero_fails() {
        let err = div(&dec("1"), &dec("0"), 2).unwrap_err();
        assert_eq!(err.input_kind(), Some(InvalidInputKind::DivisionByZero));
        let err = div(&dec("1"), &dec("0.00"), 2).unwrap_err();
        assert_eq!(err.input_kind(), Some(InvalidInputKind::DivisionByZero));
    }

    #[test]
    fn test_compare_across_scales() {
        assert_eq!(compare(&dec("1.50"), &dec("1.5000"), 4), Ordering::Equal);
        assert_eq!(compare(&dec("1.499"), &dec("1.5"), 2), Ordering::Equal);
        assert_eq!(compare(&dec("1.499"), &dec("1.5"), 3), Ordering::Less);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("1.25").is_ok());
        assert!(parse("  1.25  ").is_ok());
        let err = parse("1.2.5").unwrap_err();
        assert_eq!(err.input_kind(), Some(InvalidInputKind::MalformedNumber));
        assert!(parse("abc").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_one_is_canonical() {
        assert_eq!(one().to_string(), "1.000000000000000000");
    }
}
