//! Tolerance window
//!
//! Permitted relative deviation of actual spend from desired spend. Both
//! bounds live in `[0, 1)` at the canonical scale. The heuristic tolerance
//! feeds the search cost amplifier; the full window gates materialized
//! paths via the residual check.

use bigdecimal::{BigDecimal, Zero};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::decimal::{self, SCALE};
use crate::error::{InvalidInputKind, PathSearchError, Result};

/// Upper clamp for the amplifier denominator: eighteen nines.
static TOLERANCE_CAP: Lazy<BigDecimal> =
    Lazy::new(|| decimal::parse("0.999999999999999999").unwrap());

/// Which bound supplied the heuristic tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeuristicSource {
    Maximum,
    Minimum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToleranceWindow {
    #[serde(serialize_with = "serialize_bound")]
    minimum: BigDecimal,
    #[serde(serialize_with = "serialize_bound")]
    maximum: BigDecimal,
}

fn serialize_bound<S: serde::Serializer>(
    value: &BigDecimal,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

impl ToleranceWindow {
    pub fn new(minimum: BigDecimal, maximum: BigDecimal) -> Result<Self> {
        let minimum = decimal::normalize(&minimum, SCALE);
        let maximum = decimal::normalize(&maximum, SCALE);
        let one = BigDecimal::from(1);
        for bound in [&minimum, &maximum] {
            if decimal::is_negative(bound) || bound >= &one {
                return Err(PathSearchError::invalid_input(
                    InvalidInputKind::ToleranceOutOfRange,
                    format!("tolerance {bound} outside [0, 1)"),
                ));
            }
        }
        if minimum.cmp(&maximum) == Ordering::Greater {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::ToleranceOutOfRange,
                format!("tolerance minimum {minimum} above maximum {maximum}"),
            ));
        }
        Ok(Self { minimum, maximum })
    }

    /// Parse from user-facing strings, e.g. `ToleranceWindow::parse("0", "0.01")`.
    pub fn parse(minimum: &str, maximum: &str) -> Result<Self> {
        Self::new(decimal::parse(minimum)?, decimal::parse(maximum)?)
    }

    pub fn zero() -> Self {
        Self {
            minimum: decimal::normalize(&BigDecimal::zero(), SCALE),
            maximum: decimal::normalize(&BigDecimal::zero(), SCALE),
        }
    }

    pub fn minimum(&self) -> &BigDecimal {
        &self.minimum
    }

    pub fn maximum(&self) -> &BigDecimal {
        &self.maximum
    }

    /// The single tolerance used by the search heuristic: the maximum when
    /// nonzero, otherwise the minimum. The source tag records which.
    pub fn heuristic(&self) -> (&BigDecimal, HeuristicSource) {
        if !self.maximum.is_zero() {
            (&self.maximum, HeuristicSource::Maximum)
        } else {
            (&self.minimum, HeuristicSource::Minimum)
        }
    }

    /// `1 / (1 - t)` at the canonical scale, with `t` capped just below one.
    pub fn amplifier(&self) -> Result<BigDecimal> {
        let (tolerance, _) = self.heuristic();
        let capped = if tolerance > &*TOLERANCE_CAP {
            TOLERANCE_CAP.clone()
        } else {
            tolerance.clone()
        };
        let one = BigDecimal::from(1);
        decimal::div(&one, &(&one - &capped), SCALE)
    }

    /// True when the residual `deviation` falls inside `[minimum, maximum]`.
    pub fn accepts(&self, deviation: &BigDecimal) -> bool {
        let deviation = decimal::normalize(deviation, SCALE);
        deviation.cmp(&self.minimum) != Ordering::Less
            && deviation.cmp(&self.maximum) != Ordering::Greater
    }
}

impl fmt::Display for ToleranceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.minimum, self.maximum)
    }
}
