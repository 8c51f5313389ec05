//! Money
//!
//! A non-negative amount in a currency at an explicit scale. The stored
//! decimal is always normalized to exactly `scale` places, so serialization
//! and signatures are canonical by construction.

use bigdecimal::{BigDecimal, Zero};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

use crate::decimal;
use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::money::Currency;

/// Highest supported amount scale.
pub const MAX_MONEY_SCALE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    currency: Currency,
    amount: BigDecimal,
    scale: u32,
}

impl Money {
    /// Build a money value. The amount is rescaled to `scale` (HALF_UP) and
    /// must be non-negative; `scale` must be within `0..=50`.
    pub fn new(currency: Currency, amount: BigDecimal, scale: u32) -> Result<Self> {
        check_scale(scale)?;
        let amount = decimal::normalize(&amount, scale);
        if decimal::is_negative(&amount) {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::NegativeAmount,
                format!("negative amount {amount} {currency}"),
            ));
        }
        Ok(Self {
            currency,
            amount,
            scale,
        })
    }

    /// Parse from code and decimal string, e.g. `Money::parse("USD", "100.00", 2)`.
    pub fn parse(currency: &str, amount: &str, scale: u32) -> Result<Self> {
        Self::new(Currency::new(currency)?, decimal::parse(amount)?, scale)
    }

    pub fn zero(currency: Currency, scale: u32) -> Result<Self> {
        Self::new(currency, BigDecimal::zero(), scale)
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.amount
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// The amount rendered at the declared scale, trailing zeros preserved.
    pub fn canonical_amount(&self) -> String {
        decimal::to_canonical_string(&self.amount, self.scale)
    }

    /// Rescale to `scale` (HALF_UP).
    pub fn rescale(&self, scale: u32) -> Result<Self> {
        Self::new(self.currency.clone(), self.amount.clone(), scale)
    }

    /// Sum of two amounts in the same currency; result scale is the max of
    /// the operand scales.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.ensure_same_currency(other)?;
        let scale = self.scale.max(other.scale);
        Self::new(
            self.currency.clone(),
            decimal::add(&self.amount, &other.amount, scale),
            scale,
        )
    }

    /// Difference of two amounts in the same currency. Fails with
    /// `NegativeAmount` when the result would go below zero.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.ensure_same_currency(other)?;
        let scale = self.scale.max(other.scale);
        Self::new(
            self.currency.clone(),
            decimal::sub(&self.amount, &other.amount, scale),
            scale,
        )
    }

    /// Multiply by a plain decimal factor, keeping the currency.
    pub fn mul_decimal(&self, factor: &BigDecimal, scale: u32) -> Result<Self> {
        Self::new(
            self.currency.clone(),
            decimal::mul(&self.amount, factor, scale),
            scale,
        )
    }

    /// `self / other` as a plain ratio at the requested scale.
    pub fn ratio_to(&self, other: &Self, scale: u32) -> Result<BigDecimal> {
        self.ensure_same_currency(other)?;
        decimal::div(&self.amount, &other.amount, scale)
    }

    /// Numeric comparison; equivalent to comparing both normalized to the
    /// max of the two scales.
    pub fn compare(&self, other: &Self) -> Result<Ordering> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    pub fn min_of(a: &Self, b: &Self) -> Result<Self> {
        Ok(match a.compare(b)? {
            Ordering::Greater => b.clone(),
            _ => a.clone(),
        })
    }

    pub fn max_of(a: &Self, b: &Self) -> Result<Self> {
        Ok(match a.compare(b)? {
            Ordering::Less => b.clone(),
            _ => a.clone(),
        })
    }

    pub fn ensure_same_currency(&self, other: &Self) -> Result<()> {
        if self.currency != other.currency {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::CurrencyMismatch,
                format!("{} vs {}", self.currency, other.currency),
            ));
        }
        Ok(())
    }
}

fn check_scale(scale: u32) -> Result<()> {
    if scale > MAX_MONEY_SCALE {
        return Err(PathSearchError::invalid_input(
            InvalidInputKind::ScaleOutOfRange,
            format!("scale {scale} exceeds {MAX_MONEY_SCALE}"),
        ));
    }
    Ok(())
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.canonical_amount(), self.currency)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Money", 3)?;
        state.serialize_field("currency", &self.currency)?;
        state.serialize_field("amount", &self.canonical_amount())?;
        state.serialize_field("scale", &self.scale)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct MoneyRepr {
    currency: String,
    amount: String,
    scale: u32,
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = MoneyRepr::deserialize(deserializer)?;
        Money::parse(&repr.currency, &repr.amount, repr.scale).map_err(serde::de::Error::custom)
    }
}
