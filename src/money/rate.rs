//! Asset pairs and exchange rates
//!
//! A rate is quote-per-base at an explicit scale. `convert` moves base
//! money to quote money; `convert_from_quote` divides back without an
//! intermediate inversion so no precision is lost on that path.

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;
use std::fmt;

use crate::decimal;
use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::money::{Currency, Money, MAX_MONEY_SCALE};

/// The two assets of a tradable pair; base and quote must differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetPair {
    base: Currency,
    quote: Currency,
}

impl AssetPair {
    pub fn new(base: Currency, quote: Currency) -> Result<Self> {
        if base == quote {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::IdenticalAssets,
                format!("asset pair {base}/{quote} has identical sides"),
            ));
        }
        Ok(Self { base, quote })
    }

    pub fn parse(base: &str, quote: &str) -> Result<Self> {
        Self::new(Currency::new(base)?, Currency::new(quote)?)
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn quote(&self) -> &Currency {
        &self.quote
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Strictly positive quote-per-base conversion rate at a fixed scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeRate {
    base: Currency,
    quote: Currency,
    #[serde(serialize_with = "serialize_value")]
    value: BigDecimal,
    scale: u32,
}

fn serialize_value<S: serde::Serializer>(
    value: &BigDecimal,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

impl ExchangeRate {
    pub fn new(base: Currency, quote: Currency, value: BigDecimal, scale: u32) -> Result<Self> {
        if base == quote {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::IdenticalAssets,
                format!("rate {base}/{quote} has identical sides"),
            ));
        }
        if scale > MAX_MONEY_SCALE {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::ScaleOutOfRange,
                format!("rate scale {scale} exceeds {MAX_MONEY_SCALE}"),
            ));
        }
        if decimal::is_negative(&value) || value.is_zero() {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::RatePositivity,
                format!("rate value {value} must be strictly positive"),
            ));
        }
        let normalized = decimal::normalize(&value, scale);
        if normalized.is_zero() {
            // Positive input that vanishes at the declared scale.
            return Err(PathSearchError::PrecisionViolation(format!(
                "rate value {value} is not representable at scale {scale}"
            )));
        }
        Ok(Self {
            base,
            quote,
            value: normalized,
            scale,
        })
    }

    pub fn parse(base: &str, quote: &str, value: &str, scale: u32) -> Result<Self> {
        Self::new(
            Currency::new(base)?,
            Currency::new(quote)?,
            decimal::parse(value)?,
            scale,
        )
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn quote(&self) -> &Currency {
        &self.quote
    }

    pub fn value(&self) -> &BigDecimal {
        &self.value
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Convert base money into quote money. Result scale is
    /// `max(money.scale, rate.scale, override)`.
    pub fn convert(&self, money: &Money, scale_override: Option<u32>) -> Result<Money> {
        if money.currency() != &self.base {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::CurrencyMismatch,
                format!("cannot convert {} with rate {}/{}", money.currency(), self.base, self.quote),
            ));
        }
        let scale = result_scale(money.scale(), self.scale, scale_override);
        Money::new(
            self.quote.clone(),
            decimal::mul(money.amount(), &self.value, scale),
            scale,
        )
    }

    /// Convert quote money back into base money by division.
    pub fn convert_from_quote(&self, money: &Money, scale_override: Option<u32>) -> Result<Money> {
        if money.currency() != &self.quote {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::CurrencyMismatch,
                format!("cannot invert-convert {} with rate {}/{}", money.currency(), self.base, self.quote),
            ));
        }
        let scale = result_scale(money.scale(), self.scale, scale_override);
        Money::new(
            self.base.clone(),
            decimal::div(money.amount(), &self.value, scale)?,
            scale,
        )
    }

    /// The inverse rate, `1 / value` at the same scale.
    pub fn invert(&self) -> Result<Self> {
        let one = BigDecimal::from(1);
        let inverted = decimal::div(&one, &self.value, self.scale)?;
        Self::new(self.quote.clone(), self.base.clone(), inverted, self.scale)
    }
}

fn result_scale(money_scale: u32, rate_scale: u32, scale_override: Option<u32>) -> u32 {
    money_scale.max(rate_scale).max(scale_override.unwrap_or(0))
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} @ {}", self.base, self.quote, self.value)
    }
}
