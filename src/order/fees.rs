//! Fee policies
//!
//! A fee policy prices a prospective fill. It may only return fees
//! denominated in the order's base and/or quote currency; anything else is
//! a fatal input error for the whole request.

use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::decimal;
use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::money::{AssetPair, Currency, Money};
use crate::order::OrderSide;

/// Currency-keyed fee set for one prospective fill. Keys iterate in
/// lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeeBreakdown {
    fees: BTreeMap<Currency, Money>,
}

impl FeeBreakdown {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge a list of fee amounts, summing entries in the same currency.
    pub fn from_fees(fees: Vec<Money>) -> Result<Self> {
        let mut merged: BTreeMap<Currency, Money> = BTreeMap::new();
        for fee in fees {
            match merged.remove(fee.currency()) {
                Some(existing) => {
                    let sum = existing.add(&fee)?;
                    merged.insert(fee.currency().clone(), sum);
                }
                None => {
                    merged.insert(fee.currency().clone(), fee);
                }
            }
        }
        Ok(Self { fees: merged })
    }

    pub fn is_empty(&self) -> bool {
        self.fees.is_empty()
    }

    pub fn fee_in(&self, currency: &Currency) -> Option<&Money> {
        self.fees.get(currency)
    }

    /// The fee in `currency`, or zero at `scale` when absent.
    pub fn fee_or_zero(&self, currency: &Currency, scale: u32) -> Result<Money> {
        match self.fees.get(currency) {
            Some(fee) => Ok(fee.clone()),
            None => Money::zero(currency.clone(), scale),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Currency, &Money)> {
        self.fees.iter()
    }

    /// Every fee must be denominated in the pair's base or quote.
    pub fn ensure_within_pair(&self, pair: &AssetPair) -> Result<()> {
        for currency in self.fees.keys() {
            if currency != pair.base() && currency != pair.quote() {
                return Err(PathSearchError::invalid_input(
                    InvalidInputKind::ForeignFeeCurrency,
                    format!("fee in {currency} outside pair {pair}"),
                ));
            }
        }
        Ok(())
    }
}

/// Capability interface: price the fees for a prospective fill.
///
/// `base_amount` is the nominal base fill; `quote_amount` the raw quote it
/// converts to before fees. Implementations must be deterministic.
pub trait FeePolicy: Send + Sync + fmt::Debug {
    fn calculate(
        &self,
        side: OrderSide,
        base_amount: &Money,
        quote_amount: &Money,
    ) -> Result<FeeBreakdown>;
}

/// Proportional fees on the base and/or quote leg of the fill.
#[derive(Debug, Clone)]
pub struct PercentageFeePolicy {
    base_rate: Option<BigDecimal>,
    quote_rate: Option<BigDecimal>,
}

impl PercentageFeePolicy {
    /// Rates are fractions (`0.01` is one percent) and must be non-negative.
    pub fn new(base_rate: Option<BigDecimal>, quote_rate: Option<BigDecimal>) -> Result<Self> {
        for rate in [&base_rate, &quote_rate].into_iter().flatten() {
            if decimal::is_negative(rate) {
                return Err(PathSearchError::invalid_input(
                    InvalidInputKind::NegativeAmount,
                    format!("negative fee rate {rate}"),
                ));
            }
        }
        Ok(Self {
            base_rate,
            quote_rate,
        })
    }

    pub fn parse(base_rate: Option<&str>, quote_rate: Option<&str>) -> Result<Self> {
        Self::new(
            base_rate.map(decimal::parse).transpose()?,
            quote_rate.map(decimal::parse).transpose()?,
        )
    }
}

impl FeePolicy for PercentageFeePolicy {
    fn calculate(
        &self,
        _side: OrderSide,
        base_amount: &Money,
        quote_amount: &Money,
    ) -> Result<FeeBreakdown> {
        let mut fees = Vec::new();
        if let Some(rate) = &self.base_rate {
            fees.push(base_amount.mul_decimal(rate, base_amount.scale())?);
        }
        if let Some(rate) = &self.quote_rate {
            fees.push(quote_amount.mul_decimal(rate, quote_amount.scale())?);
        }
        FeeBreakdown::from_fees(fees)
    }
}

/// Fixed fees per fill, independent of size.
#[derive(Debug, Clone)]
pub struct FlatFeePolicy {
    base_fee: Option<Money>,
    quote_fee: Option<Money>,
}

impl FlatFeePolicy {
    pub fn new(base_fee: Option<Money>, quote_fee: Option<Money>) -> Self {
        Self {
            base_fee,
            quote_fee,
        }
    }
}

impl FeePolicy for FlatFeePolicy {
    fn calculate(
        &self,
        _side: OrderSide,
        _base_amount: &Money,
        _quote_amount: &Money,
    ) -> Result<FeeBreakdown> {
        let fees = [&self.base_fee, &self.quote_fee]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        FeeBreakdown::from_fees(fees)
    }
}
