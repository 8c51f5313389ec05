//! Order spend analysis
//!
//! For an edge leaving the source, derive the initial seed: the tolerance
//! window around the desired spend, clamped to what the edge can actually
//! carry on its input side. The gross ceiling survives into materialization
//! as a hard cap.
//!
//! Author: AI-Generated
//! Created: 2026-07-27

use bigdecimal::BigDecimal;

use crate::decimal::{self, SCALE, SUM_EXTRA_SCALE};
use crate::error::{PathSearchError, Result};
use crate::graph::GraphEdge;
use crate::money::{Money, MoneyRange};
use crate::search::config::SearchConfig;

/// Minimum scale at which the spend window is evaluated.
pub const BOUND_SCALE: u32 = 8;

/// Initial per-edge seed in the edge's input currency.
#[derive(Debug, Clone)]
pub struct SpendSeed {
    net: Money,
    gross: Money,
    gross_ceiling: Money,
    window: MoneyRange,
}

impl SpendSeed {
    /// Pre-fee nominal input estimate behind `gross`.
    pub fn net(&self) -> &Money {
        &self.net
    }

    /// The clamped target the materializer aims to spend.
    pub fn gross(&self) -> &Money {
        &self.gross
    }

    /// Hard upper cap on the gross input, fees included.
    pub fn gross_ceiling(&self) -> &Money {
        &self.gross_ceiling
    }

    /// The full feasible input window for search propagation.
    pub fn window(&self) -> &MoneyRange {
        &self.window
    }

    pub fn into_window(self) -> MoneyRange {
        self.window
    }
}

pub struct OrderSpendAnalyzer;

impl OrderSpendAnalyzer {
    /// The raw tolerance window around the configured spend, before any
    /// capacity clamping: `[spend * (1 - min), spend * (1 + max)]` at
    /// `max(spend.scale, BOUND_SCALE)`.
    pub fn spend_window(config: &SearchConfig) -> Result<MoneyRange> {
        let spend = config.spend();
        let scale = spend.scale().max(BOUND_SCALE);
        let one = BigDecimal::from(1);
        let low_factor = decimal::sub(&one, config.tolerance().minimum(), SCALE + SUM_EXTRA_SCALE);
        let high_factor = decimal::add(&one, config.tolerance().maximum(), SCALE + SUM_EXTRA_SCALE);
        let window = MoneyRange::new(
            spend.mul_decimal(&low_factor, scale)?,
            spend.mul_decimal(&high_factor, scale)?,
        )?;
        // A tolerance that asks for width must produce width; a point
        // window here means the spend carries too few digits for it.
        if low_factor != high_factor && !spend.is_zero() && window.min() == window.max() {
            return Err(PathSearchError::PrecisionViolation(format!(
                "tolerance window around {spend} collapses at scale {scale}"
            )));
        }
        Ok(window)
    }

    /// The seed for one source edge, or `None` when the edge cannot satisfy
    /// any spend inside the tolerance window (including the case where the
    /// window tops out below the edge's mandatory floor).
    pub fn initial_seed(config: &SearchConfig, edge: &GraphEdge) -> Result<Option<SpendSeed>> {
        let spend = config.spend();
        if edge.from() != spend.currency() {
            return Ok(None);
        }

        let window = Self::spend_window(config)?;
        let Some(feasible) = edge.supports_amount(Some(&window))? else {
            return Ok(None);
        };

        let gross = feasible.clamp(spend)?;
        let gross_ceiling = feasible.max().clone();
        let net = edge.net_base_hint(&gross)?;

        Ok(Some(SpendSeed {
            net,
            gross,
            gross_ceiling,
            window: feasible,
        }))
    }
}
