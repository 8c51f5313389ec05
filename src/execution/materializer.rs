//! Leg materialization
//!
//! Turns an abstract candidate into concrete per-leg fills. BUY legs pick
//! the base amount whose gross spend (base plus base fee) lands on the
//! target without busting the hard ceiling; SELL legs pick the base amount
//! whose produced quote matches the target within the resolution
//! tolerance. Both refine iteratively by a ratio and give up with absence
//! when the ratio collapses or the order bounds cannot host the amount.
//!
//! Author: AI-Generated
//! Created: 2026-07-28

use bigdecimal::{BigDecimal, Zero};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::trace;

use crate::decimal::{self, SCALE};
use crate::error::Result;
use crate::execution::PathHop;
use crate::money::{Currency, Money};
use crate::order::FeeBreakdown;
use crate::order::OrderSide;
use crate::search::state::{CandidatePath, PathEdge};
use crate::search::{OrderSpendAnalyzer, SearchConfig};

/// Extra ratio precision while shrinking a BUY leg toward its ceiling.
pub const BUY_ADJUSTMENT_RATIO_EXTRA_SCALE: u32 = 4;

/// Extra ratio precision while resolving a SELL leg onto its target quote.
pub const SELL_RESOLUTION_RATIO_EXTRA_SCALE: u32 = 6;

/// Refinement gives up after this many ratio steps.
const MAX_REFINEMENT_ITERATIONS: usize = 24;

/// Accepted relative gap between a produced amount and its target; covers
/// rounding at the rate's own scale.
static RESOLUTION_RELATIVE_TOLERANCE: Lazy<BigDecimal> =
    Lazy::new(|| decimal::parse("0.001").unwrap());

pub struct LegMaterializer;

impl LegMaterializer {
    /// Materialize every hop of `candidate`, or `None` when any leg cannot
    /// be filled. The first leg is seeded by the spend analyzer; later
    /// legs spend the previous leg's receipt in full.
    pub fn materialize(
        candidate: &CandidatePath,
        config: &SearchConfig,
    ) -> Result<Option<Vec<PathHop>>> {
        let Some(first) = candidate.edges().first() else {
            return Ok(None);
        };
        let Some(seed) = OrderSpendAnalyzer::initial_seed(config, first.graph_edge())? else {
            return Ok(None);
        };

        let mut legs: Vec<PathHop> = Vec::with_capacity(candidate.edges().len());
        let mut incoming: Option<Money> = None;

        for path_edge in candidate.edges() {
            let (target, ceiling, net_hint) = match &incoming {
                None => (
                    seed.gross().clone(),
                    seed.gross_ceiling().clone(),
                    seed.net().clone(),
                ),
                Some(receipt) => (
                    receipt.clone(),
                    receipt.clone(),
                    path_edge.graph_edge().net_base_hint(receipt)?,
                ),
            };

            let hop = match path_edge.order_side() {
                OrderSide::Buy => Self::resolve_buy_leg(path_edge, &target, &ceiling, &net_hint)?,
                OrderSide::Sell => Self::resolve_sell_leg(path_edge, &target)?,
            };
            let Some(hop) = hop else {
                trace!("leg {} -> {} failed to materialize", path_edge.from(), path_edge.to());
                return Ok(None);
            };
            incoming = Some(hop.received.clone());
            legs.push(hop);
        }
        Ok(Some(legs))
    }

    /// BUY: the taker spends base. Start from the pre-fee hint and shrink
    /// by `ceiling / gross` until the gross spend fits under the ceiling
    /// inside the order bounds.
    fn resolve_buy_leg(
        edge: &PathEdge,
        target: &Money,
        ceiling: &Money,
        net_hint: &Money,
    ) -> Result<Option<PathHop>> {
        let order = edge.order();
        let bounds = order.bounds();
        let mut base = bounds.clamp(net_hint)?;

        for _ in 0..MAX_REFINEMENT_ITERATIONS {
            let raw_quote = order.quote_amount(&base)?;
            let fees = order.fill_fees(&base, &raw_quote)?;
            let base_fee = fees.fee_or_zero(order.pair().base(), base.scale())?;
            let quote_fee = fees.fee_or_zero(order.pair().quote(), raw_quote.scale())?;
            let gross = base.add(&base_fee)?;

            if gross.compare(ceiling)? != Ordering::Greater {
                let received = raw_quote.sub(&quote_fee)?;
                return Ok(Some(PathHop {
                    from: edge.from().clone(),
                    to: edge.to().clone(),
                    spent: gross,
                    received,
                    fees: nonzero_fees(&fees),
                    order: order.clone(),
                }));
            }

            let aim = Money::min_of(target, ceiling)?;
            let ratio = aim.ratio_to(&gross, SCALE + BUY_ADJUSTMENT_RATIO_EXTRA_SCALE)?;
            if ratio.is_zero() {
                return Ok(None);
            }
            let scaled = base.mul_decimal(&ratio, base.scale())?;
            if scaled.compare(bounds.min())? == Ordering::Less {
                // Even the mandatory floor busts the ceiling.
                return Ok(None);
            }
            let clamped = bounds.clamp(&scaled)?;
            if clamped.compare(&base)? == Ordering::Equal {
                return Ok(None);
            }
            base = clamped;
        }
        Ok(None)
    }

    /// SELL: the taker spends quote. The base receipt comes from the
    /// inverted rate; the produced quote must land on the target within
    /// the resolution tolerance. On acceptance the leg records the agreed
    /// target as spent, at the scale the rate converts at.
    fn resolve_sell_leg(edge: &PathEdge, target: &Money) -> Result<Option<PathHop>> {
        let order = edge.order();
        let bounds = order.bounds();
        if target.is_zero() {
            return Ok(None);
        }

        let inverted = order.rate().invert()?;
        let mut base = bounds.clamp(&inverted.convert(target, None)?)?;

        for _ in 0..MAX_REFINEMENT_ITERATIONS {
            let raw_quote = order.quote_amount(&base)?;
            let fees = order.fill_fees(&base, &raw_quote)?;
            let base_fee = fees.fee_or_zero(order.pair().base(), base.scale())?;
            let quote_fee = fees.fee_or_zero(order.pair().quote(), raw_quote.scale())?;
            let actual = raw_quote.add(&quote_fee)?;

            if actual.is_zero() {
                return Ok(None);
            }

            let gap_scale = SCALE + SELL_RESOLUTION_RATIO_EXTRA_SCALE;
            let gap = {
                let diff = (actual.amount() - target.amount()).abs();
                decimal::div(&diff, target.amount(), gap_scale)?
            };
            if gap <= *RESOLUTION_RELATIVE_TOLERANCE {
                let spent_scale = target.scale().max(order.rate().scale());
                let received = base.sub(&base_fee)?;
                return Ok(Some(PathHop {
                    from: edge.from().clone(),
                    to: edge.to().clone(),
                    spent: target.rescale(spent_scale)?,
                    received,
                    fees: nonzero_fees(&fees),
                    order: order.clone(),
                }));
            }

            let ratio = target.ratio_to(&actual, gap_scale)?;
            if ratio.is_zero() {
                return Ok(None);
            }
            let scaled = bounds.clamp(&base.mul_decimal(&ratio, base.scale())?)?;
            if scaled.compare(&base)? == Ordering::Equal {
                // Pinned against a bound; the target is out of reach.
                return Ok(None);
            }
            base = scaled;
        }
        Ok(None)
    }

    /// Subtract a spend from a budget in the same currency, clamping at
    /// zero; budgets in other currencies pass through untouched.
    pub fn reduce_budget(budget: &Money, spent: &Money) -> Result<Money> {
        if budget.currency() != spent.currency() {
            return Ok(budget.clone());
        }
        if spent.compare(budget)? == Ordering::Greater {
            return Money::zero(
                budget.currency().clone(),
                budget.scale().max(spent.scale()),
            );
        }
        budget.sub(spent)
    }
}

/// Leg-level fee map: zero fees filtered out, keyed (and therefore sorted)
/// by currency.
fn nonzero_fees(fees: &FeeBreakdown) -> BTreeMap<Currency, Money> {
    fees.iter()
        .filter(|(_, fee)| !fee.is_zero())
        .map(|(currency, fee)| (currency.clone(), fee.clone()))
        .collect()
}
