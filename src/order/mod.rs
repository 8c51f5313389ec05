//! Orders and the order book
//!
//! An order is a maker's bounded, rated offer on one asset pair. The side
//! is the maker's; it fixes the direction a taker moves through the edge
//! derived from the order (BUY: base to quote, SELL: quote to base).

mod fees;

pub use fees::{FeeBreakdown, FeePolicy, FlatFeePolicy, PercentageFeePolicy};

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::filters::OrderFilter;
use crate::money::{AssetPair, Currency, ExchangeRate, Money, OrderBounds};

/// Maker side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Immutable exchange order.
///
/// Consistency enforced at construction:
/// - bounds are denominated in the pair base
/// - the effective rate runs base to quote of the same pair
#[derive(Debug, Clone)]
pub struct Order {
    side: OrderSide,
    pair: AssetPair,
    bounds: OrderBounds,
    rate: ExchangeRate,
    fee_policy: Option<Arc<dyn FeePolicy>>,
}

impl Order {
    pub fn new(
        side: OrderSide,
        pair: AssetPair,
        bounds: OrderBounds,
        rate: ExchangeRate,
        fee_policy: Option<Arc<dyn FeePolicy>>,
    ) -> Result<Self> {
        if bounds.currency() != pair.base() {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::BoundsCurrency,
                format!("bounds in {} for pair {}", bounds.currency(), pair),
            ));
        }
        if rate.base() != pair.base() || rate.quote() != pair.quote() {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::CurrencyMismatch,
                format!("rate {} does not match pair {}", rate, pair),
            ));
        }
        Ok(Self {
            side,
            pair,
            bounds,
            rate,
            fee_policy,
        })
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn pair(&self) -> &AssetPair {
        &self.pair
    }

    pub fn bounds(&self) -> &OrderBounds {
        &self.bounds
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    pub fn fee_policy(&self) -> Option<&Arc<dyn FeePolicy>> {
        self.fee_policy.as_ref()
    }

    /// Raw quote amount a base fill converts to, before fees.
    pub fn quote_amount(&self, base: &Money) -> Result<Money> {
        self.rate.convert(base, None)
    }

    /// Fees for a prospective fill; empty when no policy is attached. The
    /// result is checked against the pair before anyone consumes it.
    pub fn fill_fees(&self, base: &Money, raw_quote: &Money) -> Result<FeeBreakdown> {
        let breakdown = match &self.fee_policy {
            Some(policy) => policy.calculate(self.side, base, raw_quote)?,
            None => FeeBreakdown::empty(),
        };
        breakdown.ensure_within_pair(&self.pair)?;
        Ok(breakdown)
    }

    /// Direction a taker moves through this order: `(from, to)`.
    pub fn edge_endpoints(&self) -> (&Currency, &Currency) {
        match self.side {
            OrderSide::Buy => (self.pair.base(), self.pair.quote()),
            OrderSide::Sell => (self.pair.quote(), self.pair.base()),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} @ {}", self.side, self.pair, self.bounds, self.rate.value())
    }
}

/// Owning, iterable collection of orders; the input to graph building.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<Arc<Order>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: orders.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn push(&mut self, order: Order) {
        self.orders.push(Arc::new(order));
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Order>> {
        self.orders.iter()
    }

    /// A new book containing only the orders every filter accepts.
    /// Relative order is preserved.
    pub fn filtered(&self, filters: &[Box<dyn OrderFilter>]) -> OrderBook {
        OrderBook {
            orders: self
                .orders
                .iter()
                .filter(|order| filters.iter().all(|f| f.accepts(order)))
                .cloned()
                .collect(),
        }
    }
}
