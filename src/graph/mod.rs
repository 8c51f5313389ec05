//! Conversion graph
//!
//! Directed weighted graph derived from an order book. Each edge is one
//! order, traversed in the taker's direction; capacities are tracked on
//! three measures (net base, quote, gross base) and split into mandatory
//! and optional segments.
//!
//! Node iteration is lexicographic by currency, which makes every
//! serialized snapshot permutation-invariant over the input order list.

pub mod builder;
pub mod pruner;

pub use builder::GraphBuilder;
pub use pruner::{CapacityMeasure, SegmentPruner};

use bigdecimal::BigDecimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::decimal::{self, SCALE};
use crate::error::Result;
use crate::money::{Currency, ExchangeRate, Money, MoneyRange};
use crate::order::{Order, OrderSide};

/// One sub-capacity of an edge. A mandatory segment carries the portion
/// required to clear the order's minimum after fees; an optional segment
/// carries the elastic headroom above it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSegment {
    pub is_mandatory: bool,
    pub base: MoneyRange,
    pub quote: MoneyRange,
    pub gross_base: MoneyRange,
}

/// A directed conversion opportunity derived from one order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    from: Currency,
    to: Currency,
    order_side: OrderSide,
    #[serde(skip)]
    order: Arc<Order>,
    rate: ExchangeRate,
    base_capacity: MoneyRange,
    quote_capacity: MoneyRange,
    gross_base_capacity: MoneyRange,
    segments: Vec<EdgeSegment>,
}

impl GraphEdge {
    pub(crate) fn new(
        from: Currency,
        to: Currency,
        order: Arc<Order>,
        base_capacity: MoneyRange,
        quote_capacity: MoneyRange,
        gross_base_capacity: MoneyRange,
        segments: Vec<EdgeSegment>,
    ) -> Self {
        Self {
            from,
            to,
            order_side: order.side(),
            rate: order.rate().clone(),
            order,
            base_capacity,
            quote_capacity,
            gross_base_capacity,
            segments,
        }
    }

    pub fn from(&self) -> &Currency {
        &self.from
    }

    pub fn to(&self) -> &Currency {
        &self.to
    }

    pub fn order_side(&self) -> OrderSide {
        self.order_side
    }

    pub fn order(&self) -> &Arc<Order> {
        &self.order
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    pub fn base_capacity(&self) -> &MoneyRange {
        &self.base_capacity
    }

    pub fn quote_capacity(&self) -> &MoneyRange {
        &self.quote_capacity
    }

    pub fn gross_base_capacity(&self) -> &MoneyRange {
        &self.gross_base_capacity
    }

    pub fn segments(&self) -> &[EdgeSegment] {
        &self.segments
    }

    /// Measure gating feasibility on the taker's input side: what the taker
    /// must source. BUY edges consume base plus base fee; SELL edges consume
    /// quote including quote fee.
    pub fn input_measure(&self) -> CapacityMeasure {
        match self.order_side {
            OrderSide::Buy => CapacityMeasure::GrossBase,
            OrderSide::Sell => CapacityMeasure::Quote,
        }
    }

    /// Capacity window on the taker's input side.
    pub fn input_capacity(&self) -> &MoneyRange {
        match self.order_side {
            OrderSide::Buy => &self.gross_base_capacity,
            OrderSide::Sell => &self.quote_capacity,
        }
    }

    /// Capacity window on the taker's output side: what the taker receives
    /// net of fees.
    pub fn output_capacity(&self) -> &MoneyRange {
        match self.order_side {
            OrderSide::Buy => &self.quote_capacity,
            OrderSide::Sell => &self.base_capacity,
        }
    }

    /// The feasible input window for `amount_range`, or `None` when the edge
    /// cannot carry it. The window floor is the mandatory total on the input
    /// measure; the ceiling is the summed capacity of the pruned segments.
    pub fn supports_amount(&self, amount_range: Option<&MoneyRange>) -> Result<Option<MoneyRange>> {
        let measure = self.input_measure();
        let pruned = SegmentPruner::prune(&self.segments, measure);

        let currency = self.input_capacity().currency().clone();
        let scale = self.input_capacity().scale();
        let mut floor = BigDecimal::from(0);
        let mut ceiling = BigDecimal::from(0);
        for segment in &pruned {
            let range = measure.of(segment);
            if segment.is_mandatory {
                floor += range.min().amount();
            }
            ceiling += range.max().amount();
        }

        let window = MoneyRange::new(
            Money::new(currency.clone(), floor, scale)?,
            Money::new(currency, ceiling, scale)?,
        )?;

        match amount_range {
            Some(range) => window.intersect(range),
            None => Ok(Some(window)),
        }
    }

    /// Propagate a feasible input window through the edge: BUY multiplies by
    /// the rate, SELL divides, and the converted window is clamped to the
    /// output-side capacity. `None` when nothing of the window survives.
    pub fn next_amount_range(&self, feasible: &MoneyRange) -> Result<Option<MoneyRange>> {
        let (lo, hi) = match self.order_side {
            OrderSide::Buy => (
                self.rate.convert(feasible.min(), None)?,
                self.rate.convert(feasible.max(), None)?,
            ),
            OrderSide::Sell => (
                self.rate.convert_from_quote(feasible.min(), None)?,
                self.rate.convert_from_quote(feasible.max(), None)?,
            ),
        };
        // Sort defensively in case the conversion inverted the ordering.
        let (lo, hi) = match lo.compare(&hi)? {
            std::cmp::Ordering::Greater => (hi, lo),
            _ => (lo, hi),
        };
        let converted = MoneyRange::new(lo, hi)?;
        converted.intersect(self.output_capacity())
    }

    /// Effective forward conversion rate at the canonical scale: output per
    /// unit of input along the edge direction.
    pub fn conversion_rate(&self) -> Result<BigDecimal> {
        match self.order_side {
            OrderSide::Buy => Ok(decimal::normalize(self.rate.value(), SCALE)),
            OrderSide::Sell => {
                let one = BigDecimal::from(1);
                decimal::div(&one, self.rate.value(), SCALE)
            }
        }
    }

    /// `1 / conversion_rate` at the canonical scale: the multiplicative
    /// price of traversing this edge.
    pub fn cost_factor(&self) -> Result<BigDecimal> {
        match self.order_side {
            OrderSide::Buy => {
                let one = BigDecimal::from(1);
                decimal::div(&one, self.rate.value(), SCALE)
            }
            OrderSide::Sell => Ok(decimal::normalize(self.rate.value(), SCALE)),
        }
    }

    /// Linear pre-fee estimate of the nominal base behind a gross base
    /// amount, taken from the ratio of the capacity maxima. Exact for
    /// proportional fees, a refinement seed otherwise.
    pub fn net_base_hint(&self, gross: &Money) -> Result<Money> {
        if self.order_side != OrderSide::Buy || self.gross_base_capacity.max().is_zero() {
            return Ok(gross.clone());
        }
        let ratio = self.base_capacity.max().ratio_to(
            self.gross_base_capacity.max(),
            SCALE + decimal::RATIO_EXTRA_SCALE,
        )?;
        gross.mul_decimal(&ratio, gross.scale())
    }
}

/// A currency node and its outgoing edges, kept in insertion order.
#[derive(Debug, Clone)]
pub struct GraphNode {
    currency: Currency,
    edges: Vec<Arc<GraphEdge>>,
}

impl GraphNode {
    fn new(currency: Currency) -> Self {
        Self {
            currency,
            edges: Vec::new(),
        }
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn edges(&self) -> &[Arc<GraphEdge>] {
        &self.edges
    }
}

impl Serialize for GraphNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GraphNode", 2)?;
        state.serialize_field("currency", &self.currency)?;
        let edges: Vec<&GraphEdge> = self.edges.iter().map(|e| e.as_ref()).collect();
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}

/// The whole conversion graph. Immutable once built; safe to share by
/// reference across parallel search invocations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: BTreeMap<Currency, GraphNode>,
}

impl Graph {
    pub fn node(&self, currency: &Currency) -> Option<&GraphNode> {
        self.nodes.get(currency)
    }

    /// Nodes in lexicographic currency order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.edges.len()).sum()
    }

    pub fn contains(&self, currency: &Currency) -> bool {
        self.nodes.contains_key(currency)
    }

    /// Deterministic JSON snapshot for tests and diagnostics.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("graph serialization is infallible")
    }

    pub(crate) fn node_mut_or_insert(&mut self, currency: &Currency) -> &mut GraphNode {
        self.nodes
            .entry(currency.clone())
            .or_insert_with(|| GraphNode::new(currency.clone()))
    }

    pub(crate) fn add_edge(&mut self, edge: GraphEdge) {
        let from = edge.from.clone();
        let to = edge.to.clone();
        self.node_mut_or_insert(&to);
        self.node_mut_or_insert(&from).edges.push(Arc::new(edge));
    }

    /// Order each node's edges by a canonical key so the graph, and every
    /// snapshot of it, is invariant under permutations of the input book.
    pub(crate) fn sort_edges(&mut self) {
        for node in self.nodes.values_mut() {
            node.edges.sort_by(|a, b| edge_canonical_cmp(a, b));
        }
    }
}

/// Canonical within-node edge order: destination, side, rate value, then the
/// three capacity windows. Edges that tie on all of these serialize
/// identically, so the tie order is unobservable.
fn edge_canonical_cmp(a: &GraphEdge, b: &GraphEdge) -> std::cmp::Ordering {
    let side_rank = |side: OrderSide| match side {
        OrderSide::Buy => 0u8,
        OrderSide::Sell => 1u8,
    };
    let range_cmp = |x: &MoneyRange, y: &MoneyRange| {
        x.min()
            .amount()
            .cmp(y.min().amount())
            .then_with(|| x.max().amount().cmp(y.max().amount()))
    };
    a.to
        .cmp(&b.to)
        .then_with(|| side_rank(a.order_side).cmp(&side_rank(b.order_side)))
        .then_with(|| a.rate.value().cmp(b.rate.value()))
        .then_with(|| range_cmp(&a.base_capacity, &b.base_capacity))
        .then_with(|| range_cmp(&a.quote_capacity, &b.quote_capacity))
        .then_with(|| range_cmp(&a.gross_base_capacity, &b.gross_base_capacity))
}
