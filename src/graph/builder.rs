//! Graph construction
//!
//! Turns an order book into the conversion graph. For every order the fill
//! is evaluated at both bound endpoints, the fee matrix is applied, and the
//! resulting capacities are split into a mandatory floor segment plus the
//! optional headroom above it.
//!
//! Fee application matrix:
//!
//! | Side | Base fee                  | Quote fee                    |
//! |------|---------------------------|------------------------------|
//! | BUY  | gross base = base + fee   | net quote  = raw - fee       |
//! | SELL | net base   = base - fee   | gross quote = raw + fee      |
//!
//! Author: AI-Generated
//! Created: 2026-07-26

use tracing::debug;

use crate::error::Result;
use crate::graph::{EdgeSegment, Graph, GraphEdge};
use crate::money::{Money, MoneyRange};
use crate::order::{Order, OrderBook, OrderSide};
use std::sync::Arc;

/// Per-fill evaluation of one bound endpoint.
struct FillProfile {
    net_base: Money,
    gross_base: Money,
    quote: Money,
}

pub struct GraphBuilder;

impl GraphBuilder {
    /// Build the graph. Fails fast when a fee policy misbehaves (foreign
    /// currency or a fee exceeding the amount it applies to).
    pub fn build(book: &OrderBook) -> Result<Graph> {
        let mut graph = Graph::default();
        for order in book.iter() {
            let edge = Self::build_edge(order)?;
            graph.add_edge(edge);
        }
        graph.sort_edges();
        debug!(
            "graph built: {} nodes, {} edges from {} orders",
            graph.node_count(),
            graph.edge_count(),
            book.len()
        );
        Ok(graph)
    }

    fn build_edge(order: &Arc<Order>) -> Result<GraphEdge> {
        let (from, to) = order.edge_endpoints();
        let bounds = order.bounds();

        let min_fill = Self::evaluate_fill(order, bounds.min())?;
        let max_fill = Self::evaluate_fill(order, bounds.max())?;

        let base_capacity = MoneyRange::new(min_fill.net_base.clone(), max_fill.net_base.clone())?;
        let quote_capacity = MoneyRange::new(min_fill.quote.clone(), max_fill.quote.clone())?;
        let gross_base_capacity =
            MoneyRange::new(min_fill.gross_base.clone(), max_fill.gross_base.clone())?;

        let segments = Self::build_segments(order, &min_fill, &max_fill)?;

        Ok(GraphEdge::new(
            from.clone(),
            to.clone(),
            order.clone(),
            base_capacity,
            quote_capacity,
            gross_base_capacity,
            segments,
        ))
    }

    /// Evaluate one nominal base fill through the rate and the fee matrix.
    fn evaluate_fill(order: &Order, base: &Money) -> Result<FillProfile> {
        let raw_quote = order.quote_amount(base)?;
        let fees = order.fill_fees(base, &raw_quote)?;

        let base_fee = fees.fee_or_zero(order.pair().base(), base.scale())?;
        let quote_fee = fees.fee_or_zero(order.pair().quote(), raw_quote.scale())?;

        let gross_base = base.add(&base_fee)?;
        let net_base = match order.side() {
            OrderSide::Sell => base.sub(&base_fee)?,
            OrderSide::Buy => base.clone(),
        };
        let quote = match order.side() {
            OrderSide::Buy => raw_quote.sub(&quote_fee)?,
            OrderSide::Sell => raw_quote.add(&quote_fee)?,
        };

        Ok(FillProfile {
            net_base,
            gross_base,
            quote,
        })
    }

    /// Mandatory point segment at the minimum fill (when the minimum is
    /// positive), optional segment for the headroom above it, and a single
    /// zero-capacity optional segment when the order has neither.
    fn build_segments(
        order: &Order,
        min_fill: &FillProfile,
        max_fill: &FillProfile,
    ) -> Result<Vec<EdgeSegment>> {
        let bounds = order.bounds();
        let mut segments = Vec::new();

        if !bounds.min().is_zero() {
            segments.push(EdgeSegment {
                is_mandatory: true,
                base: MoneyRange::point(min_fill.net_base.clone()),
                quote: MoneyRange::point(min_fill.quote.clone()),
                gross_base: MoneyRange::point(min_fill.gross_base.clone()),
            });
        }

        let headroom = bounds.max().sub(bounds.min())?;
        if !headroom.is_zero() {
            segments.push(EdgeSegment {
                is_mandatory: false,
                base: Self::headroom_range(&min_fill.net_base, &max_fill.net_base)?,
                quote: Self::headroom_range(&min_fill.quote, &max_fill.quote)?,
                gross_base: Self::headroom_range(&min_fill.gross_base, &max_fill.gross_base)?,
            });
        }

        if segments.is_empty() {
            segments.push(EdgeSegment {
                is_mandatory: false,
                base: MoneyRange::point(min_fill.net_base.clone()),
                quote: MoneyRange::point(min_fill.quote.clone()),
                gross_base: MoneyRange::point(min_fill.gross_base.clone()),
            });
        }

        Ok(segments)
    }

    fn headroom_range(min: &Money, max: &Money) -> Result<MoneyRange> {
        let zero = Money::zero(min.currency().clone(), min.scale().max(max.scale()))?;
        MoneyRange::new(zero, max.sub(min)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{AssetPair, ExchangeRate, OrderBounds};
    use crate::order::PercentageFeePolicy;

    fn plain_order(
        side: OrderSide,
        base: &str,
        quote: &str,
        min: &str,
        max: &str,
        rate: &str,
    ) -> Order {
        Order::new(
            side,
            AssetPair::parse(base, quote).unwrap(),
            OrderBounds::parse(base, min, max, 2).unwrap(),
            ExchangeRate::parse(base, quote, rate, 3).unwrap(),
            None,
        )
        .unwrap()
    }

    fn fee_order(
        side: OrderSide,
        base_rate: Option<&str>,
        quote_rate: Option<&str>,
    ) -> Order {
        Order::new(
            side,
            AssetPair::parse("USD", "EUR").unwrap(),
            OrderBounds::parse("USD", "100", "200", 2).unwrap(),
            ExchangeRate::parse("USD", "EUR", "0.900", 3).unwrap(),
            Some(Arc::new(
                PercentageFeePolicy::parse(base_rate, quote_rate).unwrap(),
            )),
        )
        .unwrap()
    }

    fn only_edge(graph: &Graph) -> Arc<GraphEdge> {
        let mut edges: Vec<Arc<GraphEdge>> = graph
            .nodes()
            .flat_map(|n| n.edges().iter().cloned())
            .collect();
        assert_eq!(edges.len(), 1);
        edges.remove(0)
    }

    #[test]
    fn test_buy_edge_direction_and_capacities() {
        let book = OrderBook::from_orders(vec![plain_order(
            OrderSide::Buy,
            "USD",
            "USDT",
            "10",
            "1000",
            "1.000",
        )]);
        let graph = GraphBuilder::build(&book).unwrap();
        let edge = only_edge(&graph);
        assert_eq!(edge.from().code(), "USD");
        assert_eq!(edge.to().code(), "USDT");
        assert_eq!(edge.base_capacity().min().canonical_amount(), "10.00");
        assert_eq!(edge.base_capacity().max().canonical_amount(), "1000.00");
        assert_eq!(edge.quote_capacity().max().canonical_amount(), "1000.000");
        // No fees: gross base equals net base.
        assert_eq!(edge.gross_base_capacity().max().canonical_amount(), "1000.00");
    }

    #[test]
    fn test_sell_edge_direction() {
        let book = OrderBook::from_orders(vec![plain_order(
            OrderSide::Sell,
            "USDT",
            "RUB",
            "10",
            "200",
            "100.000",
        )]);
        let graph = GraphBuilder::build(&book).unwrap();
        let edge = only_edge(&graph);
        assert_eq!(edge.from().code(), "RUB");
        assert_eq!(edge.to().code(), "USDT");
        assert_eq!(edge.quote_capacity().min().canonical_amount(), "1000.000");
        assert_eq!(edge.quote_capacity().max().canonical_amount(), "20000.000");
    }

    #[test]
    fn test_buy_fee_matrix() {
        // 1% base fee, 2% quote fee on BUY: gross base grows, quote shrinks.
        let book = OrderBook::from_orders(vec![fee_order(
            OrderSide::Buy,
            Some("0.01"),
            Some("0.02"),
        )]);
        let graph = GraphBuilder::build(&book).unwrap();
        let edge = only_edge(&graph);
        assert_eq!(edge.base_capacity().max().canonical_amount(), "200.00");
        assert_eq!(edge.gross_base_capacity().max().canonical_amount(), "202.00");
        // raw quote 180.000, minus 2% = 176.400
        assert_eq!(edge.quote_capacity().max().canonical_amount(), "176.400");
    }

    #[test]
    fn test_sell_fee_matrix() {
        // 1% base fee, 2% quote fee on SELL: net base shrinks, gross quote grows.
        let book = OrderBook::from_orders(vec![fee_order(
            OrderSide::Sell,
            Some("0.01"),
            Some("0.02"),
        )]);
        let graph = GraphBuilder::build(&book).unwrap();
        let edge = only_edge(&graph);
        assert_eq!(edge.base_capacity().max().canonical_amount(), "198.00");
        assert_eq!(edge.gross_base_capacity().max().canonical_amount(), "202.00");
        assert_eq!(edge.quote_capacity().max().canonical_amount(), "183.600");
    }

    #[test]
    fn test_segments_mandatory_plus_headroom() {
        let book = OrderBook::from_orders(vec![plain_order(
            OrderSide::Buy,
            "USD",
            "USDT",
            "10",
            "1000",
            "1.000",
        )]);
        let graph = GraphBuilder::build(&book).unwrap();
        let edge = only_edge(&graph);
        assert_eq!(edge.segments().len(), 2);

        let mandatory = &edge.segments()[0];
        assert!(mandatory.is_mandatory);
        assert_eq!(mandatory.base.min().canonical_amount(), "10.00");
        assert_eq!(mandatory.base.max().canonical_amount(), "10.00");

        let optional = &edge.segments()[1];
        assert!(!optional.is_mandatory);
        assert_eq!(optional.base.min().canonical_amount(), "0.00");
        assert_eq!(optional.base.max().canonical_amount(), "990.00");
    }

    #[test]
    fn test_zero_minimum_emits_single_optional_segment() {
        let book = OrderBook::from_orders(vec![plain_order(
            OrderSide::Buy,
            "USD",
            "USDT",
            "0",
            "500",
            "1.000",
        )]);
        let graph = GraphBuilder::build(&book).unwrap();
        let edge = only_edge(&graph);
        assert_eq!(edge.segments().len(), 1);
        assert!(!edge.segments()[0].is_mandatory);
        assert_eq!(edge.segments()[0].base.max().canonical_amount(), "500.00");
    }

    #[test]
    fn test_degenerate_order_gets_zero_capacity_segment() {
        let book = OrderBook::from_orders(vec![plain_order(
            OrderSide::Buy,
            "USD",
            "USDT",
            "0",
            "0",
            "1.000",
        )]);
        let graph = GraphBuilder::build(&book).unwrap();
        let edge = only_edge(&graph);
        assert_eq!(edge.segments().len(), 1);
        assert!(!edge.segments()[0].is_mandatory);
        assert!(edge.segments()[0].base.is_zero());
    }

    #[test]
    fn test_permutation_invariant_snapshot() {
        let orders = || {
            vec![
                plain_order(OrderSide::Buy, "USD", "USDT", "10", "1000", "1.000"),
                // Two competing orders out of the same RUB node.
                plain_order(OrderSide::Sell, "USDT", "RUB", "10", "200", "100.000"),
                plain_order(OrderSide::Sell, "USDT", "RUB", "10", "1000", "110.000"),
                plain_order(OrderSide::Buy, "EUR", "USD", "5", "500", "1.100"),
            ]
        };
        let forward = GraphBuilder::build(&OrderBook::from_orders(orders())).unwrap();
        let mut reversed_orders = orders();
        reversed_orders.reverse();
        let reversed = GraphBuilder::build(&OrderBook::from_orders(reversed_orders)).unwrap();

        assert_eq!(forward.snapshot(), reversed.snapshot());
    }
}
