//! Search states and candidate paths
//!
//! A state is one frontier entry of the best-first search: the node it
//! sits on, the accumulated cost and conversion product, the edges walked
//! so far, and the propagated amount window. States are owned by a single
//! invocation and never escape it; candidates do.

use bigdecimal::BigDecimal;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::graph::GraphEdge;
use crate::money::{Currency, ExchangeRate, Money, MoneyRange};
use crate::order::{Order, OrderSide};
use crate::search::ordering::RouteSignature;

/// One traversed edge inside a candidate, with the effective conversion
/// rate at the canonical scale.
#[derive(Debug, Clone)]
pub struct PathEdge {
    edge: Arc<GraphEdge>,
    conversion_rate: BigDecimal,
}

impl PathEdge {
    pub(crate) fn new(edge: Arc<GraphEdge>, conversion_rate: BigDecimal) -> Self {
        Self {
            edge,
            conversion_rate,
        }
    }

    pub fn from(&self) -> &Currency {
        self.edge.from()
    }

    pub fn to(&self) -> &Currency {
        self.edge.to()
    }

    pub fn order(&self) -> &Arc<Order> {
        self.edge.order()
    }

    pub fn rate(&self) -> &ExchangeRate {
        self.edge.rate()
    }

    pub fn order_side(&self) -> OrderSide {
        self.edge.order_side()
    }

    pub fn conversion_rate(&self) -> &BigDecimal {
        &self.conversion_rate
    }

    pub fn graph_edge(&self) -> &Arc<GraphEdge> {
        &self.edge
    }
}

/// An abstract path found by the engine, not yet materialized into fills.
#[derive(Debug, Clone)]
pub struct CandidatePath {
    cost: BigDecimal,
    product: BigDecimal,
    hops: usize,
    edges: Vec<PathEdge>,
    amount_range: Option<MoneyRange>,
    desired_amount: Option<Money>,
    route: RouteSignature,
}

impl CandidatePath {
    pub fn cost(&self) -> &BigDecimal {
        &self.cost
    }

    pub fn product(&self) -> &BigDecimal {
        &self.product
    }

    pub fn hops(&self) -> usize {
        self.hops
    }

    pub fn edges(&self) -> &[PathEdge] {
        &self.edges
    }

    pub fn amount_range(&self) -> Option<&MoneyRange> {
        self.amount_range.as_ref()
    }

    pub fn desired_amount(&self) -> Option<&Money> {
        self.desired_amount.as_ref()
    }

    pub fn route(&self) -> &RouteSignature {
        &self.route
    }
}

/// Frontier entry of one search invocation.
#[derive(Debug, Clone)]
pub(crate) struct SearchState {
    pub node: Currency,
    pub cost: BigDecimal,
    pub product: BigDecimal,
    pub hops: usize,
    pub edges: Vec<PathEdge>,
    pub amount_range: Option<MoneyRange>,
    pub desired_amount: Option<Money>,
    pub visited: BTreeSet<Currency>,
    /// Amount signature, fixed at construction.
    pub signature: String,
}

impl SearchState {
    pub fn bootstrap(
        node: Currency,
        cost: BigDecimal,
        product: BigDecimal,
        amount_range: Option<MoneyRange>,
        desired_amount: Option<Money>,
    ) -> Self {
        let mut visited = BTreeSet::new();
        visited.insert(node.clone());
        let signature = amount_signature(amount_range.as_ref(), desired_amount.as_ref());
        Self {
            node,
            cost,
            product,
            hops: 0,
            edges: Vec::new(),
            amount_range,
            desired_amount,
            visited,
            signature,
        }
    }

    /// Successor after walking `edge`. The edge sequence is carried by
    /// value; no back-pointers into parent states.
    pub fn successor(
        &self,
        edge: PathEdge,
        cost: BigDecimal,
        product: BigDecimal,
        amount_range: Option<MoneyRange>,
    ) -> Self {
        let node = edge.to().clone();
        let mut visited = self.visited.clone();
        visited.insert(node.clone());
        let mut edges = self.edges.clone();
        edges.push(edge);
        let signature = amount_signature(amount_range.as_ref(), self.desired_amount.as_ref());
        Self {
            node,
            cost,
            product,
            hops: self.hops + 1,
            edges,
            amount_range,
            desired_amount: self.desired_amount.clone(),
            visited,
            signature,
        }
    }

    /// The node chain walked so far, starting at the bootstrap node.
    pub fn route(&self) -> Result<RouteSignature> {
        let mut nodes = Vec::with_capacity(self.edges.len() + 1);
        match self.edges.first() {
            Some(first) => {
                nodes.push(first.from().clone());
                for edge in &self.edges {
                    nodes.push(edge.to().clone());
                }
            }
            None => nodes.push(self.node.clone()),
        }
        RouteSignature::new(&nodes)
    }

    pub fn to_candidate(&self) -> Result<CandidatePath> {
        Ok(CandidatePath {
            cost: self.cost.clone(),
            product: self.product.clone(),
            hops: self.hops,
            edges: self.edges.clone(),
            amount_range: self.amount_range.clone(),
            desired_amount: self.desired_amount.clone(),
            route: self.route()?,
        })
    }
}

/// Canonical amount signature for the dominance registry, e.g.
/// `range:USD:1.500:3.000:3|desired:USD:2.250:3` or `range:null|desired:null`.
pub(crate) fn amount_signature(range: Option<&MoneyRange>, desired: Option<&Money>) -> String {
    let range_part = match range {
        Some(range) => format!("range:{}", range.signature_fragment()),
        None => "range:null".to_string(),
    };
    let desired_part = match desired {
        Some(money) => format!(
            "desired:{}:{}:{}",
            money.currency(),
            money.canonical_amount(),
            money.scale()
        ),
        None => "desired:null".to_string(),
    };
    format!("{range_part}|{desired_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal;

    fn usd(amount: &str, scale: u32) -> Money {
        Money::parse("USD", amount, scale).unwrap()
    }

    #[test]
    fn test_amount_signature_formats() {
        assert_eq!(amount_signature(None, None), "range:null|desired:null");

        let range = MoneyRange::new(usd("1.5", 1), usd("3", 3)).unwrap();
        let desired = usd("2.250", 3);
        assert_eq!(
            amount_signature(Some(&range), Some(&desired)),
            "range:USD:1.500:3.000:3|desired:USD:2.250:3"
        );
    }

    #[test]
    fn test_bootstrap_route_is_the_single_node() {
        let state = SearchState::bootstrap(
            Currency::new("EUR").unwrap(),
            decimal::one(),
            decimal::one(),
            None,
            None,
        );
        assert_eq!(state.route().unwrap().as_str(), "EUR");
        assert!(state.visited.contains(&Currency::new("EUR").unwrap()));
        assert_eq!(state.signature, "range:null|desired:null");
    }
}
