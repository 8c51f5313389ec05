//! Candidate ordering algebra
//!
//! Total order over candidate paths: cost ascending, then hops, then the
//! route signature, then discovery order. Ties on the first three are
//! broken by the insertion counter, so extraction order is reproducible
//! down to the last bit.

use bigdecimal::BigDecimal;
use std::cmp::Ordering;
use std::fmt;

use crate::decimal::{self, SCALE};
use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::money::Currency;

/// Accumulated path price at the canonical scale. Lower is better.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCost(BigDecimal);

impl PathCost {
    pub fn new(value: BigDecimal) -> Self {
        Self(decimal::normalize(&value, SCALE))
    }

    pub fn value(&self) -> &BigDecimal {
        &self.0
    }
}

impl PartialOrd for PathCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathCost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for PathCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node chain joined with `->`, e.g. `EUR->USD->JPY`. Compares
/// byte-lexicographically on the joined form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteSignature {
    joined: String,
}

impl RouteSignature {
    pub fn new(nodes: &[Currency]) -> Result<Self> {
        if nodes.is_empty() {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::BlankRouteSegment,
                "route signature needs at least one node",
            ));
        }
        let joined = nodes
            .iter()
            .map(|c| c.code())
            .collect::<Vec<_>>()
            .join("->");
        Ok(Self { joined })
    }

    /// Parse a joined form back into a signature, rejecting blank segments.
    pub fn parse(text: &str) -> Result<Self> {
        let segments: Vec<&str> = text.split("->").collect();
        if segments.is_empty() || segments.iter().any(|s| s.trim().is_empty()) {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::BlankRouteSegment,
                format!("blank segment in route {text:?}"),
            ));
        }
        Ok(Self {
            joined: text.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.joined
    }
}

impl fmt::Display for RouteSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

/// The full ordering key of one queue or result entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOrderKey {
    cost: PathCost,
    hops: usize,
    route: RouteSignature,
    insertion_order: u64,
}

impl PathOrderKey {
    pub fn new(cost: PathCost, hops: usize, route: RouteSignature, insertion_order: u64) -> Self {
        Self {
            cost,
            hops,
            route,
            insertion_order,
        }
    }

    pub fn cost(&self) -> &PathCost {
        &self.cost
    }

    pub fn hops(&self) -> usize {
        self.hops
    }

    pub fn route(&self) -> &RouteSignature {
        &self.route
    }

    pub fn insertion_order(&self) -> u64 {
        self.insertion_order
    }
}

impl PartialOrd for PathOrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathOrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.hops.cmp(&other.hops))
            .then_with(|| self.route.cmp(&other.route))
            .then_with(|| self.insertion_order.cmp(&other.insertion_order))
    }
}

/// Capability interface: a pluggable total order over candidate keys.
pub trait PathOrderStrategy: Send + Sync {
    fn compare(&self, lhs: &PathOrderKey, rhs: &PathOrderKey) -> Ordering;
}

/// The default strategy: `(cost, hops, route, insertion order)` ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathOrder;

impl PathOrderStrategy for DefaultPathOrder {
    fn compare(&self, lhs: &PathOrderKey, rhs: &PathOrderKey) -> Ordering {
        lhs.cmp(rhs)
    }
}
