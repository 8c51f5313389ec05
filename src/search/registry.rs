//! Visited-state registry with dominance
//!
//! Per-node arena of `(cost, hops, signature)` records, keyed by the node's
//! currency. A record dominates another with the same amount signature when
//! its cost and hops are both no worse. Dominated newcomers are dropped;
//! newcomers that dominate existing records replace them.

use bigdecimal::BigDecimal;
use std::collections::HashMap;

use crate::money::Currency;

#[derive(Debug, Clone)]
struct StateRecord {
    cost: BigDecimal,
    hops: usize,
    signature: String,
}

/// Outcome of a registration attempt. Only `Appended` grows the visited
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegisterOutcome {
    Dominated,
    Replaced,
    Appended,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct VisitedRegistry {
    records: HashMap<Currency, Vec<StateRecord>>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state at `node`. Costs are expected normalized to the
    /// canonical scale, so plain numeric comparison is exact.
    pub fn try_register(
        &mut self,
        node: &Currency,
        cost: &BigDecimal,
        hops: usize,
        signature: &str,
    ) -> RegisterOutcome {
        let records = self.records.entry(node.clone()).or_default();

        for record in records.iter() {
            if record.signature == signature && dominates(&record.cost, record.hops, cost, hops) {
                return RegisterOutcome::Dominated;
            }
        }

        let before = records.len();
        records.retain(|record| {
            !(record.signature == signature && dominates(cost, hops, &record.cost, record.hops))
        });
        let replaced = records.len() < before;

        records.push(StateRecord {
            cost: cost.clone(),
            hops,
            signature: signature.to_string(),
        });

        if replaced {
            RegisterOutcome::Replaced
        } else {
            RegisterOutcome::Appended
        }
    }

    /// True when a strictly better same-signature record exists; used to
    /// drop stale entries pulled from the open set.
    pub fn is_stale(
        &self,
        node: &Currency,
        cost: &BigDecimal,
        hops: usize,
        signature: &str,
    ) -> bool {
        let Some(records) = self.records.get(node) else {
            return false;
        };
        records.iter().any(|record| {
            record.signature == signature
                && dominates(&record.cost, record.hops, cost, hops)
                && (record.cost < *cost || record.hops < hops)
        })
    }

    #[cfg(test)]
    pub fn record_count(&self, node: &Currency) -> usize {
        self.records.get(node).map(|r| r.len()).unwrap_or(0)
    }
}

fn dominates(a_cost: &BigDecimal, a_hops: usize, b_cost: &BigDecimal, b_hops: usize) -> bool {
    a_cost <= b_cost && a_hops <= b_hops
}
