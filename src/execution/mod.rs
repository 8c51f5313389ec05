//! Execution results
//!
//! Concrete, fee-exact results of a materialized search: per-leg fills,
//! path totals, and the outcome aggregate carried back to the caller.

pub mod materializer;
pub mod tolerance;

pub use materializer::LegMaterializer;
pub use tolerance::ToleranceEvaluator;

use bigdecimal::BigDecimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::decimal::{self, SCALE};
use crate::error::Result;
use crate::money::{Currency, Money};
use crate::order::Order;
use crate::search::SearchGuardReport;

/// One executed hop: what was spent, what was received, and the fees paid.
#[derive(Debug, Clone, Serialize)]
pub struct PathHop {
    pub from: Currency,
    pub to: Currency,
    pub spent: Money,
    pub received: Money,
    pub fees: BTreeMap<Currency, Money>,
    #[serde(skip)]
    pub order: Arc<Order>,
}

/// An ordered chain of hops with its residual tolerance and totals.
#[derive(Debug, Clone)]
pub struct Path {
    legs: Vec<PathHop>,
    residual_tolerance: BigDecimal,
    total_spent: Money,
    total_received: Money,
    fee_breakdown: BTreeMap<Currency, Money>,
}

impl Path {
    /// Assemble a path from its legs. The totals are the first leg's spend
    /// and the last leg's receipt; the fee breakdown sums per currency at
    /// the max scale of the contributors.
    pub fn new(legs: Vec<PathHop>, residual_tolerance: BigDecimal) -> Result<Option<Self>> {
        let (Some(first), Some(last)) = (legs.first(), legs.last()) else {
            return Ok(None);
        };
        let total_spent = first.spent.clone();
        let total_received = last.received.clone();

        let mut fee_breakdown: BTreeMap<Currency, Money> = BTreeMap::new();
        for leg in &legs {
            for fee in leg.fees.values() {
                match fee_breakdown.remove(fee.currency()) {
                    Some(existing) => {
                        fee_breakdown.insert(fee.currency().clone(), existing.add(fee)?);
                    }
                    None => {
                        fee_breakdown.insert(fee.currency().clone(), fee.clone());
                    }
                }
            }
        }

        Ok(Some(Self {
            legs,
            residual_tolerance: decimal::normalize(&residual_tolerance, SCALE),
            total_spent,
            total_received,
            fee_breakdown,
        }))
    }

    pub fn legs(&self) -> &[PathHop] {
        &self.legs
    }

    pub fn hop_count(&self) -> usize {
        self.legs.len()
    }

    pub fn residual_tolerance(&self) -> &BigDecimal {
        &self.residual_tolerance
    }

    pub fn total_spent(&self) -> &Money {
        &self.total_spent
    }

    pub fn total_received(&self) -> &Money {
        &self.total_received
    }

    pub fn fee_breakdown(&self) -> &BTreeMap<Currency, Money> {
        &self.fee_breakdown
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Path", 5)?;
        state.serialize_field("totalSpent", &self.total_spent)?;
        state.serialize_field("totalReceived", &self.total_received)?;
        state.serialize_field(
            "residualTolerance",
            &decimal::to_canonical_string(&self.residual_tolerance, SCALE),
        )?;
        state.serialize_field("feeBreakdown", &self.fee_breakdown)?;
        state.serialize_field("legs", &self.legs)?;
        state.end()
    }
}

/// Everything a search request produces: the ranked paths and the guard
/// report, whether or not any ceiling was hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub paths: Vec<Path>,
    pub guards: SearchGuardReport,
}

impl SearchOutcome {
    pub fn best_path(&self) -> Option<&Path> {
        self.paths.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{AssetPair, ExchangeRate, OrderBounds};
    use crate::order::OrderSide;
    use crate::search::GuardLimits;

    fn dummy_order() -> Arc<Order> {
        Arc::new(
            Order::new(
                OrderSide::Buy,
                AssetPair::parse("USD", "BTC").unwrap(),
                OrderBounds::parse("USD", "0", "1000", 2).unwrap(),
                ExchangeRate::parse("USD", "BTC", "0.00002000", 8).unwrap(),
                None,
            )
            .unwrap(),
        )
    }

    fn hop(from: &str, to: &str, spent: (&str, u32), received: (&str, u32), fees: Vec<Money>) -> PathHop {
        PathHop {
            from: Currency::new(from).unwrap(),
            to: Currency::new(to).unwrap(),
            spent: Money::parse(from, spent.0, spent.1).unwrap(),
            received: Money::parse(to, received.0, received.1).unwrap(),
            fees: fees
                .into_iter()
                .map(|fee| (fee.currency().clone(), fee))
                .collect(),
            order: dummy_order(),
        }
    }

    #[test]
    fn test_hop_serialization_shape() {
        let hop = hop(
            "USD",
            "BTC",
            ("100.00", 2),
            ("0.00200000", 8),
            vec![Money::parse("USD", "1.00", 2).unwrap()],
        );
        let json = serde_json::to_value(&hop).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "from": "USD",
                "to": "BTC",
                "spent": {"currency": "USD", "amount": "100.00", "scale": 2},
                "received": {"currency": "BTC", "amount": "0.00200000", "scale": 8},
                "fees": {"USD": {"currency": "USD", "amount": "1.00", "scale": 2}}
            })
        );
    }

    #[test]
    fn test_path_totals_and_fee_aggregation() {
        let legs = vec![
            hop(
                "EUR",
                "USD",
                ("100.000", 3),
                ("111.100", 3),
                vec![Money::parse("EUR", "0.50", 2).unwrap()],
            ),
            hop(
                "USD",
                "JPY",
                ("111.100", 3),
                ("16665.000", 3),
                vec![
                    Money::parse("USD", "1.00", 2).unwrap(),
                    Money::parse("EUR", "0.250", 3).unwrap(),
                ],
            ),
        ];
        let path = Path::new(legs, decimal::parse("0").unwrap()).unwrap().unwrap();
        assert_eq!(path.total_spent().canonical_amount(), "100.000");
        assert_eq!(path.total_received().canonical_amount(), "16665.000");
        // EUR fees merge at the max contributor scale.
        let eur = path
            .fee_breakdown()
            .get(&Currency::new("EUR").unwrap())
            .unwrap();
        assert_eq!(eur.canonical_amount(), "0.750");

        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json["residualTolerance"], "0.000000000000000000");
        let fee_keys: Vec<&String> = json["feeBreakdown"].as_object().unwrap().keys().collect();
        assert_eq!(fee_keys, vec!["EUR", "USD"]);
    }

    #[test]
    fn test_empty_legs_is_no_path() {
        assert!(Path::new(vec![], decimal::parse("0").unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_outcome_best_path() {
        let guards = {
            // Build a report through the public engine surface instead of
            // poking at tracker internals.
            let limits = GuardLimits::new(1, 1, None).unwrap();
            SearchGuardReport {
                limits,
                metrics: crate::search::GuardMetrics {
                    expansions: 0,
                    visited_states: 0,
                    elapsed_ms: 0,
                },
                breached: crate::search::GuardBreaches {
                    expansions: false,
                    visited_states: false,
                    time_budget: false,
                    any: false,
                },
            }
        };
        let outcome = SearchOutcome {
            paths: vec![],
            guards,
        };
        assert!(outcome.best_path().is_none());
    }
}
