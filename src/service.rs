//! Request orchestration
//!
//! `PathSearchService` runs filter -> build graph -> search and hands back
//! abstract candidates. `ExecutionPlanService` carries them the rest of the
//! way: materialize each candidate into concrete legs, evaluate the
//! residual tolerance, and emit the `SearchOutcome`.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::execution::{LegMaterializer, Path, SearchOutcome, ToleranceEvaluator};
use crate::filters::OrderFilter;
use crate::graph::GraphBuilder;
use crate::money::Currency;
use crate::order::OrderBook;
use crate::search::{
    CandidatePath, DefaultPathOrder, PathOrderStrategy, PathSearchEngine, SearchConfig,
    SearchGuardReport,
};

/// Filter -> graph -> engine. Produces abstract candidates.
pub struct PathSearchService {
    filters: Vec<Box<dyn OrderFilter>>,
    strategy: Arc<dyn PathOrderStrategy>,
}

impl PathSearchService {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            strategy: Arc::new(DefaultPathOrder),
        }
    }

    pub fn with_filter(mut self, filter: Box<dyn OrderFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_order_strategy(mut self, strategy: Arc<dyn PathOrderStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Run the search for `target_asset` (trimmed, uppercased; empty is an
    /// error). The source is the spend currency.
    pub fn search(
        &self,
        book: &OrderBook,
        config: &SearchConfig,
        target_asset: &str,
    ) -> Result<(Vec<CandidatePath>, SearchGuardReport)> {
        let target = normalize_target_asset(target_asset)?;

        let filtered = book.filtered(&self.filters);
        if filtered.len() < book.len() {
            debug!(
                "filters kept {}/{} orders ({})",
                filtered.len(),
                book.len(),
                self.filters
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let graph = GraphBuilder::build(&filtered)?;
        info!(
            "searching {} -> {} over {} nodes / {} edges",
            config.spend().currency(),
            target,
            graph.node_count(),
            graph.edge_count()
        );

        let engine = PathSearchEngine::with_strategy(&graph, config, self.strategy.clone());
        engine.run(config.spend().currency(), &target)
    }
}

impl Default for PathSearchService {
    fn default() -> Self {
        Self::new()
    }
}

/// The full pipeline: search, then materialize and evaluate every
/// candidate. Candidates that fail to materialize or land outside the
/// tolerance window are silently dropped; their betters keep their order.
pub struct ExecutionPlanService {
    search: PathSearchService,
}

impl ExecutionPlanService {
    pub fn new() -> Self {
        Self {
            search: PathSearchService::new(),
        }
    }

    pub fn from_search(search: PathSearchService) -> Self {
        Self { search }
    }

    pub fn with_filter(mut self, filter: Box<dyn OrderFilter>) -> Self {
        self.search = self.search.with_filter(filter);
        self
    }

    pub fn with_order_strategy(mut self, strategy: Arc<dyn PathOrderStrategy>) -> Self {
        self.search = self.search.with_order_strategy(strategy);
        self
    }

    pub fn plan(
        &self,
        book: &OrderBook,
        config: &SearchConfig,
        target_asset: &str,
    ) -> Result<SearchOutcome> {
        let (candidates, guards) = self.search.search(book, config, target_asset)?;

        let mut paths = Vec::new();
        for candidate in &candidates {
            let Some(legs) = LegMaterializer::materialize(candidate, config)? else {
                continue;
            };
            let Some(first) = legs.first() else {
                continue;
            };
            let Some(residual) =
                ToleranceEvaluator::evaluate(&first.spent, config.spend(), config.tolerance())?
            else {
                continue;
            };
            if let Some(path) = Path::new(legs, residual)? {
                paths.push(path);
            }
        }

        info!(
            "materialized {} of {} candidates",
            paths.len(),
            candidates.len()
        );
        Ok(SearchOutcome { paths, guards })
    }
}

impl Default for ExecutionPlanService {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_target_asset(target_asset: &str) -> Result<Currency> {
    let trimmed = target_asset.trim();
    if trimmed.is_empty() {
        return Err(PathSearchError::invalid_input(
            InvalidInputKind::EmptyTargetAsset,
            "target asset is empty",
        ));
    }
    Currency::new(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{AssetPair, ExchangeRate, Money, OrderBounds, ToleranceWindow};
    use crate::order::{Order, OrderSide};
    use crate::search::GuardLimits;

    fn order(
        side: OrderSide,
        base: &str,
        quote: &str,
        min: &str,
        max: &str,
        rate: &str,
        rate_scale: u32,
    ) -> Order {
        Order::new(
            side,
            AssetPair::parse(base, quote).unwrap(),
            OrderBounds::parse(base, min, max, 2).unwrap(),
            ExchangeRate::parse(base, quote, rate, rate_scale).unwrap(),
            None,
        )
        .unwrap()
    }

    fn config(currency: &str, spend: &str, tol: (&str, &str), hops: (usize, usize)) -> SearchConfig {
        SearchConfig::builder(Money::parse(currency, spend, 2).unwrap())
            .with_tolerance(ToleranceWindow::parse(tol.0, tol.1).unwrap())
            .with_hops(hops.0, hops.1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_direct_single_hop_buy() {
        let book = OrderBook::from_orders(vec![order(
            OrderSide::Buy,
            "USD",
            "USDT",
            "10",
            "1000",
            "1.00",
            2,
        )]);
        let config = config("USD", "100.00", ("0", "0.01"), (1, 2));
        let outcome = ExecutionPlanService::new()
            .plan(&book, &config, "USDT")
            .unwrap();

        assert_eq!(outcome.paths.len(), 1);
        let path = outcome.best_path().unwrap();
        assert_eq!(path.hop_count(), 1);
        assert_eq!(path.total_spent().canonical_amount(), "100.00");
        assert_eq!(path.total_received().canonical_amount(), "100.00");
        assert_eq!(
            path.residual_tolerance().to_string(),
            "0.000000000000000000"
        );
        let leg = &path.legs()[0];
        assert_eq!(leg.from.code(), "USD");
        assert_eq!(leg.to.code(), "USDT");
        assert!(!outcome.guards.breached.any);
    }

    #[test]
    fn test_mandatory_floor_rejects_undersized_spend() {
        let book = OrderBook::from_orders(vec![order(
            OrderSide::Buy,
            "USD",
            "EUR",
            "200",
            "500",
            "1.200",
            3,
        )]);
        let config = config("USD", "100.00", ("0", "0"), (1, 2));
        let outcome = ExecutionPlanService::new()
            .plan(&book, &config, "EUR")
            .unwrap();
        assert!(outcome.paths.is_empty());
        assert!(!outcome.guards.breached.any);
    }

    #[test]
    fn test_best_rate_selection_under_capacity() {
        let book = OrderBook::from_orders(vec![
            order(OrderSide::Sell, "USDT", "RUB", "10", "200", "100.000", 3),
            order(OrderSide::Sell, "USDT", "RUB", "10", "1000", "110.000", 3),
        ]);
        let config = config("RUB", "50000.00", ("0", "0.1"), (1, 2));
        let outcome = ExecutionPlanService::new()
            .plan(&book, &config, "USDT")
            .unwrap();

        // The 100 RUB/USDT order caps out at 20000 RUB; only the larger
        // order can host the spend.
        assert_eq!(outcome.paths.len(), 1);
        let path = outcome.best_path().unwrap();
        assert_eq!(path.total_spent().canonical_amount(), "50000.000");
        assert_eq!(path.total_received().canonical_amount(), "454.545");
        assert_eq!(
            path.residual_tolerance().to_string(),
            "0.000000000000000000"
        );
    }

    #[test]
    fn test_multi_hop_eur_usd_jpy() {
        let book = OrderBook::from_orders(vec![
            order(OrderSide::Sell, "USD", "EUR", "10", "200", "0.900", 3),
            order(OrderSide::Buy, "USD", "JPY", "50", "200", "150.000", 3),
            order(OrderSide::Sell, "JPY", "EUR", "10", "20000", "0.007500", 6),
        ]);
        let config = config("EUR", "100.00", ("0", "0.25"), (1, 3));
        let outcome = ExecutionPlanService::new()
            .plan(&book, &config, "JPY")
            .unwrap();

        let best = outcome.best_path().unwrap();
        assert_eq!(best.hop_count(), 2);
        assert_eq!(best.total_spent().canonical_amount(), "100.000");
        assert_eq!(best.total_received().canonical_amount(), "16665.000");
        assert_eq!(
            best.residual_tolerance().to_string(),
            "0.000000000000000000"
        );

        let legs = best.legs();
        assert_eq!((legs[0].from.code(), legs[0].to.code()), ("EUR", "USD"));
        assert_eq!(legs[0].received.canonical_amount(), "111.100");
        assert_eq!((legs[1].from.code(), legs[1].to.code()), ("USD", "JPY"));
        assert_eq!(legs[1].received.canonical_amount(), "16665.000");
    }

    #[test]
    fn test_guard_breach_reports_without_throwing() {
        let book = OrderBook::from_orders(vec![order(
            OrderSide::Buy,
            "USD",
            "USDT",
            "10",
            "1000",
            "1.00",
            2,
        )]);
        let config = SearchConfig::builder(Money::parse("USD", "100.00", 2).unwrap())
            .with_guards(GuardLimits::new(1, 1, None).unwrap())
            .build()
            .unwrap();
        let outcome = ExecutionPlanService::new()
            .plan(&book, &config, "USDT")
            .unwrap();

        assert!(outcome.paths.is_empty());
        assert!(outcome.guards.breached.any);
        assert!(outcome.guards.metrics.visited_states >= 1);
    }

    #[test]
    fn test_empty_target_asset_is_rejected() {
        let book = OrderBook::new();
        let config = config("USD", "100.00", ("0", "0"), (1, 2));
        let service = ExecutionPlanService::new();
        for target in ["", "   "] {
            let err = service.plan(&book, &config, target).unwrap_err();
            assert_eq!(err.input_kind(), Some(InvalidInputKind::EmptyTargetAsset));
        }
        // Lowercase input normalizes instead of failing.
        assert!(service.plan(&book, &config, " usdt ").is_ok());
    }

    #[test]
    fn test_determinism_across_runs() {
        let book = || {
            OrderBook::from_orders(vec![
                order(OrderSide::Sell, "USD", "EUR", "10", "200", "0.900", 3),
                order(OrderSide::Buy, "USD", "JPY", "50", "200", "150.000", 3),
                order(OrderSide::Sell, "JPY", "EUR", "10", "20000", "0.007500", 6),
                order(OrderSide::Buy, "EUR", "GBP", "1", "500", "0.850", 3),
            ])
        };
        let config = config("EUR", "100.00", ("0", "0.25"), (1, 3));
        let service = ExecutionPlanService::new();

        let serialize = |outcome: &SearchOutcome| {
            serde_json::to_string(&outcome.paths).expect("outcome serializes")
        };
        let first = serialize(&service.plan(&book(), &config, "JPY").unwrap());
        for _ in 0..3 {
            let again = serialize(&service.plan(&book(), &config, "JPY").unwrap());
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let book = OrderBook::from_orders(vec![order(
            OrderSide::Buy,
            "USD",
            "USDT",
            "10",
            "1000",
            "1.00",
            2,
        )]);
        let config = config("USD", "100.00", ("0", "0.01"), (1, 2));
        let outcome = ExecutionPlanService::new()
            .plan(&book, &config, "USDT")
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();

        let path = &json["paths"][0];
        assert_eq!(
            path["totalSpent"],
            serde_json::json!({"currency": "USD", "amount": "100.00", "scale": 2})
        );
        assert_eq!(path["residualTolerance"], "0.000000000000000000");
        assert_eq!(path["legs"][0]["from"], "USD");
        assert_eq!(path["legs"][0]["to"], "USDT");
        assert_eq!(path["feeBreakdown"], serde_json::json!({}));

        assert_eq!(json["guards"]["breached"]["any"], false);
        assert!(json["guards"]["metrics"]["expansions"].as_u64().unwrap() >= 1);
        assert!(json["guards"]["limits"]["visited_states"].as_u64().is_some());
    }

    #[test]
    fn test_no_order_repeats_within_a_path() {
        let book = OrderBook::from_orders(vec![
            order(OrderSide::Buy, "USD", "EUR", "1", "1000", "0.900", 3),
            order(OrderSide::Buy, "EUR", "GBP", "1", "1000", "0.850", 3),
            order(OrderSide::Buy, "GBP", "CHF", "1", "1000", "1.100", 3),
        ]);
        let config = config("USD", "100.00", ("0", "0.1"), (1, 4));
        let (candidates, _) = PathSearchService::new()
            .search(&book, &config, "CHF")
            .unwrap();

        assert!(!candidates.is_empty());
        for candidate in &candidates {
            for (i, a) in candidate.edges().iter().enumerate() {
                for b in candidate.edges().iter().skip(i + 1) {
                    assert!(!std::sync::Arc::ptr_eq(a.order(), b.order()));
                }
            }
        }
    }

    #[test]
    fn test_filtered_orders_never_reach_the_graph() {
        use crate::filters::MinCapacityFilter;

        let book = OrderBook::from_orders(vec![
            order(OrderSide::Buy, "USD", "USDT", "10", "50", "1.00", 2),
            order(OrderSide::Buy, "USD", "USDT", "10", "1000", "1.00", 2),
        ]);
        let config = config("USD", "100.00", ("0", "0.01"), (1, 2));
        let outcome = ExecutionPlanService::new()
            .with_filter(Box::new(MinCapacityFilter::new(
                Money::parse("USD", "100.00", 2).unwrap(),
            )))
            .plan(&book, &config, "USDT")
            .unwrap();

        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(
            outcome.best_path().unwrap().total_spent().canonical_amount(),
            "100.00"
        );
    }
}
