//! Path search engine
//!
//! Best-first search over the conversion graph. States are popped from a
//! priority queue ordered by the candidate key, expanded edge by edge, and
//! registered in a per-node dominance registry. Guard counters are checked
//! on every loop iteration; the engine never runs unbounded.
//!
//! Cost model: traversing an edge multiplies the accumulated cost by the
//! inverse of the edge's effective rate and divides it by the tolerance
//! amplifier, normalized to the canonical scale. Lower cost means more
//! target asset per unit spent; the amplifier discounts deeper routes by
//! the slack the tolerance window grants them.
//!
//! Author: AI-Generated
//! Created: 2026-07-27

use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::decimal::{self, RATIO_EXTRA_SCALE, SCALE};
use crate::error::{PathSearchError, Result};
use crate::graph::Graph;
use crate::money::Currency;
use crate::search::config::SearchConfig;
use crate::search::guards::{GuardTracker, SearchGuardReport};
use crate::search::ordering::{DefaultPathOrder, PathCost, PathOrderKey, PathOrderStrategy};
use crate::search::queue::{OpenEntry, OpenSet, ResultHeap};
use crate::search::registry::{RegisterOutcome, VisitedRegistry};
use crate::search::spend::OrderSpendAnalyzer;
use crate::search::state::{CandidatePath, PathEdge, SearchState};

/// The mutable machinery of one invocation: open set, registry, result
/// heap, counters and guards. Deep-cloneable so a search can be branched
/// speculatively; the clone shares nothing mutable with the original.
#[derive(Clone)]
pub struct SearchBootstrap {
    pub(crate) open: OpenSet,
    pub(crate) registry: VisitedRegistry,
    pub(crate) results: ResultHeap,
    pub(crate) insertion_order: u64,
    pub(crate) result_insertion_order: u64,
    pub(crate) tracker: GuardTracker,
}

impl SearchBootstrap {
    fn new(config: &SearchConfig, strategy: Arc<dyn PathOrderStrategy>) -> Self {
        Self {
            open: OpenSet::new(strategy.clone()),
            registry: VisitedRegistry::new(),
            results: ResultHeap::new(config.top_k(), strategy),
            insertion_order: 0,
            result_insertion_order: 0,
            tracker: GuardTracker::new(*config.guards()),
        }
    }

    fn next_insertion(&mut self) -> u64 {
        let order = self.insertion_order;
        self.insertion_order += 1;
        order
    }

    fn next_result_insertion(&mut self) -> u64 {
        let order = self.result_insertion_order;
        self.result_insertion_order += 1;
        order
    }

    pub fn queued_states(&self) -> usize {
        self.open.len()
    }

    pub fn collected_candidates(&self) -> usize {
        self.results.len()
    }
}

/// Deterministic k-best search over an immutable graph. One engine value
/// serves one `(graph, config)` pair; `run` owns all mutable state per
/// invocation, so concurrent runs over the same graph are independent.
pub struct PathSearchEngine<'a> {
    graph: &'a Graph,
    config: &'a SearchConfig,
    strategy: Arc<dyn PathOrderStrategy>,
}

impl<'a> PathSearchEngine<'a> {
    pub fn new(graph: &'a Graph, config: &'a SearchConfig) -> Self {
        Self::with_strategy(graph, config, Arc::new(DefaultPathOrder))
    }

    pub fn with_strategy(
        graph: &'a Graph,
        config: &'a SearchConfig,
        strategy: Arc<dyn PathOrderStrategy>,
    ) -> Self {
        Self {
            graph,
            config,
            strategy,
        }
    }

    /// Run the search from `source` to `target`. Returns up to `top_k`
    /// candidates, best first, plus the guard report. Fails only on true
    /// invariant violations, or on a guard breach when the config says so.
    pub fn run(
        &self,
        source: &Currency,
        target: &Currency,
    ) -> Result<(Vec<CandidatePath>, SearchGuardReport)> {
        let mut boot = self.bootstrap(source)?;
        let amplifier = self.config.tolerance().amplifier()?;

        loop {
            if boot.tracker.breaches().any {
                debug!(
                    "search stopped by guard: {:?}",
                    boot.tracker.breaches()
                );
                break;
            }
            let Some(entry) = boot.open.pop() else {
                break;
            };
            let state = entry.state;

            // A better same-signature record may have landed since this
            // state was queued.
            if boot
                .registry
                .is_stale(&state.node, &state.cost, state.hops, &state.signature)
            {
                trace!("dropping dominated state at {}", state.node);
                continue;
            }

            // Admissible prune: with a full result heap, a state already
            // costlier than the worst kept candidate cannot improve it.
            if boot.results.is_full() {
                if let Some(worst) = boot.results.worst_key() {
                    if state.cost > *worst.cost().value() {
                        continue;
                    }
                }
            }

            boot.tracker.record_expansion();
            self.expand(&mut boot, &state, target, &amplifier)?;
        }

        let report = boot.tracker.report();
        debug!(
            "search finished: {} candidates, {} expansions, {} visited states",
            boot.results.len(),
            report.metrics.expansions,
            report.metrics.visited_states
        );
        if self.config.throw_on_guard_limit() && report.breached.any {
            return Err(PathSearchError::GuardLimitExceeded(report));
        }
        Ok((boot.results.into_candidates(), report))
    }

    fn bootstrap(&self, source: &Currency) -> Result<SearchBootstrap> {
        let mut boot = SearchBootstrap::new(self.config, self.strategy.clone());

        if !self.graph.contains(source) {
            debug!("source {} not present in graph", source);
            return Ok(boot);
        }

        let window = OrderSpendAnalyzer::spend_window(self.config)?;
        let state = SearchState::bootstrap(
            source.clone(),
            decimal::one(),
            decimal::one(),
            Some(window),
            Some(self.config.spend().clone()),
        );
        if boot
            .registry
            .try_register(&state.node, &state.cost, state.hops, &state.signature)
            == RegisterOutcome::Appended
        {
            boot.tracker.record_visited();
        }
        let key = PathOrderKey::new(
            PathCost::new(state.cost.clone()),
            state.hops,
            state.route()?,
            boot.next_insertion(),
        );
        boot.open.push(OpenEntry { key, state });
        Ok(boot)
    }

    fn expand(
        &self,
        boot: &mut SearchBootstrap,
        state: &SearchState,
        target: &Currency,
        amplifier: &BigDecimal,
    ) -> Result<()> {
        let Some(node) = self.graph.node(&state.node) else {
            return Ok(());
        };
        let next_hops = state.hops + 1;
        if next_hops > self.config.max_hops() {
            return Ok(());
        }

        for edge in node.edges() {
            if state.visited.contains(edge.to()) {
                continue;
            }

            // Source edges get the tolerance-clamped seed; later hops
            // propagate the carried window through the edge's capacity.
            let feasible = if state.hops == 0 {
                match OrderSpendAnalyzer::initial_seed(self.config, edge)? {
                    Some(seed) => seed.into_window(),
                    None => continue,
                }
            } else {
                match edge.supports_amount(state.amount_range.as_ref())? {
                    Some(window) => window,
                    None => continue,
                }
            };
            let Some(next_range) = edge.next_amount_range(&feasible)? else {
                continue;
            };

            let conversion = edge.conversion_rate()?;
            let cost_factor = edge.cost_factor()?;
            let amplified = decimal::div(&state.cost, amplifier, SCALE + RATIO_EXTRA_SCALE)?;
            let new_cost = decimal::mul(&amplified, &cost_factor, SCALE);
            let new_product = decimal::mul(&state.product, &conversion, SCALE);

            let successor = state.successor(
                PathEdge::new(edge.clone(), conversion),
                new_cost,
                new_product,
                Some(next_range),
            );

            match boot.registry.try_register(
                &successor.node,
                &successor.cost,
                successor.hops,
                &successor.signature,
            ) {
                RegisterOutcome::Dominated => continue,
                RegisterOutcome::Appended => boot.tracker.record_visited(),
                RegisterOutcome::Replaced => {}
            }

            let route = successor.route()?;
            if &successor.node == target && successor.hops >= self.config.min_hops() {
                let result_key = PathOrderKey::new(
                    PathCost::new(successor.cost.clone()),
                    successor.hops,
                    route.clone(),
                    boot.next_result_insertion(),
                );
                boot.results.offer(result_key, successor.to_candidate()?);
            }

            let key = PathOrderKey::new(
                PathCost::new(successor.cost.clone()),
                successor.hops,
                route,
                boot.next_insertion(),
            );
            boot.open.push(OpenEntry {
                key,
                state: successor,
            });
        }
        Ok(())
    }
}
