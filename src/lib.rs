//! P2P Currency Conversion Path Finder
//!
//! Deterministic k-best path search over a book of heterogeneous exchange
//! orders: order book -> graph -> best-first search -> materialized legs ->
//! outcome. Every numeric decision goes through the fixed-scale HALF_UP
//! decimal kernel, so identical inputs produce bit-identical serialized
//! results across runs and platforms.
//!
//! The crate is a synchronous library. One search invocation owns all of
//! its mutable state; independent invocations may run in parallel over a
//! shared immutable graph.

pub mod decimal;
pub mod error;
pub mod execution;
pub mod filters;
pub mod graph;
pub mod money;
pub mod order;
pub mod search;
pub mod service;

// Re-export commonly used types
pub use error::{InvalidInputKind, PathSearchError, Result};
pub use execution::{LegMaterializer, Path, PathHop, SearchOutcome, ToleranceEvaluator};
pub use filters::{AssetListFilter, MinCapacityFilter, OrderFilter};
pub use graph::{Graph, GraphBuilder};
pub use money::{
    AssetPair, Currency, ExchangeRate, Money, MoneyRange, OrderBounds, ToleranceWindow,
};
pub use order::{
    FeeBreakdown, FeePolicy, FlatFeePolicy, Order, OrderBook, OrderSide, PercentageFeePolicy,
};
pub use search::{
    CandidatePath, DefaultPathOrder, GuardLimits, PathOrderKey, PathOrderStrategy,
    PathSearchEngine, SearchConfig, SearchGuardReport,
};
pub use service::{ExecutionPlanService, PathSearchService};
