//! Path search
//!
//! The deterministic k-best search engine and its supporting machinery:
//! configuration, guard rails, the ordering algebra, the dominance
//! registry, and the per-edge spend analyzer.

pub mod config;
pub mod engine;
pub mod guards;
pub mod ordering;
mod queue;
mod registry;
pub mod spend;
pub mod state;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use engine::{PathSearchEngine, SearchBootstrap};
pub use guards::{GuardBreaches, GuardLimits, GuardMetrics, SearchGuardReport};
pub use ordering::{DefaultPathOrder, PathCost, PathOrderKey, PathOrderStrategy, RouteSignature};
pub use spend::{OrderSpendAnalyzer, SpendSeed, BOUND_SCALE};
pub use state::{CandidatePath, PathEdge};
