//! Search configuration
//!
//! Built programmatically with the builder, validated once at `build()`.
//! Defaults are permissive enough for small books; production callers set
//! explicit guard limits.

use crate::error::{InvalidInputKind, PathSearchError, Result};
use crate::money::{Money, ToleranceWindow};
use crate::search::guards::GuardLimits;

const DEFAULT_MAX_HOPS: usize = 4;
const DEFAULT_TOP_K: usize = 5;

/// Validated, immutable configuration of one search request.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    spend: Money,
    tolerance: ToleranceWindow,
    min_hops: usize,
    max_hops: usize,
    top_k: usize,
    guards: GuardLimits,
    throw_on_guard_limit: bool,
}

impl SearchConfig {
    pub fn builder(spend: Money) -> SearchConfigBuilder {
        SearchConfigBuilder::new(spend)
    }

    pub fn spend(&self) -> &Money {
        &self.spend
    }

    pub fn tolerance(&self) -> &ToleranceWindow {
        &self.tolerance
    }

    pub fn min_hops(&self) -> usize {
        self.min_hops
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn guards(&self) -> &GuardLimits {
        &self.guards
    }

    pub fn throw_on_guard_limit(&self) -> bool {
        self.throw_on_guard_limit
    }
}

pub struct SearchConfigBuilder {
    spend: Money,
    tolerance: ToleranceWindow,
    min_hops: usize,
    max_hops: usize,
    top_k: usize,
    guards: GuardLimits,
    throw_on_guard_limit: bool,
}

impl SearchConfigBuilder {
    pub fn new(spend: Money) -> Self {
        Self {
            spend,
            tolerance: ToleranceWindow::zero(),
            min_hops: 1,
            max_hops: DEFAULT_MAX_HOPS,
            top_k: DEFAULT_TOP_K,
            guards: GuardLimits::default(),
            throw_on_guard_limit: false,
        }
    }

    pub fn with_tolerance(mut self, tolerance: ToleranceWindow) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_hops(mut self, min_hops: usize, max_hops: usize) -> Self {
        self.min_hops = min_hops;
        self.max_hops = max_hops;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_guards(mut self, guards: GuardLimits) -> Self {
        self.guards = guards;
        self
    }

    pub fn with_throw_on_guard_limit(mut self, throw: bool) -> Self {
        self.throw_on_guard_limit = throw;
        self
    }

    pub fn build(self) -> Result<SearchConfig> {
        if self.min_hops < 1 || self.min_hops > self.max_hops {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::HopLimits,
                format!(
                    "hop limits must satisfy 1 <= min <= max, got [{}, {}]",
                    self.min_hops, self.max_hops
                ),
            ));
        }
        if self.top_k < 1 {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::ResultLimit,
                "result limit must be at least 1",
            ));
        }
        Ok(SearchConfig {
            spend: self.spend,
            tolerance: self.tolerance,
            min_hops: self.min_hops,
            max_hops: self.max_hops,
            top_k: self.top_k,
            guards: self.guards,
            throw_on_guard_limit: self.throw_on_guard_limit,
        })
    }
}
