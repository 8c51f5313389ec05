//! Search guard rails
//!
//! Hard ceilings on expansions, visited states and wall time. The tracker
//! is owned by a single invocation; the report it produces is immutable
//! and travels with the outcome (or inside the error when the caller opted
//! into throwing).

use serde::Serialize;
use std::time::Instant;

use crate::error::{InvalidInputKind, PathSearchError, Result};

/// Configured ceilings. All limits are at least one; the time budget is
/// optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardLimits {
    #[serde(rename = "expansions")]
    max_expansions: u64,
    #[serde(rename = "visited_states")]
    max_visited_states: u64,
    #[serde(rename = "time_budget_ms", skip_serializing_if = "Option::is_none")]
    time_budget_ms: Option<u64>,
}

/// Default ceiling for expansions and visited states.
pub const DEFAULT_GUARD_LIMIT: u64 = 100_000;

impl GuardLimits {
    pub fn new(
        max_expansions: u64,
        max_visited_states: u64,
        time_budget_ms: Option<u64>,
    ) -> Result<Self> {
        if max_expansions < 1 || max_visited_states < 1 {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::GuardLimits,
                "expansion and visited-state limits must be at least 1",
            ));
        }
        if let Some(budget) = time_budget_ms {
            if budget < 1 {
                return Err(PathSearchError::invalid_input(
                    InvalidInputKind::GuardLimits,
                    "time budget must be at least 1 ms",
                ));
            }
        }
        Ok(Self {
            max_expansions,
            max_visited_states,
            time_budget_ms,
        })
    }

    pub fn max_expansions(&self) -> u64 {
        self.max_expansions
    }

    pub fn max_visited_states(&self) -> u64 {
        self.max_visited_states
    }

    pub fn time_budget_ms(&self) -> Option<u64> {
        self.time_budget_ms
    }
}

impl Default for GuardLimits {
    fn default() -> Self {
        Self {
            max_expansions: DEFAULT_GUARD_LIMIT,
            max_visited_states: DEFAULT_GUARD_LIMIT,
            time_budget_ms: None,
        }
    }
}

/// Observed counters at the moment the report was cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardMetrics {
    pub expansions: u64,
    pub visited_states: u64,
    pub elapsed_ms: u64,
}

/// Which ceilings were hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardBreaches {
    pub expansions: bool,
    pub visited_states: bool,
    pub time_budget: bool,
    pub any: bool,
}

/// Immutable aggregate of limits, metrics and breach flags.
#[derive(Debug, Clone, Serialize)]
pub struct SearchGuardReport {
    pub limits: GuardLimits,
    pub metrics: GuardMetrics,
    pub breached: GuardBreaches,
}

/// Invocation-local counter set with a monotonic clock.
#[derive(Debug, Clone)]
pub(crate) struct GuardTracker {
    limits: GuardLimits,
    expansions: u64,
    visited_states: u64,
    started: Instant,
}

impl GuardTracker {
    pub fn new(limits: GuardLimits) -> Self {
        Self {
            limits,
            expansions: 0,
            visited_states: 0,
            started: Instant::now(),
        }
    }

    pub fn record_expansion(&mut self) {
        self.expansions += 1;
    }

    pub fn record_visited(&mut self) {
        self.visited_states += 1;
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn metrics(&self) -> GuardMetrics {
        GuardMetrics {
            expansions: self.expansions,
            visited_states: self.visited_states,
            elapsed_ms: self.elapsed_ms(),
        }
    }

    pub fn breaches(&self) -> GuardBreaches {
        let metrics = self.metrics();
        let expansions = metrics.expansions >= self.limits.max_expansions;
        let visited_states = metrics.visited_states >= self.limits.max_visited_states;
        let time_budget = self
            .limits
            .time_budget_ms
            .map(|budget| metrics.elapsed_ms >= budget)
            .unwrap_or(false);
        GuardBreaches {
            expansions,
            visited_states,
            time_budget,
            any: expansions || visited_states || time_budget,
        }
    }

    pub fn report(&self) -> SearchGuardReport {
        SearchGuardReport {
            limits: self.limits,
            metrics: self.metrics(),
            breached: self.breaches(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_must_be_at_least_one() {
        assert!(GuardLimits::new(1, 1, None).is_ok());
        assert!(GuardLimits::new(1, 1, Some(1)).is_ok());
        for (e, v, t) in [(0, 1, None), (1, 0, None), (1, 1, Some(0))] {
            let err = GuardLimits::new(e, v, t).unwrap_err();
            assert_eq!(err.input_kind(), Some(InvalidInputKind::GuardLimits));
        }
    }

    #[test]
    fn test_breach_flags() {
        let mut tracker = GuardTracker::new(GuardLimits::new(2, 5, None).unwrap());
        assert!(!tracker.breaches().any);

        tracker.record_expansion();
        assert!(!tracker.breaches().any);
        tracker.record_expansion();
        let breaches = tracker.breaches();
        assert!(breaches.expansions);
        assert!(!breaches.visited_states);
        assert!(!breaches.time_budget);
        assert!(breaches.any);
    }

    #[test]
    fn test_report_serialization_shape() {
        let tracker = GuardTracker::new(GuardLimits::new(10, 20, Some(5000)).unwrap());
        let json = serde_json::to_value(tracker.report()).unwrap();
        assert_eq!(json["limits"]["expansions"], 10);
        assert_eq!(json["limits"]["visited_states"], 20);
        assert_eq!(json["limits"]["time_budget_ms"], 5000);
        assert_eq!(json["metrics"]["expansions"], 0);
        assert_eq!(json["breached"]["any"], false);

        // Absent budget leaves the key out entirely.
        let tracker = GuardTracker::new(GuardLimits::new(10, 20, None).unwrap());
        let json = serde_json::to_value(tracker.report()).unwrap();
        assert!(json["limits"].get("time_budget_ms").is_none());
    }
}
