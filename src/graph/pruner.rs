//! Segment pruning
//!
//! Filters an edge's segments down to the ones that matter for a chosen
//! capacity measure and orders them mandatory-first so the feasibility
//! window can be summed in one pass.

use bigdecimal::{BigDecimal, Zero};

use crate::graph::EdgeSegment;
use crate::money::MoneyRange;

/// Which of the three capacity measures gates a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityMeasure {
    Base,
    Quote,
    GrossBase,
}

impl CapacityMeasure {
    /// The segment range carrying this measure.
    pub fn of<'a>(&self, segment: &'a EdgeSegment) -> &'a MoneyRange {
        match self {
            CapacityMeasure::Base => &segment.base,
            CapacityMeasure::Quote => &segment.quote,
            CapacityMeasure::GrossBase => &segment.gross_base,
        }
    }
}

pub struct SegmentPruner;

impl SegmentPruner {
    /// Keep the segments with headroom on `measure`:
    /// - when the mandatory total already equals the capacity maximum there
    ///   is no optional headroom and optionals are discarded entirely;
    /// - otherwise all mandatory segments plus every optional with a
    ///   nonzero maximum survive.
    ///
    /// The result is stably ordered: mandatory before optional, then by
    /// measure maximum descending, then by measure minimum descending.
    pub fn prune(segments: &[EdgeSegment], measure: CapacityMeasure) -> Vec<EdgeSegment> {
        let mut mandatory_total = BigDecimal::zero();
        let mut capacity_max = BigDecimal::zero();
        for segment in segments {
            let range = measure.of(segment);
            if segment.is_mandatory {
                mandatory_total += range.max().amount();
            }
            capacity_max += range.max().amount();
        }
        let headroom = mandatory_total < capacity_max;

        let mut kept: Vec<EdgeSegment> = segments
            .iter()
            .filter(|segment| {
                segment.is_mandatory || (headroom && !measure.of(segment).max().is_zero())
            })
            .cloned()
            .collect();

        kept.sort_by(|a, b| {
            b.is_mandatory
                .cmp(&a.is_mandatory)
                .then_with(|| measure.of(b).max().amount().cmp(measure.of(a).max().amount()))
                .then_with(|| measure.of(b).min().amount().cmp(measure.of(a).min().amount()))
        });
        kept
    }
}
