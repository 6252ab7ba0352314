//! Aggregation: outcomes in, sorted report out.
//!
//! Index snapshots are captured before filters apply. Buckets are filled in
//! input order and then stably sorted by the rounded `pct_change`, so ties
//! keep provider order.

use super::classify;
use super::diagnostics::BreadthDiagnostics;
use super::filter::FilterSet;
use super::pipeline::InstrumentOutcome;
use crate::domain::{
    Bucket, BucketKind, BreadthReport, IndexSnapshot, IndexSnapshots, InstrumentSnapshot,
    Orientation,
};
use std::collections::BTreeMap;

/// Build a report from per-instrument outcomes.
pub fn assemble<I>(
    outcomes: I,
    filters: FilterSet,
    diagnostics: &mut BreadthDiagnostics,
) -> BreadthReport
where
    I: IntoIterator<Item = InstrumentOutcome>,
{
    let mut members: BTreeMap<BucketKind, Vec<InstrumentSnapshot>> = BTreeMap::new();
    let mut indices = IndexSnapshots::default();

    for outcome in outcomes {
        match outcome {
            InstrumentOutcome::Index(slot, snapshot) => {
                indices.set(slot, IndexSnapshot::from(&snapshot));
                diagnostics.indices_found += 1;
            }
            InstrumentOutcome::Skipped(reason) => diagnostics.record_skip(reason),
            InstrumentOutcome::Reading(reading) => {
                if !filters.admits(&reading.snapshot) {
                    diagnostics.filtered_out += 1;
                    continue;
                }
                diagnostics.classified += 1;
                for kind in classify::buckets_for(&reading) {
                    members
                        .entry(kind)
                        .or_default()
                        .push(reading.snapshot.clone());
                }
            }
        }
    }

    let mut report = BreadthReport {
        indices,
        ..BreadthReport::default()
    };
    for (kind, mut stocks) in members {
        sort_for(kind.orientation(), &mut stocks);
        *report.bucket_mut(kind) = Bucket::from_sorted(stocks);
    }
    report
}

/// Stable sort: gainers first for positive buckets, steepest decline first
/// for negative ones.
pub fn sort_for(orientation: Orientation, stocks: &mut [InstrumentSnapshot]) {
    match orientation {
        Orientation::Positive => stocks.sort_by(|a, b| b.pct_change.total_cmp(&a.pct_change)),
        Orientation::Negative => stocks.sort_by(|a, b| a.pct_change.total_cmp(&b.pct_change)),
    }
}
