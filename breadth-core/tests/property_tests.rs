//! Property tests for report invariants.
//!
//! Uses proptest to verify, over random universes:
//! 1. Bucket count always equals the number of listed stocks
//! 2. Advances and declines partition the classified instruments
//! 3. Every bucket is sorted in its orientation
//! 4. Filters only ever remove instruments
//! 5. Parallel and sequential evaluation produce the same report

use breadth_core::data::PriceBatch;
use breadth_core::domain::{Bar, BucketKind, Orientation};
use breadth_core::engine::{build_report, FilterSet, IndicatorPipeline};
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// One instrument: 30..60 sessions of positive closes, some of them gaps.
fn arb_series() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((1.0..500.0_f64, prop::bool::weighted(0.05)), 30..60).prop_map(
        |points| {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            points
                .into_iter()
                .enumerate()
                .map(|(i, (close, gap))| {
                    let close = if gap { f64::NAN } else { (close * 100.0).round() / 100.0 };
                    Bar::from_close(base + chrono::Duration::days(i as i64), close)
                })
                .collect()
        },
    )
}

fn arb_batches() -> impl Strategy<Value = Vec<PriceBatch>> {
    prop::collection::vec(arb_series(), 0..25).prop_map(|all| {
        all.chunks(7)
            .enumerate()
            .map(|(b, chunk)| {
                chunk
                    .iter()
                    .enumerate()
                    .map(|(i, bars)| (format!("S{b}_{i}"), bars.clone()))
                    .collect()
            })
            .collect()
    })
}

fn arb_filters() -> impl Strategy<Value = FilterSet> {
    prop::sample::select(FilterSet::all().collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn counts_match_stocks(batches in arb_batches(), filters in arb_filters()) {
        let (report, _) = build_report(&batches, filters, &IndicatorPipeline::default(), false);
        for kind in BucketKind::ALL {
            let bucket = report.bucket(kind);
            prop_assert_eq!(bucket.count, bucket.stocks.len());
        }
    }

    #[test]
    fn advances_and_declines_partition(batches in arb_batches(), filters in arb_filters()) {
        let (report, diagnostics) =
            build_report(&batches, filters, &IndicatorPipeline::default(), false);
        prop_assert_eq!(report.advances.count + report.declines.count, diagnostics.classified);
        for stock in &report.advances.stocks {
            prop_assert!(!report.declines.contains(&stock.symbol));
        }
        prop_assert_eq!(
            diagnostics.classified + diagnostics.filtered_out + diagnostics.total_skipped()
                + diagnostics.indices_found,
            diagnostics.instruments_seen
        );
    }

    #[test]
    fn buckets_are_sorted_by_orientation(batches in arb_batches()) {
        let (report, _) =
            build_report(&batches, FilterSet::unfiltered(), &IndicatorPipeline::default(), false);
        for kind in BucketKind::ALL {
            let pcts: Vec<f64> = report.bucket(kind).stocks.iter().map(|s| s.pct_change).collect();
            let ordered = pcts.windows(2).all(|w| match kind.orientation() {
                Orientation::Positive => w[0] >= w[1],
                Orientation::Negative => w[0] <= w[1],
            });
            prop_assert!(ordered, "{} out of order: {:?}", kind, pcts);
        }
    }

    #[test]
    fn filters_only_remove(batches in arb_batches(), filters in arb_filters()) {
        let pipeline = IndicatorPipeline::default();
        let (all, _) = build_report(&batches, FilterSet::unfiltered(), &pipeline, false);
        let (filtered, _) = build_report(&batches, filters, &pipeline, false);
        for kind in BucketKind::ALL {
            for stock in &filtered.bucket(kind).stocks {
                prop_assert!(all.bucket(kind).contains(&stock.symbol));
            }
        }
        prop_assert_eq!(all.indices, filtered.indices);
    }

    #[test]
    fn parallel_matches_sequential(batches in arb_batches()) {
        let pipeline = IndicatorPipeline::default();
        let (seq, _) = build_report(&batches, FilterSet::unfiltered(), &pipeline, false);
        let (par, _) = build_report(&batches, FilterSet::unfiltered(), &pipeline, true);
        prop_assert_eq!(seq, par);
    }
}
