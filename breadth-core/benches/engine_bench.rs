//! Criterion benchmarks for breadth hot paths.
//!
//! Benchmarks:
//! 1. Full report build over a synthetic universe (sequential vs rayon)
//! 2. Per-instrument pipeline (one symbol, 60 sessions)
//! 3. Indicator scans (EMA adjusted vs SMA-seeded, SMA)
//! 4. Cached lookup through the engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use breadth_core::data::synthetic::random_walk_bars;
use breadth_core::data::{PriceBatch, PriceHistoryProvider, StaticHistoryProvider};
use breadth_core::domain::closes;
use breadth_core::engine::{build_report, BreadthEngine, FilterSet, IndicatorPipeline};
use breadth_core::indicators::{Ema, EmaWeighting, Indicator, Sma};
use breadth_core::EngineConfig;

// ── Helpers ──────────────────────────────────────────────────────────

fn end() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

fn make_batches(symbols: usize, batch_size: usize) -> Vec<PriceBatch> {
    let all: Vec<_> = (0..symbols)
        .map(|i| (format!("SYM{i}.NS"), random_walk_bars(i as u64, 60, end(), 0.03)))
        .collect();
    all.chunks(batch_size)
        .map(|chunk| chunk.iter().cloned().collect())
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_build_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_report");
    let pipeline = IndicatorPipeline::default();

    for &symbols in &[50usize, 500] {
        let batches = make_batches(symbols, 100);
        for parallel in [false, true] {
            let label = if parallel { "rayon" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, symbols), &batches, |b, batches| {
                b.iter(|| {
                    build_report(
                        black_box(batches),
                        FilterSet::unfiltered(),
                        &pipeline,
                        parallel,
                    )
                })
            });
        }
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = IndicatorPipeline::default();
    let bars = random_walk_bars(7, 60, end(), 0.03);
    c.bench_function("pipeline_evaluate_60", |b| {
        b.iter(|| pipeline.evaluate(black_box("SYM.NS"), black_box(&bars)))
    });
}

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let series = closes(&random_walk_bars(11, 1_000, end(), 0.02));

    let indicators: Vec<(&str, Box<dyn Indicator>)> = vec![
        ("ema20_adjusted", Box::new(Ema::new(20))),
        ("ema20_sma_seeded", Box::new(Ema::with_weighting(20, EmaWeighting::SmaSeeded))),
        ("sma40", Box::new(Sma::new(40))),
    ];
    for (name, ind) in &indicators {
        group.bench_function(*name, |b| b.iter(|| ind.compute(black_box(&series))));
    }

    group.finish();
}

fn bench_cached_lookup(c: &mut Criterion) {
    let provider: Arc<dyn PriceHistoryProvider> =
        Arc::new(StaticHistoryProvider::new(make_batches(500, 100)));
    let Ok(engine) = BreadthEngine::new(provider, EngineConfig::default()) else {
        return;
    };
    let _ = engine.calculate(FilterSet::unfiltered());

    c.bench_function("cached_lookup", |b| {
        b.iter(|| engine.calculate(black_box(FilterSet::unfiltered())))
    });
}

criterion_group!(
    benches,
    bench_build_report,
    bench_pipeline,
    bench_indicators,
    bench_cached_lookup
);
criterion_main!(benches);
