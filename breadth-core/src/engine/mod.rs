//! Breadth engine: price batches in, cached breadth report out.
//!
//! One computation runs in three phases:
//!
//! 1. Fetch: the provider returns every batch for the lookback window
//! 2. Evaluate: each instrument goes through the indicator pipeline,
//!    independently (on the rayon pool when `parallel` is set)
//! 3. Aggregate: filters, bucket membership, sort, index snapshots
//!
//! Results are served through a [`ReportCache`] keyed by the active
//! [`FilterSet`], so repeated calls within the TTL return the same `Arc`.

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod diagnostics;
pub mod filter;
pub mod pipeline;

pub use cache::{ReportCache, TtlCache};
pub use diagnostics::BreadthDiagnostics;
pub use filter::{FilterSet, ParseTrendFilterError, TrendFilter};
pub use pipeline::{IndicatorPipeline, InstrumentOutcome, InstrumentReading, SkipReason};

use crate::config::{ConfigError, EngineConfig};
use crate::data::{DataError, PriceBatch, PriceHistoryProvider};
use crate::domain::{Bar, BreadthReport};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("price data unavailable: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct BreadthEngine {
    provider: Arc<dyn PriceHistoryProvider>,
    config: EngineConfig,
    pipeline: IndicatorPipeline,
    cache: ReportCache,
    last_diagnostics: Mutex<Option<BreadthDiagnostics>>,
}

impl BreadthEngine {
    pub fn new(
        provider: Arc<dyn PriceHistoryProvider>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            pipeline: IndicatorPipeline::from_config(&config),
            cache: ReportCache::new(config.ttl()),
            provider,
            config,
            last_diagnostics: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Breadth report for the given trend filters, fresh within the TTL.
    pub fn calculate_breadth(
        &self,
        short_trend: Option<TrendFilter>,
        long_trend: Option<TrendFilter>,
    ) -> Result<Arc<BreadthReport>, EngineError> {
        self.calculate(FilterSet::new(short_trend, long_trend))
    }

    pub fn calculate(&self, filters: FilterSet) -> Result<Arc<BreadthReport>, EngineError> {
        self.cache.get_or_compute(&filters, || self.compute(filters))
    }

    /// Drop every cached report.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Diagnostics of the most recent fresh computation, if any.
    pub fn last_diagnostics(&self) -> Option<BreadthDiagnostics> {
        self.last_diagnostics.lock().clone()
    }

    fn compute(&self, filters: FilterSet) -> Result<BreadthReport, EngineError> {
        let started = Instant::now();
        let batches = self.provider.fetch_history(self.config.lookback_days)?;
        let (report, diagnostics) =
            build_report(&batches, filters, &self.pipeline, self.config.parallel);

        info!(
            provider = self.provider.name(),
            source = ?self.provider.source(),
            %filters,
            batches = diagnostics.batches,
            instruments = diagnostics.instruments_seen,
            classified = diagnostics.classified,
            skipped = diagnostics.total_skipped(),
            advances = report.advances.count,
            declines = report.declines.count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "breadth computed"
        );

        *self.last_diagnostics.lock() = Some(diagnostics);
        Ok(report)
    }
}

/// Pure computation over already-fetched batches. No caching, no I/O.
pub fn build_report(
    batches: &[PriceBatch],
    filters: FilterSet,
    pipeline: &IndicatorPipeline,
    parallel: bool,
) -> (BreadthReport, BreadthDiagnostics) {
    let mut diagnostics = BreadthDiagnostics {
        batches: batches.len(),
        dataset_hash: diagnostics::dataset_hash(batches),
        ..BreadthDiagnostics::default()
    };

    let instruments: Vec<_> = batches
        .iter()
        .filter(|batch| {
            if batch.is_empty() {
                diagnostics.empty_batches += 1;
            }
            !batch.is_empty()
        })
        .flat_map(|batch| batch.iter())
        .collect();
    diagnostics.instruments_seen = instruments.len();

    let evaluate = |(symbol, bars): &(&String, &Vec<Bar>)| {
        let outcome = pipeline.evaluate(symbol, bars);
        if let InstrumentOutcome::Skipped(reason) = &outcome {
            debug!(%symbol, %reason, "instrument skipped");
        }
        outcome
    };

    // collect() keeps input order in both branches.
    let outcomes: Vec<InstrumentOutcome> = if parallel {
        instruments.par_iter().map(evaluate).collect()
    } else {
        instruments.iter().map(evaluate).collect()
    };

    let report = aggregate::assemble(outcomes, filters, &mut diagnostics);
    (report, diagnostics)
}
