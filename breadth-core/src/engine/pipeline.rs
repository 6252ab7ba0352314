//! Per-instrument indicator pipeline.
//!
//! Turns one instrument's raw bars into either a reading the classifier can
//! bucket, a reference-index snapshot, or a skip reason. Each instrument is
//! independent of every other, so the engine may run this on many threads.
//!
//! Order of evaluation:
//! 1. compact gaps, enforce the session floor
//! 2. daily change and percent change from the last two valid closes
//! 3. EMA(5) / EMA(20) position → snapshot
//! 4. designated index → stop here, reported separately
//! 5. monthly change (22 sessions back) and the 10/20/40 DMAs

use crate::config::EngineConfig;
use crate::domain::{closes, compact_sessions, Bar, IndexSlot, InstrumentSnapshot};
use crate::indicators::{Ema, EmaWeighting, Indicator, PercentChange, Sma};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an instrument produced nothing this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer valid sessions than the configured floor.
    InsufficientHistory,
    /// A percentage change had a zero base close.
    ZeroPriorClose,
    /// An indicator came out NaN or infinite.
    NonFiniteIndicator,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InsufficientHistory => "insufficient_history",
            Self::ZeroPriorClose => "zero_prior_close",
            Self::NonFiniteIndicator => "non_finite_indicator",
        })
    }
}

/// Everything the classifier needs about one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentReading {
    pub snapshot: InstrumentSnapshot,
    pub today: f64,
    pub daily_pct: f64,
    pub monthly_pct: f64,
    pub dma10: f64,
    pub dma20: f64,
    pub dma40: f64,
}

/// Result of running one instrument through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentOutcome {
    /// A designated reference index; never classified.
    Index(IndexSlot, InstrumentSnapshot),
    Reading(InstrumentReading),
    Skipped(SkipReason),
}

/// The fixed indicator set, built once per engine.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    min_sessions: usize,
    daily: PercentChange,
    monthly: PercentChange,
    ema_short: Ema,
    ema_long: Ema,
    dma10: Sma,
    dma20: Sma,
    dma40: Sma,
}

impl IndicatorPipeline {
    pub fn new(min_sessions: usize, weighting: EmaWeighting) -> Self {
        Self {
            min_sessions,
            daily: PercentChange::new(1),
            monthly: PercentChange::new(21),
            ema_short: Ema::with_weighting(5, weighting),
            ema_long: Ema::with_weighting(20, weighting),
            dma10: Sma::new(10),
            dma20: Sma::new(20),
            dma40: Sma::new(40),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.min_sessions, config.ema_weighting)
    }

    pub fn min_sessions(&self) -> usize {
        self.min_sessions
    }

    pub fn evaluate(&self, symbol: &str, bars: &[Bar]) -> InstrumentOutcome {
        self.try_evaluate(symbol, bars)
            .unwrap_or_else(InstrumentOutcome::Skipped)
    }

    fn try_evaluate(&self, symbol: &str, bars: &[Bar]) -> Result<InstrumentOutcome, SkipReason> {
        let series = closes(&compact_sessions(bars));
        if series.len() < self.min_sessions {
            return Err(SkipReason::InsufficientHistory);
        }

        let &[.., yesterday, today] = series.as_slice() else {
            return Err(SkipReason::InsufficientHistory);
        };
        let change = today - yesterday;
        let daily_pct = pct_latest(&self.daily, &series)?;

        let ema5 = finite_latest(&self.ema_short, &series)?;
        let ema20 = finite_latest(&self.ema_long, &series)?;

        let snapshot = InstrumentSnapshot::new(
            symbol,
            today,
            change,
            daily_pct,
            today > ema5,
            today > ema20,
        );

        if let Some(slot) = IndexSlot::for_symbol(symbol) {
            return Ok(InstrumentOutcome::Index(slot, snapshot));
        }

        Ok(InstrumentOutcome::Reading(InstrumentReading {
            snapshot,
            today,
            daily_pct,
            monthly_pct: pct_latest(&self.monthly, &series)?,
            dma10: finite_latest(&self.dma10, &series)?,
            dma20: finite_latest(&self.dma20, &series)?,
            dma40: finite_latest(&self.dma40, &series)?,
        }))
    }
}

impl Default for IndicatorPipeline {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

fn finite_latest(indicator: &dyn Indicator, series: &[f64]) -> Result<f64, SkipReason> {
    indicator
        .latest(series)
        .ok_or(SkipReason::NonFiniteIndicator)
}

/// Percent changes distinguish a zero base from other non-finite results.
fn pct_latest(indicator: &PercentChange, series: &[f64]) -> Result<f64, SkipReason> {
    let base = series
        .len()
        .checked_sub(indicator.lookback() + 1)
        .map(|i| series[i])
        .ok_or(SkipReason::InsufficientHistory)?;
    if base == 0.0 {
        return Err(SkipReason::ZeroPriorClose);
    }
    finite_latest(indicator, series)
}
