//! Price history provider trait and structured error types.
//!
//! The `PriceHistoryProvider` trait abstracts over where bars come from
//! (Yahoo Finance, a CSV directory, synthetic data, fixed in-memory batches)
//! so the engine can be driven offline and mocked in tests.

use crate::domain::Bar;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One provider batch: symbol → daily bars, oldest first, in universe order.
pub type PriceBatch = IndexMap<String, Vec<Bar>>;

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and log contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("universe unavailable: {0}")]
    Universe(#[from] super::universe::UniverseError),

    #[error("csv import error in {path}: {reason}")]
    CsvImport { path: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Where a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
    Static,
}

/// Trait for batched price history sources.
///
/// Implementations own symbol resolution (usually through a
/// `UniverseProvider`) and batching. Per-symbol failures should leave the
/// symbol out of its batch rather than fail the call; an `Err` means the
/// provider as a whole could not serve the request.
pub trait PriceHistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Where the bars come from.
    fn source(&self) -> DataSource;

    /// Fetch the trailing `lookback_days` trading days for every symbol.
    fn fetch_history(&self, lookback_days: u32) -> Result<Vec<PriceBatch>, DataError>;
}

/// Split an ordered symbol list into provider-sized chunks.
pub fn chunk_symbols(symbols: &[String], batch_size: usize) -> impl Iterator<Item = &[String]> {
    symbols.chunks(batch_size.max(1))
}

/// Keep only the trailing `lookback_days` bars of a series.
pub fn trailing(mut bars: Vec<Bar>, lookback_days: u32) -> Vec<Bar> {
    let keep = lookback_days as usize;
    if bars.len() > keep {
        bars.drain(..bars.len() - keep);
    }
    bars
}
