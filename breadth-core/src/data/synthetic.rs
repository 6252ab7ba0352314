//! Synthetic and in-memory price history providers.
//!
//! `SyntheticHistoryProvider` is a developer-only mode: a seeded random walk
//! per universe symbol, so the CLI and benches run without network access.
//! `StaticHistoryProvider` serves fixed batches and can be swapped at runtime,
//! which is how tests observe cache expiry.

use super::provider::{chunk_symbols, DataError, DataSource, PriceBatch, PriceHistoryProvider};
use super::universe::UniverseProvider;
use crate::domain::Bar;
use chrono::{Datelike, NaiveDate, Weekday};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Random-walk bars ending on `end`, weekdays only.
///
/// Daily returns are uniform in ±`daily_vol`, starting from a price in
/// [50, 500). Deterministic for a given seed.
pub fn random_walk_bars(seed: u64, sessions: usize, end: NaiveDate, daily_vol: f64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close: f64 = rng.gen_range(50.0..500.0);

    let mut dates = Vec::with_capacity(sessions);
    let mut date = end;
    while dates.len() < sessions {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date);
        }
        date = date.pred_opt().unwrap_or(date);
    }
    dates.reverse();

    dates
        .into_iter()
        .map(|date| {
            let open = close;
            close = (close * (1.0 + rng.gen_range(-daily_vol..daily_vol))).max(0.01);
            let wiggle = close * daily_vol * 0.5;
            Bar {
                date,
                open,
                high: open.max(close) + rng.gen_range(0.0..=wiggle),
                low: (open.min(close) - rng.gen_range(0.0..=wiggle)).max(0.01),
                close,
                volume: rng.gen_range(10_000..1_000_000),
            }
        })
        .collect()
}

/// Stable per-symbol seed so reruns produce identical series.
fn symbol_seed(base: u64, symbol: &str) -> u64 {
    let digest = blake3::hash(symbol.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    base ^ u64::from_le_bytes(bytes)
}

pub struct SyntheticHistoryProvider {
    universe: Arc<dyn UniverseProvider>,
    batch_size: usize,
    seed: u64,
    end: NaiveDate,
    daily_vol: f64,
}

impl SyntheticHistoryProvider {
    pub fn new(universe: Arc<dyn UniverseProvider>, batch_size: usize, seed: u64) -> Self {
        Self {
            universe,
            batch_size,
            seed,
            end: chrono::Local::now().date_naive(),
            daily_vol: 0.03,
        }
    }

    pub fn ending_on(mut self, end: NaiveDate) -> Self {
        self.end = end;
        self
    }
}

impl PriceHistoryProvider for SyntheticHistoryProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch_history(&self, lookback_days: u32) -> Result<Vec<PriceBatch>, DataError> {
        let symbols = self.universe.symbols()?;
        Ok(chunk_symbols(&symbols, self.batch_size)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|symbol| {
                        let seed = symbol_seed(self.seed, symbol);
                        let bars =
                            random_walk_bars(seed, lookback_days as usize, self.end, self.daily_vol);
                        (symbol.clone(), bars)
                    })
                    .collect()
            })
            .collect())
    }
}

/// Fixed in-memory batches. `replace` swaps the data the next fetch sees.
#[derive(Default)]
pub struct StaticHistoryProvider {
    batches: RwLock<Vec<PriceBatch>>,
    fetches: AtomicUsize,
}

impl StaticHistoryProvider {
    pub fn new(batches: Vec<PriceBatch>) -> Self {
        Self {
            batches: RwLock::new(batches),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn replace(&self, batches: Vec<PriceBatch>) {
        *self.batches.write() = batches;
    }

    /// Number of times `fetch_history` has been called.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PriceHistoryProvider for StaticHistoryProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn source(&self) -> DataSource {
        DataSource::Static
    }

    fn fetch_history(&self, _lookback_days: u32) -> Result<Vec<PriceBatch>, DataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.batches.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::universe::Universe;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn random_walk_is_deterministic_and_weekday_only() {
        let a = random_walk_bars(7, 60, end(), 0.03);
        let b = random_walk_bars(7, 60, end(), 0.03);
        assert_eq!(a, b);
        assert_eq!(a.len(), 60);
        assert_eq!(a.last().unwrap().date, end());
        assert!(a
            .iter()
            .all(|bar| !matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(a.windows(2).all(|w| w[0].date < w[1].date));
        assert!(a.iter().all(|bar| bar.high >= bar.low && bar.close > 0.0));
    }

    #[test]
    fn synthetic_provider_batches_universe() {
        let universe = Arc::new(Universe::new(vec!["A".into(), "B".into(), "C".into()]));
        let provider = SyntheticHistoryProvider::new(universe, 2, 42).ending_on(end());
        let batches = provider.fetch_history(45).unwrap();

        // A, B | C, ^NSEI | ^NSEBANK
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0]["A"].len(), 45);
        assert!(batches[1].contains_key("^NSEI"));
        assert_ne!(batches[0]["A"], batches[0]["B"]);
    }

    #[test]
    fn static_provider_counts_and_replaces() {
        let provider = StaticHistoryProvider::new(vec![PriceBatch::new()]);
        assert_eq!(provider.fetch_history(60).unwrap().len(), 1);
        provider.replace(vec![]);
        assert!(provider.fetch_history(60).unwrap().is_empty());
        assert_eq!(provider.fetch_count(), 2);
    }
}
