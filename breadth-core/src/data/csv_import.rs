//! CSV directory provider: offline price history.
//!
//! Layout: `{dir}/{SYMBOL}.csv`, one file per symbol, with a header row
//! containing `date,open,high,low,close` and optionally `volume` (any case,
//! any column order). Empty or unparseable price cells become NaN and are
//! dropped by the engine like any other gap.

use super::provider::{chunk_symbols, trailing, DataError, DataSource, PriceBatch, PriceHistoryProvider};
use super::universe::UniverseProvider;
use crate::domain::Bar;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CsvHistoryProvider {
    dir: PathBuf,
    universe: Option<Arc<dyn UniverseProvider>>,
    batch_size: usize,
}

impl CsvHistoryProvider {
    /// Every `*.csv` file in `dir`, in file-name order.
    pub fn new(dir: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            dir: dir.into(),
            universe: None,
            batch_size,
        }
    }

    /// Only the universe's symbols, in universe order.
    pub fn with_universe(mut self, universe: Arc<dyn UniverseProvider>) -> Self {
        self.universe = Some(universe);
        self
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn discover_symbols(&self) -> Result<Vec<String>, DataError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| DataError::CsvImport {
            path: self.dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut symbols: Vec<String> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

impl PriceHistoryProvider for CsvHistoryProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch_history(&self, lookback_days: u32) -> Result<Vec<PriceBatch>, DataError> {
        let symbols = match &self.universe {
            Some(universe) => universe.symbols()?,
            None => self.discover_symbols()?,
        };

        let mut batches = Vec::new();
        for chunk in chunk_symbols(&symbols, self.batch_size) {
            let mut batch = PriceBatch::with_capacity(chunk.len());
            for symbol in chunk {
                let path = self.symbol_path(symbol);
                if !path.exists() {
                    debug!(%symbol, "no csv file for symbol");
                    continue;
                }
                match read_bars(&path) {
                    Ok(bars) => {
                        batch.insert(symbol.clone(), trailing(bars, lookback_days));
                    }
                    Err(e) => warn!(%symbol, error = %e, "skipping unreadable csv"),
                }
            }
            batches.push(batch);
        }
        Ok(batches)
    }
}

/// Parse one symbol file into bars sorted by date.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
    let csv_err = |reason: String| DataError::CsvImport {
        path: path.display().to_string(),
        reason,
    };

    let mut rdr = csv::Reader::from_path(path).map_err(|e| csv_err(e.to_string()))?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| csv_err(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| csv_err(format!("missing column '{name}'")))
    };

    let (date_col, open_col, high_col, low_col, close_col) = (
        column("date")?,
        column("open")?,
        column("high")?,
        column("low")?,
        column("close")?,
    );
    let volume_col = headers.iter().position(|h| h == "volume");

    let mut bars = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| csv_err(e.to_string()))?;
        let raw_date = record.get(date_col).unwrap_or("").trim();
        // Tolerate timestamps such as "2024-01-02 00:00:00+05:30".
        let date = NaiveDate::parse_from_str(raw_date.get(..10).unwrap_or(raw_date), "%Y-%m-%d")
            .map_err(|e| csv_err(format!("row {}: bad date '{raw_date}': {e}", row + 1)))?;
        let price = |col: usize| {
            record
                .get(col)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };

        bars.push(Bar {
            date,
            open: price(open_col),
            high: price(high_col),
            low: price(low_col),
            close: price(close_col),
            volume: volume_col
                .and_then(|c| record.get(c))
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map_or(0, |v| v.max(0.0) as u64),
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}
