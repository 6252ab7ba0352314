//! Universe providers: the ordered symbol list a breadth run covers.
//!
//! Two sources:
//! - [`Universe`]: a TOML file (`symbols = [...]`) or the built-in default.
//! - [`Nifty500Universe`]: the NSE Nifty 500 constituents, cached to a local
//!   CSV file (`symbol` column) and downloaded only when the cache is absent.
//!
//! Both always include the two reference index symbols.

use crate::domain::{BANKNIFTY_SYMBOL, NIFTY_SYMBOL};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// NSE archive of the Nifty 500 constituents.
pub const NIFTY500_URL: &str = "https://archives.nseindia.com/content/indices/ind_nifty500list.csv";

/// Suffix Yahoo uses for NSE listings.
pub const NSE_SUFFIX: &str = ".NS";

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("parse universe: {0}")]
    Parse(String),

    #[error("download universe: {0}")]
    Download(String),

    #[error("write universe cache {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("universe is empty")]
    Empty,
}

/// Source of the symbol list the price provider fetches.
pub trait UniverseProvider: Send + Sync {
    fn symbols(&self) -> Result<Vec<String>, UniverseError>;
}

/// Append the reference index symbols if missing, preserving order otherwise.
pub fn with_reference_indices(mut symbols: Vec<String>) -> Vec<String> {
    for index in [NIFTY_SYMBOL, BANKNIFTY_SYMBOL] {
        if !symbols.iter().any(|s| s == index) {
            symbols.push(index.to_string());
        }
    }
    symbols
}

/// Drop repeated symbols, keeping first occurrence.
fn dedup_in_order(symbols: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    symbols.into_iter().filter(|s| seen.insert(s.clone())).collect()
}

/// A fixed, ordered universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default)]
    pub name: Option<String>,
    pub symbols: Vec<String>,
}

impl Universe {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            name: None,
            symbols,
        }
    }

    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|e| UniverseError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        toml::from_str(content).map_err(|e| UniverseError::Parse(e.to_string()))
    }

    /// A small NSE large-cap universe for demos and offline runs.
    pub fn default_nse() -> Self {
        let symbols = [
            "RELIANCE", "TCS", "HDFCBANK", "ICICIBANK", "INFY", "HINDUNILVR", "ITC", "SBIN",
            "BHARTIARTL", "KOTAKBANK", "LT", "AXISBANK", "BAJFINANCE", "ASIANPAINT", "MARUTI",
            "SUNPHARMA", "TITAN", "ULTRACEMCO", "WIPRO", "NESTLEIND", "HCLTECH", "TATAMOTORS",
            "POWERGRID", "NTPC", "ONGC",
        ]
        .into_iter()
        .map(|s| format!("{s}{NSE_SUFFIX}"))
        .collect();

        Self {
            name: Some("nse-large-cap".into()),
            symbols: with_reference_indices(symbols),
        }
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, UniverseError> {
        toml::to_string_pretty(self).map_err(|e| UniverseError::Parse(e.to_string()))
    }
}

impl UniverseProvider for Universe {
    fn symbols(&self) -> Result<Vec<String>, UniverseError> {
        if self.symbols.is_empty() {
            return Err(UniverseError::Empty);
        }
        Ok(with_reference_indices(dedup_in_order(self.symbols.clone())))
    }
}

/// Nifty 500 constituents with a local CSV cache.
pub struct Nifty500Universe {
    cache_file: PathBuf,
    source_url: String,
}

impl Nifty500Universe {
    pub fn new(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            source_url: NIFTY500_URL.to_string(),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    fn load_cache(&self) -> Result<Vec<String>, UniverseError> {
        let file = std::fs::File::open(&self.cache_file).map_err(|e| UniverseError::Read {
            path: self.cache_file.display().to_string(),
            reason: e.to_string(),
        })?;
        read_symbol_column(file, "symbol")
    }

    fn download(&self) -> Result<Vec<String>, UniverseError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| UniverseError::Download(e.to_string()))?;

        let body = client
            .get(&self.source_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| UniverseError::Download(e.to_string()))?;

        let listed = read_symbol_column(body.as_bytes(), "Symbol")?;
        Ok(nse_to_yahoo(listed))
    }

    fn write_cache(&self, symbols: &[String]) -> Result<(), UniverseError> {
        let write_err = |reason: String| UniverseError::Write {
            path: self.cache_file.display().to_string(),
            reason,
        };
        let mut writer = csv::Writer::from_path(&self.cache_file).map_err(|e| write_err(e.to_string()))?;
        writer.write_record(["symbol"]).map_err(|e| write_err(e.to_string()))?;
        for symbol in symbols {
            writer.write_record([symbol]).map_err(|e| write_err(e.to_string()))?;
        }
        writer.flush().map_err(|e| write_err(e.to_string()))
    }
}

impl UniverseProvider for Nifty500Universe {
    fn symbols(&self) -> Result<Vec<String>, UniverseError> {
        match self.load_cache() {
            Ok(symbols) if !symbols.is_empty() => return Ok(with_reference_indices(symbols)),
            Ok(_) => warn!(path = %self.cache_file.display(), "universe cache is empty, refreshing"),
            Err(e) => info!(error = %e, "no universe cache, downloading constituents"),
        }

        let symbols = self.download()?;
        if symbols.is_empty() {
            return Err(UniverseError::Empty);
        }
        if let Err(e) = self.write_cache(&symbols) {
            warn!(error = %e, "could not persist universe cache");
        }
        Ok(symbols)
    }
}

/// NSE tickers → sorted, de-duplicated Yahoo symbols plus the two indices.
pub fn nse_to_yahoo(listed: Vec<String>) -> Vec<String> {
    let mut symbols: Vec<String> = listed
        .into_iter()
        .map(|s| format!("{}{NSE_SUFFIX}", s.trim()))
        .collect();
    symbols.push(NIFTY_SYMBOL.to_string());
    symbols.push(BANKNIFTY_SYMBOL.to_string());
    symbols.sort();
    symbols.dedup();
    symbols
}

/// Read one named column of a headed CSV, skipping blank cells.
pub fn read_symbol_column<R: Read>(reader: R, column: &str) -> Result<Vec<String>, UniverseError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| UniverseError::Parse(e.to_string()))?
        .clone();
    let idx = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| UniverseError::Parse(format!("missing column '{column}'")))?;

    let mut symbols = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| UniverseError::Parse(e.to_string()))?;
        if let Some(cell) = record.get(idx).map(str::trim).filter(|c| !c.is_empty()) {
            symbols.push(cell.to_string());
        }
    }
    Ok(symbols)
}
