//! Bar: one daily session of an instrument's price history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLC bar for a single symbol.
///
/// Providers fill missing fields with `f64::NAN`; such bars are dropped by
/// [`compact_sessions`] before any indicator sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl Bar {
    /// Bar with all four prices set to `close`. Handy for close-only sources.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }
}

/// Drop void sessions, keeping chronological order.
///
/// Everything downstream indexes from the end of the compacted series, so
/// "yesterday" is the previous *valid* session, not the previous calendar row.
pub fn compact_sessions(bars: &[Bar]) -> Vec<Bar> {
    bars.iter().filter(|b| !b.is_void()).cloned().collect()
}

/// Close prices of a series, oldest first.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
