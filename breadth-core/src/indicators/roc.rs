//! Percentage change over N sessions (rate of change).
//!
//! PCT[t] = (close[t] - close[t-periods]) / close[t-periods] * 100
//! Lookback: periods. A zero base close yields NaN rather than infinity.
//!
//! `PercentChange::new(1)` is the daily change; `PercentChange::new(21)`
//! compares against the close 22 sessions back counting today, roughly one
//! trading month.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct PercentChange {
    periods: usize,
    name: String,
}

impl PercentChange {
    pub fn new(periods: usize) -> Self {
        assert!(periods >= 1, "percent change periods must be >= 1");
        Self {
            periods,
            name: format!("pct_change_{periods}"),
        }
    }
}

impl Indicator for PercentChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.periods
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; closes.len()];

        for (i, pair) in closes.windows(self.periods + 1).enumerate() {
            let (base, curr) = (pair[0], pair[self.periods]);
            if base != 0.0 {
                result[i + self.periods] = (curr - base) / base * 100.0;
            }
        }

        result
    }
}
