//! Simple Moving Average (SMA), the "n-day moving average" of the report.
//!
//! Unweighted mean of the trailing `period` closes.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; closes.len()];

        // A NaN anywhere in a window makes that window's mean NaN.
        for (start, window) in closes.windows(self.period).enumerate() {
            result[start + self.period - 1] = window.iter().sum::<f64>() / self.period as f64;
        }

        result
    }
}
