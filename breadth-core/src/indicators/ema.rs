//! Exponential Moving Average (EMA).
//!
//! alpha = 2 / (span + 1), computed as a single forward scan.
//!
//! Two seedings are supported:
//! - `Adjusted`: EMA[t] = sum_i (1-alpha)^i * close[t-i] / sum_i (1-alpha)^i.
//!   Valid from the first close (EMA[0] = close[0]); early values behave like
//!   an expanding mean. Lookback: 0.
//! - `SmaSeeded`: EMA[span-1] = SMA of the first `span` closes, then
//!   EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1]. Lookback: span - 1.
//!
//! Both converge once `(1 - alpha)^t` is negligible.

use super::Indicator;
use serde::{Deserialize, Serialize};

/// How the recursion is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaWeighting {
    #[default]
    Adjusted,
    SmaSeeded,
}

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    weighting: EmaWeighting,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self::with_weighting(span, EmaWeighting::Adjusted)
    }

    pub fn with_weighting(span: usize, weighting: EmaWeighting) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            weighting,
            name: format!("ema_{span}"),
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    fn adjusted(&self, closes: &[f64]) -> Vec<f64> {
        let decay = 1.0 - self.alpha();
        let mut result = Vec::with_capacity(closes.len());
        let (mut num, mut den) = (0.0, 0.0);

        for &close in closes {
            // NaN taints everything after it.
            num = close + decay * num;
            den = 1.0 + decay * den;
            result.push(num / den);
        }

        result
    }

    fn sma_seeded(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];
        if n < self.span {
            return result;
        }

        let alpha = self.alpha();
        let seed = closes[..self.span].iter().sum::<f64>() / self.span as f64;
        result[self.span - 1] = seed;

        let mut prev = seed;
        for i in self.span..n {
            prev = alpha * closes[i] + (1.0 - alpha) * prev;
            result[i] = prev;
        }

        result
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.weighting {
            EmaWeighting::Adjusted => 0,
            EmaWeighting::SmaSeeded => self.span - 1,
        }
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        match self.weighting {
            EmaWeighting::Adjusted => self.adjusted(closes),
            EmaWeighting::SmaSeeded => self.sma_seeded(closes),
        }
    }
}
