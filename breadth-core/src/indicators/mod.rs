//! Close-series indicators used by the breadth pipeline.
//!
//! Indicators are pure functions: a gap-compacted close series in, a numeric
//! series of the same length out. The breadth engine only ever reads the last
//! point, through [`Indicator::latest`].

pub mod ema;
pub mod roc;
pub mod sma;

pub use ema::{Ema, EmaWeighting};
pub use roc::PercentChange;
pub use sma::Sma;

/// Trait for close-series indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `closes`; warmup
/// positions hold `f64::NAN`.
///
/// No output value at index t may depend on closes after t. Every indicator
/// must give the same value at t for a truncated series as for the full one.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "ema_5").
    fn name(&self) -> &str;

    /// Number of closes needed before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole series.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;

    /// Value at the most recent point, or `None` if it is not finite.
    fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.compute(closes)
            .last()
            .copied()
            .filter(|v| v.is_finite())
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
