//! Per-computation diagnostics. Logged after every fresh computation, never
//! part of the report itself.

use super::pipeline::SkipReason;
use crate::data::PriceBatch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadthDiagnostics {
    /// Batches returned by the provider, empty ones included.
    pub batches: usize,
    pub empty_batches: usize,
    /// Every symbol across all batches, indices included.
    pub instruments_seen: usize,
    /// Readings that passed the filters and were bucketed.
    pub classified: usize,
    /// Readings rejected by the active trend filters.
    pub filtered_out: usize,
    pub indices_found: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// BLAKE3 over every symbol and bar, in provider order.
    pub dataset_hash: String,
}

impl BreadthDiagnostics {
    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Deterministic hash of the consumed price data.
///
/// Batch and symbol order are part of the input, so the same data in a
/// different order hashes differently.
pub fn dataset_hash(batches: &[PriceBatch]) -> String {
    let mut hasher = blake3::Hasher::new();

    for batch in batches {
        for (symbol, bars) in batch {
            hasher.update(symbol.as_bytes());
            for bar in bars {
                hasher.update(bar.date.to_string().as_bytes());
                hasher.update(&bar.open.to_le_bytes());
                hasher.update(&bar.high.to_le_bytes());
                hasher.update(&bar.low.to_le_bytes());
                hasher.update(&bar.close.to_le_bytes());
                hasher.update(&bar.volume.to_le_bytes());
            }
        }
    }

    hasher.finalize().to_hex().to_string()
}
