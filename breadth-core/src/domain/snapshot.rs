//! Per-instrument and reference-index snapshots.

use serde::{Deserialize, Serialize};

/// Designated NIFTY 50 index symbol.
pub const NIFTY_SYMBOL: &str = "^NSEI";

/// Designated NIFTY BANK index symbol.
pub const BANKNIFTY_SYMBOL: &str = "^NSEBANK";

/// Round to two decimals, the precision every snapshot number is reported at.
///
/// Exact halves go to the even neighbour (banker's rounding).
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let mut rounded = scaled.round();
    if (rounded - scaled).abs() == 0.5 {
        rounded = 2.0 * (scaled / 2.0).round();
    }
    rounded / 100.0
}

/// One instrument's state for the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub pct_change: f64,
    pub above_ema5: bool,
    pub above_ema20: bool,
}

impl InstrumentSnapshot {
    /// Build from raw values; price, change and pct are rounded here.
    pub fn new(
        symbol: impl Into<String>,
        price: f64,
        change: f64,
        pct_change: f64,
        above_ema5: bool,
        above_ema20: bool,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price: round2(price),
            change: round2(change),
            pct_change: round2(pct_change),
            above_ema5,
            above_ema20,
        }
    }
}

/// Snapshot of a reference index. The zero value stands in for an index that
/// was missing from the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub close: f64,
    pub change: f64,
    pub pct_change: f64,
}

impl From<&InstrumentSnapshot> for IndexSnapshot {
    fn from(s: &InstrumentSnapshot) -> Self {
        Self {
            close: s.price,
            change: s.change,
            pct_change: s.pct_change,
        }
    }
}

/// Which reference-index slot a symbol fills, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexSlot {
    Nifty,
    BankNifty,
}

impl IndexSlot {
    pub const ALL: [IndexSlot; 2] = [IndexSlot::Nifty, IndexSlot::BankNifty];

    pub fn for_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            NIFTY_SYMBOL => Some(Self::Nifty),
            BANKNIFTY_SYMBOL => Some(Self::BankNifty),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Nifty => NIFTY_SYMBOL,
            Self::BankNifty => BANKNIFTY_SYMBOL,
        }
    }
}

/// Both reference-index slots. Always present in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshots {
    pub nifty: IndexSnapshot,
    pub banknifty: IndexSnapshot,
}

impl IndexSnapshots {
    pub fn get(&self, slot: IndexSlot) -> &IndexSnapshot {
        match slot {
            IndexSlot::Nifty => &self.nifty,
            IndexSlot::BankNifty => &self.banknifty,
        }
    }

    pub fn set(&mut self, slot: IndexSlot, snapshot: IndexSnapshot) {
        match slot {
            IndexSlot::Nifty => self.nifty = snapshot,
            IndexSlot::BankNifty => self.banknifty = snapshot,
        }
    }
}
