//! Breadth report: named buckets plus reference-index snapshots.

use super::snapshot::{IndexSnapshots, InstrumentSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The nine breadth buckets, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    Advances,
    Declines,
    #[serde(rename = "up_4_percent")]
    Up4Percent,
    #[serde(rename = "down_4_percent")]
    Down4Percent,
    #[serde(rename = "up_20_percent_monthly")]
    Up20PercentMonthly,
    #[serde(rename = "down_20_percent_monthly")]
    Down20PercentMonthly,
    #[serde(rename = "above_10_dma")]
    Above10Dma,
    #[serde(rename = "above_20_dma")]
    Above20Dma,
    #[serde(rename = "above_40_dma")]
    Above40Dma,
}

/// Sort direction of a bucket's members by `pct_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Strongest gainer first.
    Positive,
    /// Steepest decline first.
    Negative,
}

impl BucketKind {
    pub const ALL: [BucketKind; 9] = [
        BucketKind::Advances,
        BucketKind::Declines,
        BucketKind::Up4Percent,
        BucketKind::Down4Percent,
        BucketKind::Up20PercentMonthly,
        BucketKind::Down20PercentMonthly,
        BucketKind::Above10Dma,
        BucketKind::Above20Dma,
        BucketKind::Above40Dma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Advances => "advances",
            Self::Declines => "declines",
            Self::Up4Percent => "up_4_percent",
            Self::Down4Percent => "down_4_percent",
            Self::Up20PercentMonthly => "up_20_percent_monthly",
            Self::Down20PercentMonthly => "down_20_percent_monthly",
            Self::Above10Dma => "above_10_dma",
            Self::Above20Dma => "above_20_dma",
            Self::Above40Dma => "above_40_dma",
        }
    }

    pub fn orientation(self) -> Orientation {
        match self {
            Self::Declines | Self::Down4Percent | Self::Down20PercentMonthly => {
                Orientation::Negative
            }
            _ => Orientation::Positive,
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sorted bucket. `count` always equals `stocks.len()`; build through
/// [`Bucket::from_sorted`] to keep it that way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub count: usize,
    pub stocks: Vec<InstrumentSnapshot>,
}

impl Bucket {
    pub fn from_sorted(stocks: Vec<InstrumentSnapshot>) -> Self {
        Self {
            count: stocks.len(),
            stocks,
        }
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.stocks.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.stocks.iter().any(|s| s.symbol == symbol)
    }
}

/// The full breadth report. Serializes to a flat object keyed by bucket
/// name, plus `indices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreadthReport {
    pub advances: Bucket,
    pub declines: Bucket,
    pub up_4_percent: Bucket,
    pub down_4_percent: Bucket,
    pub up_20_percent_monthly: Bucket,
    pub down_20_percent_monthly: Bucket,
    pub above_10_dma: Bucket,
    pub above_20_dma: Bucket,
    pub above_40_dma: Bucket,
    pub indices: IndexSnapshots,
}

impl BreadthReport {
    pub fn bucket(&self, kind: BucketKind) -> &Bucket {
        match kind {
            BucketKind::Advances => &self.advances,
            BucketKind::Declines => &self.declines,
            BucketKind::Up4Percent => &self.up_4_percent,
            BucketKind::Down4Percent => &self.down_4_percent,
            BucketKind::Up20PercentMonthly => &self.up_20_percent_monthly,
            BucketKind::Down20PercentMonthly => &self.down_20_percent_monthly,
            BucketKind::Above10Dma => &self.above_10_dma,
            BucketKind::Above20Dma => &self.above_20_dma,
            BucketKind::Above40Dma => &self.above_40_dma,
        }
    }

    pub fn bucket_mut(&mut self, kind: BucketKind) -> &mut Bucket {
        match kind {
            BucketKind::Advances => &mut self.advances,
            BucketKind::Declines => &mut self.declines,
            BucketKind::Up4Percent => &mut self.up_4_percent,
            BucketKind::Down4Percent => &mut self.down_4_percent,
            BucketKind::Up20PercentMonthly => &mut self.up_20_percent_monthly,
            BucketKind::Down20PercentMonthly => &mut self.down_20_percent_monthly,
            BucketKind::Above10Dma => &mut self.above_10_dma,
            BucketKind::Above20Dma => &mut self.above_20_dma,
            BucketKind::Above40Dma => &mut self.above_40_dma,
        }
    }

    /// Instruments that made it past the filters (each is in exactly one of
    /// advances/declines).
    pub fn classified_count(&self) -> usize {
        self.advances.count + self.declines.count
    }
}
