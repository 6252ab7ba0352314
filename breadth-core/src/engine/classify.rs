//! Bucket membership rules.
//!
//! Rules read the unrounded values; only the reported snapshot is rounded.
//! Advances and declines partition every reading; the other seven buckets
//! are independent of each other.

use super::pipeline::InstrumentReading;
use crate::domain::BucketKind;

/// Daily move (percent) that counts as a strong day.
pub const DAILY_EXTREME_PCT: f64 = 4.0;

/// Monthly move (percent) that counts as a strong month.
pub const MONTHLY_EXTREME_PCT: f64 = 20.0;

/// Whether a reading belongs in `kind`.
pub fn admits(kind: BucketKind, r: &InstrumentReading) -> bool {
    match kind {
        BucketKind::Advances => r.daily_pct > 0.0,
        BucketKind::Declines => r.daily_pct <= 0.0,
        BucketKind::Up4Percent => r.daily_pct >= DAILY_EXTREME_PCT,
        BucketKind::Down4Percent => r.daily_pct <= -DAILY_EXTREME_PCT,
        BucketKind::Up20PercentMonthly => r.monthly_pct >= MONTHLY_EXTREME_PCT,
        BucketKind::Down20PercentMonthly => r.monthly_pct <= -MONTHLY_EXTREME_PCT,
        BucketKind::Above10Dma => r.today > r.dma10,
        BucketKind::Above20Dma => r.today > r.dma20,
        BucketKind::Above40Dma => r.today > r.dma40,
    }
}

/// Every bucket a reading belongs to, in report order.
pub fn buckets_for(r: &InstrumentReading) -> impl Iterator<Item = BucketKind> + '_ {
    BucketKind::ALL.into_iter().filter(move |&kind| admits(kind, r))
}
