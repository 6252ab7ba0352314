//! Domain types: bars, snapshots, buckets and the breadth report.

pub mod bar;
pub mod report;
pub mod snapshot;

pub use bar::{closes, compact_sessions, Bar};
pub use report::{BreadthReport, Bucket, BucketKind, Orientation};
pub use snapshot::{
    round2, IndexSlot, IndexSnapshot, IndexSnapshots, InstrumentSnapshot, BANKNIFTY_SYMBOL,
    NIFTY_SYMBOL,
};
