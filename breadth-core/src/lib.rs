//! Breadth Core: market breadth over a daily-bar universe.
//!
//! This crate contains everything except the command line:
//! - Domain types (bars, instrument/index snapshots, buckets, the report)
//! - Close-series indicators (EMA, SMA, percent change)
//! - Price history and universe providers (Yahoo, CSV, synthetic, static)
//! - The breadth engine: per-instrument pipeline, classification,
//!   aggregation and the TTL report cache
//! - TOML engine configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;

pub use config::{ConfigError, EngineConfig};
pub use domain::{BreadthReport, Bucket, BucketKind, IndexSnapshot, InstrumentSnapshot};
pub use engine::{BreadthDiagnostics, BreadthEngine, EngineError, FilterSet, TrendFilter};
