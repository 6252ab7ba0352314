//! Price history and universe providers.

pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_import::CsvHistoryProvider;
pub use provider::{DataError, DataSource, PriceBatch, PriceHistoryProvider};
pub use synthetic::{StaticHistoryProvider, SyntheticHistoryProvider};
pub use universe::{Nifty500Universe, Universe, UniverseError, UniverseProvider};
pub use yahoo::{YahooClient, YahooHistoryProvider};
