//! Yahoo Finance price history provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API, one request per symbol, with
//! retries, exponential backoff and a shared circuit breaker. Prices are
//! dividend/split adjusted using the `adjclose` series when Yahoo sends it.
//!
//! [`YahooHistoryProvider`] walks the universe in batches of `batch_size`
//! symbols. Within a batch requests run on the rayon pool; a symbol that
//! fails is logged and left out of its batch.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{
    chunk_symbols, trailing, DataError, DataSource, PriceBatch, PriceHistoryProvider,
};
use super::universe::UniverseProvider;
use crate::domain::Bar;
use rayon::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Calendar days to request so that `trading_days` sessions come back,
/// allowing for weekends and exchange holidays.
pub fn calendar_range_days(trading_days: u32) -> u32 {
    (trading_days.saturating_mul(7) / 5).saturating_add(10)
}

/// Single-symbol chart client.
pub struct YahooClient {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooClient {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }

    /// Chart API URL for a symbol over the trailing `range_days` calendar days.
    fn chart_url(symbol: &str, range_days: u32) -> String {
        let encoded = symbol.replace('^', "%5E");
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{encoded}\
             ?range={range_days}d&interval=1d&includeAdjustedClose=true"
        )
    }

    /// Parse a chart response into adjusted bars, oldest first.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            let (open, high, low, close) = (
                field(&quote.open),
                field(&quote.high),
                field(&quote.low),
                field(&quote.close),
            );

            // Holidays come back as all-null rows.
            if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
                continue;
            }

            let factor = match (adj_closes.as_ref().and_then(|v| field(v)), close) {
                (Some(adj), Some(c)) if c != 0.0 => adj / c,
                _ => 1.0,
            };
            let adjust = |v: Option<f64>| v.map_or(f64::NAN, |p| p * factor);

            bars.push(Bar {
                date,
                open: adjust(open),
                high: adjust(high),
                low: adjust(low),
                close: adjust(close),
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    /// Fetch one symbol with retry and circuit breaker logic.
    pub fn fetch_daily(&self, symbol: &str, range_days: u32) -> Result<Vec<Bar>, DataError> {
        let url = Self::chart_url(symbol, range_days);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let bars = Self::parse_response(symbol, chart)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Batched provider over a universe.
pub struct YahooHistoryProvider {
    client: YahooClient,
    universe: Arc<dyn UniverseProvider>,
    batch_size: usize,
}

impl YahooHistoryProvider {
    pub fn new(
        client: YahooClient,
        universe: Arc<dyn UniverseProvider>,
        batch_size: usize,
    ) -> Self {
        Self {
            client,
            universe,
            batch_size,
        }
    }

    fn fetch_batch(&self, symbols: &[String], lookback_days: u32) -> Result<PriceBatch, DataError> {
        let range_days = calendar_range_days(lookback_days);
        let results: Vec<(&String, Result<Vec<Bar>, DataError>)> = symbols
            .par_iter()
            .map(|symbol| (symbol, self.client.fetch_daily(symbol, range_days)))
            .collect();

        let mut batch = PriceBatch::with_capacity(symbols.len());
        for (symbol, result) in results {
            match result {
                Ok(bars) => {
                    batch.insert(symbol.clone(), trailing(bars, lookback_days));
                }
                Err(DataError::CircuitBreakerTripped) => {
                    return Err(DataError::CircuitBreakerTripped);
                }
                Err(e) => warn!(%symbol, error = %e, "price history unavailable"),
            }
        }
        Ok(batch)
    }
}

impl PriceHistoryProvider for YahooHistoryProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch_history(&self, lookback_days: u32) -> Result<Vec<PriceBatch>, DataError> {
        if !self.client.is_available() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let symbols = self.universe.symbols()?;
        info!(symbols = symbols.len(), batch_size = self.batch_size, "fetching price history");

        let mut batches = Vec::new();
        for (i, chunk) in chunk_symbols(&symbols, self.batch_size).enumerate() {
            let batch = self.fetch_batch(chunk, lookback_days)?;
            debug!(batch = i + 1, requested = chunk.len(), received = batch.len(), "batch complete");
            batches.push(batch);
        }

        info!(batches = batches.len(), "all batches complete");
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_and_adjusts_bars() {
        let resp = chart(
            r#"{"chart":{"result":[{"timestamp":[1704153600,1704240000,1704326400],
            "indicators":{"quote":[{"open":[100.0,null,104.0],"high":[102.0,null,106.0],
            "low":[99.0,null,103.0],"close":[100.0,null,105.0],"volume":[10,null,30]}],
            "adjclose":[{"adjclose":[50.0,null,52.5]}]}}],"error":null}}"#,
        );
        let bars = YahooClient::parse_response("FOO.NS", resp).unwrap();

        // Middle row is an all-null holiday.
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 50.0);
        assert_eq!(bars[0].open, 50.0);
        assert_eq!(bars[1].high, 53.0);
        assert_eq!(bars[1].volume, 30);
    }

    #[test]
    fn partial_nulls_become_nan() {
        let resp = chart(
            r#"{"chart":{"result":[{"timestamp":[1704153600],
            "indicators":{"quote":[{"open":[null],"high":[2.0],"low":[1.0],"close":[1.5],"volume":[null]}]}}],
            "error":null}}"#,
        );
        let bars = YahooClient::parse_response("FOO.NS", resp).unwrap();
        assert!(bars[0].open.is_nan());
        assert!(bars[0].is_void());
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let resp = chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        );
        let err = YahooClient::parse_response("NOPE.NS", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOPE.NS"));
    }

    #[test]
    fn index_symbols_are_url_encoded() {
        let url = YahooClient::chart_url("^NSEI", 94);
        assert!(url.contains("/chart/%5ENSEI?range=94d"));
    }

    #[test]
    fn calendar_range_covers_trading_sessions() {
        assert!(calendar_range_days(60) >= 84);
        assert!(calendar_range_days(40) >= 56);
    }

    #[test]
    fn calendar_range_saturates_on_huge_lookback() {
        assert_eq!(calendar_range_days(u32::MAX), u32::MAX / 5 + 10);
        assert!(calendar_range_days(u32::MAX / 2) > calendar_range_days(60));
    }

    #[test]
    fn tripped_breaker_refuses_fetch() {
        let breaker = Arc::new(CircuitBreaker::default_provider());
        breaker.trip();
        let client = YahooClient::new(breaker).unwrap();
        let provider = YahooHistoryProvider::new(
            client,
            Arc::new(crate::data::universe::Universe::default_nse()),
            100,
        );
        assert!(matches!(
            provider.fetch_history(60),
            Err(DataError::CircuitBreakerTripped)
        ));
    }
}
