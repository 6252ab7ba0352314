//! Breadth CLI: market breadth reports from the command line.
//!
//! Commands:
//! - `report`: compute one breadth report and print it as JSON
//! - `watch`: recompute through the report cache on an interval
//! - `universe`: print the resolved symbol universe
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info`), so stdout
//! carries only the report.

use anyhow::{bail, Context, Result};
use breadth_core::data::{
    CircuitBreaker, CsvHistoryProvider, Nifty500Universe, PriceHistoryProvider,
    SyntheticHistoryProvider, Universe, UniverseProvider, YahooClient, YahooHistoryProvider,
};
use breadth_core::{BreadthEngine, BreadthReport, EngineConfig, FilterSet, TrendFilter};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Nifty 500 cache used by Yahoo runs when no universe file is given.
const NIFTY500_CACHE_FILE: &str = "nifty500_cache.csv";

#[derive(Parser)]
#[command(name = "breadth", about = "Breadth CLI: NSE market breadth report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a breadth report and print it as JSON.
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Single-line JSON instead of pretty-printed.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Recompute on an interval, printing a one-line summary per tick.
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Seconds between ticks.
        #[arg(long, default_value_t = 60)]
        interval: u64,

        /// Stop after this many ticks. Runs until interrupted if omitted.
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Print the resolved symbol universe, one symbol per line.
    Universe {
        /// Universe file: `.toml` symbol list or `.csv` Nifty 500 cache
        /// (default `nifty500_cache.csv`).
        #[arg(long)]
        universe: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Args)]
struct SourceArgs {
    /// Where price history comes from.
    #[arg(long, value_enum, default_value_t = Source::Yahoo)]
    source: Source,

    /// Directory of `{SYMBOL}.csv` files (with --source csv).
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Universe file: `.toml` symbol list or `.csv` Nifty 500 cache.
    /// Yahoo runs default to `nifty500_cache.csv`, synthetic runs to a
    /// built-in large-cap list.
    #[arg(long)]
    universe: Option<PathBuf>,

    /// Engine config TOML. Defaults apply if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for --source synthetic.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct FilterArgs {
    /// Short-trend filter on the 5-session EMA: above | below.
    #[arg(long)]
    short: Option<TrendFilter>,

    /// Long-trend filter on the 20-session EMA: above | below.
    #[arg(long)]
    long: Option<TrendFilter>,
}

impl FilterArgs {
    fn filter_set(&self) -> FilterSet {
        FilterSet::new(self.short, self.long)
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            source,
            filters,
            compact,
        } => run_report(&source, &filters, compact),
        Commands::Watch {
            source,
            filters,
            interval,
            iterations,
        } => run_watch(&source, &filters, interval, iterations),
        Commands::Universe { universe } => {
            run_universe(universe_path(universe.as_deref(), Source::Yahoo))
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init()
}

/// The universe file a source reads when `--universe` is omitted.
fn universe_path(path: Option<&Path>, source: Source) -> Option<&Path> {
    match (path, source) {
        (None, Source::Yahoo) => Some(Path::new(NIFTY500_CACHE_FILE)),
        (path, _) => path,
    }
}

fn load_universe(path: Option<&Path>) -> Result<Arc<dyn UniverseProvider>> {
    let Some(path) = path else {
        return Ok(Arc::new(Universe::default_nse()));
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let universe = Universe::from_file(path)
                .with_context(|| format!("loading universe {}", path.display()))?;
            Ok(Arc::new(universe))
        }
        Some("csv") => Ok(Arc::new(Nifty500Universe::new(path))),
        _ => bail!(
            "unsupported universe file {} (expected .toml or .csv)",
            path.display()
        ),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn build_engine(args: &SourceArgs) -> Result<BreadthEngine> {
    let config = load_config(args.config.as_deref())?;
    let provider: Arc<dyn PriceHistoryProvider> = match args.source {
        Source::Yahoo => {
            let universe = load_universe(universe_path(args.universe.as_deref(), Source::Yahoo))?;
            let client = YahooClient::new(Arc::new(CircuitBreaker::default_provider()))
                .context("building Yahoo client")?;
            Arc::new(YahooHistoryProvider::new(client, universe, config.batch_size))
        }
        Source::Csv => {
            let provider = CsvHistoryProvider::new(&args.data_dir, config.batch_size);
            match args.universe.as_deref() {
                Some(path) => Arc::new(provider.with_universe(load_universe(Some(path))?)),
                None => Arc::new(provider),
            }
        }
        Source::Synthetic => {
            warn!("synthetic price data, not for real analysis");
            let universe = load_universe(args.universe.as_deref())?;
            Arc::new(SyntheticHistoryProvider::new(
                universe,
                config.batch_size,
                args.seed,
            ))
        }
    };

    info!(provider = provider.name(), ttl_secs = config.ttl_secs, "engine ready");
    BreadthEngine::new(provider, config).context("building breadth engine")
}

fn run_report(source: &SourceArgs, filters: &FilterArgs, compact: bool) -> Result<()> {
    let engine = build_engine(source)?;
    let report = engine
        .calculate(filters.filter_set())
        .context("computing breadth report")?;

    let json = if compact {
        serde_json::to_string(&*report)?
    } else {
        serde_json::to_string_pretty(&*report)?
    };
    println!("{json}");
    Ok(())
}

fn run_watch(
    source: &SourceArgs,
    filters: &FilterArgs,
    interval: u64,
    iterations: Option<u64>,
) -> Result<()> {
    if interval == 0 {
        bail!("--interval must be at least 1 second");
    }

    let engine = build_engine(source)?;
    let filter_set = filters.filter_set();
    let mut previous: Option<Arc<BreadthReport>> = None;
    let mut tick: u64 = 0;

    loop {
        tick += 1;
        match engine.calculate(filter_set) {
            Ok(report) => {
                let cached = previous
                    .as_ref()
                    .is_some_and(|prev| Arc::ptr_eq(prev, &report));
                println!(
                    "#{tick} [{filter_set}] advances={} declines={} nifty={:+.2}% banknifty={:+.2}% {}",
                    report.advances.count,
                    report.declines.count,
                    report.indices.nifty.pct_change,
                    report.indices.banknifty.pct_change,
                    if cached { "(cached)" } else { "(fresh)" },
                );
                previous = Some(report);
            }
            Err(e) => warn!(error = %e, tick, "breadth computation failed"),
        }

        if iterations.is_some_and(|n| tick >= n) {
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(interval));
    }
}

fn run_universe(path: Option<&Path>) -> Result<()> {
    let symbols = load_universe(path)?
        .symbols()
        .context("resolving universe")?;
    for symbol in &symbols {
        println!("{symbol}");
    }
    info!(count = symbols.len(), "universe resolved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_report_filters() {
        let cli = Cli::try_parse_from([
            "breadth", "report", "--short", "above", "--long", "below", "--source", "synthetic",
        ])
        .unwrap();
        match cli.command {
            Commands::Report { source, filters, .. } => {
                assert_eq!(source.source, Source::Synthetic);
                assert_eq!(
                    filters.filter_set(),
                    FilterSet::new(Some(TrendFilter::Above), Some(TrendFilter::Below))
                );
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn rejects_unknown_filter_value() {
        assert!(Cli::try_parse_from(["breadth", "report", "--short", "sideways"]).is_err());
    }

    #[test]
    fn default_universe_includes_indices() {
        let symbols = load_universe(None).unwrap().symbols().unwrap();
        assert!(symbols.iter().any(|s| s == "^NSEI"));
        assert!(symbols.iter().any(|s| s == "^NSEBANK"));
    }

    #[test]
    fn yahoo_defaults_to_nifty500_cache() {
        assert_eq!(
            universe_path(None, Source::Yahoo),
            Some(Path::new("nifty500_cache.csv"))
        );
        assert_eq!(universe_path(None, Source::Synthetic), None);
        assert_eq!(universe_path(None, Source::Csv), None);

        let explicit = Path::new("custom.toml");
        assert_eq!(universe_path(Some(explicit), Source::Yahoo), Some(explicit));
    }

    #[test]
    fn nifty500_cache_file_resolves_with_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NIFTY500_CACHE_FILE);
        std::fs::write(&path, "symbol\nINFY.NS\n").unwrap();
        let symbols = load_universe(Some(&path)).unwrap().symbols().unwrap();
        assert_eq!(symbols, vec!["INFY.NS", "^NSEI", "^NSEBANK"]);
    }

    #[test]
    fn unsupported_universe_extension_is_an_error() {
        assert!(load_universe(Some(Path::new("symbols.json"))).is_err());
    }

    #[test]
    fn synthetic_report_end_to_end() {
        let args = SourceArgs {
            source: Source::Synthetic,
            data_dir: PathBuf::from("data"),
            universe: None,
            config: None,
            seed: 7,
        };
        let engine = build_engine(&args).unwrap();
        let report = engine.calculate(FilterSet::unfiltered()).unwrap();
        let universe_size = Universe::default_nse().symbols().unwrap().len();
        // Every non-index symbol has 60 sessions, so all are classified.
        assert_eq!(report.classified_count(), universe_size - 2);
        assert_ne!(report.indices.nifty.close, 0.0);
    }
}
