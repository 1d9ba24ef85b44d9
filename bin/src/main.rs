//! Levante CLI binary.
//!
//! Command-line interface for the FX sentiment pipeline: collect event
//! sentiment, inspect prices, build the merged dataset, and run the
//! long/short backtest.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use levante_dataset::{DatasetBuilder, PRICE_BUFFER_DAYS};
use levante_eval::{BacktestConfig, SignalBacktest};
use levante_gdelt::{BulkCollector, DayAggregator, EventFilters, EventsClient, ParquetDayStore};
use levante_model::train_model;
use levante_prices::{PriceFetcher, QuoteClient};
use levante_signals::signals_from_features;
use levante_traits::types::parse_date;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "levante")]
#[command(about = "FX news-sentiment signal research pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect daily event sentiment over a date range
    Collect {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Day-cache directory
        #[arg(long, default_value = "data/raw/gdelt_daily")]
        cache_dir: PathBuf,

        /// Minimum mentions per event
        #[arg(long, default_value = "1")]
        min_mentions: u32,

        /// Minimum events per (day, currency) group
        #[arg(long, default_value = "1")]
        min_events: u32,

        /// Keep only root (originating) events
        #[arg(long)]
        root_only: bool,

        /// Keep only events with |tone| at or above this magnitude
        #[arg(long)]
        tone_threshold: Option<f64>,

        /// Concurrent day fetches
        #[arg(long, default_value = "12")]
        concurrency: usize,
    },

    /// Fetch and summarize the FX price table
    Prices {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },

    /// Build (or load) the merged sentiment/return dataset
    Dataset {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Dataset cache path
        #[arg(long, default_value = "data/processed/sentiment_fx.parquet")]
        cache: PathBuf,

        /// Day-cache directory
        #[arg(long, default_value = "data/raw/gdelt_daily")]
        cache_dir: PathBuf,
    },

    /// Train the baseline model and backtest the ranked long/short signal
    Backtest {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Dataset cache path
        #[arg(long, default_value = "data/processed/sentiment_fx.parquet")]
        cache: PathBuf,

        /// Day-cache directory
        #[arg(long, default_value = "data/raw/gdelt_daily")]
        cache_dir: PathBuf,

        /// Currencies per side of the book
        #[arg(long, default_value = "5")]
        top_n: usize,

        /// Transaction fee in basis points
        #[arg(long, default_value = "5.0")]
        fee_bps: f64,

        /// Slippage in basis points
        #[arg(long, default_value = "1.0")]
        slippage_bps: f64,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            start,
            end,
            cache_dir,
            min_mentions,
            min_events,
            root_only,
            tone_threshold,
            concurrency,
        } => {
            let filters = EventFilters {
                min_mentions,
                min_event_count: min_events,
                root_only,
                tone_threshold,
            };
            collect(&start, &end, cache_dir, filters, concurrency).await?;
        }
        Commands::Prices { start, end } => {
            prices(&start, &end).await?;
        }
        Commands::Dataset {
            start,
            end,
            cache,
            cache_dir,
        } => {
            dataset(&start, &end, &cache, cache_dir).await?;
        }
        Commands::Backtest {
            start,
            end,
            cache,
            cache_dir,
            top_n,
            fee_bps,
            slippage_bps,
            format,
        } => {
            backtest(&start, &end, &cache, cache_dir, top_n, fee_bps, slippage_bps, &format)
                .await?;
        }
    }

    Ok(())
}

fn header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║ {title:<60} ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

fn make_collector(
    cache_dir: PathBuf,
    filters: EventFilters,
    concurrency: usize,
) -> Result<Arc<BulkCollector>> {
    let store = ParquetDayStore::new(cache_dir)?;
    let aggregator = DayAggregator::new(Arc::new(EventsClient::new()), Arc::new(store), filters);
    Ok(Arc::new(
        BulkCollector::new(Arc::new(aggregator)).with_concurrency(concurrency),
    ))
}

async fn collect(
    start: &str,
    end: &str,
    cache_dir: PathBuf,
    filters: EventFilters,
    concurrency: usize,
) -> Result<()> {
    header("Sentiment Collection");

    let start = parse_date(start)?;
    let end = parse_date(end)?;
    println!("Period:      {start} to {end}");
    println!(
        "Filters:     mentions ≥ {}, events ≥ {}, root_only = {}, tone ≥ {:?}",
        filters.min_mentions, filters.min_event_count, filters.root_only, filters.tone_threshold
    );
    println!("Concurrency: {concurrency}");
    println!();

    let collector = make_collector(cache_dir, filters, concurrency)?;
    let (table, report) = collector.collect_range(start, end).await?;

    let currencies = table
        .column("currency")?
        .as_materialized_series()
        .n_unique()?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("COLLECTION SUMMARY");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    println!("Total rows:        {:>8}", report.rows);
    println!("Days with data:    {:>8}", report.days_with_data);
    println!("Days empty:        {:>8}", report.days_empty);
    println!("Days failed:       {:>8}", report.days_failed);
    println!("Active currencies: {currencies:>8}");
    println!();

    Ok(())
}

async fn prices(start: &str, end: &str) -> Result<()> {
    header("FX Price Table");

    let start = parse_date(start)?;
    let end = parse_date(end)?;
    println!("Period: {start} to {end}");
    println!();

    let fetcher = PriceFetcher::new(QuoteClient::new());
    let table = fetcher.fetch_prices(start, end).await?;

    let tickers: Vec<String> = table
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|n| n != "date")
        .collect();

    println!("Rows:        {}", table.height());
    println!("Instruments: {}", tickers.len());
    println!("Columns:     {}", tickers.join(", "));
    println!();

    Ok(())
}

async fn dataset(start: &str, end: &str, cache: &Path, cache_dir: PathBuf) -> Result<()> {
    header("Dataset Build");

    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;
    println!("Period: {start_date} to {end_date}");
    println!("Cache:  {}", cache.display());
    println!();

    let collector = make_collector(cache_dir, EventFilters::default(), 12)?;
    let builder = DatasetBuilder::new(collector, PriceFetcher::new(QuoteClient::new()));
    let table = builder.build(start_date, end_date, cache).await?;

    let bytes = std::fs::metadata(cache).map(|m| m.len()).unwrap_or(0);
    println!("Rows:    {}", table.height());
    println!("Columns: {}", table.width());
    println!("Size:    {} KiB", bytes / 1024);
    println!();

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn backtest(
    start: &str,
    end: &str,
    cache: &Path,
    cache_dir: PathBuf,
    top_n: usize,
    fee_bps: f64,
    slippage_bps: f64,
    format: &str,
) -> Result<()> {
    header("Signal Backtest");

    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;
    println!("Period: {start_date} to {end_date}");
    println!("Top-N:  {top_n} per side");
    println!("Costs:  {fee_bps} bps fees + {slippage_bps} bps slippage");
    println!();

    let collector = make_collector(cache_dir, EventFilters::default(), 12)?;
    let fetcher = PriceFetcher::new(QuoteClient::new());
    let builder = DatasetBuilder::new(collector, fetcher.clone());
    let dataset = builder.build(start_date, end_date, cache).await?;
    if dataset.is_empty() {
        println!("Dataset is empty; nothing to backtest.");
        return Ok(());
    }
    println!("Dataset: {} rows × {} columns", dataset.height(), dataset.width());

    let (model, scaler) = train_model(&dataset)?;
    let entries = signals_from_features(&dataset, &scaler, &model, top_n)?;

    let price_end = end_date
        .checked_add_days(chrono::Days::new(PRICE_BUFFER_DAYS))
        .unwrap_or(end_date);
    let price_table = fetcher.fetch_prices(start_date, price_end).await?;

    let config = BacktestConfig {
        fee_bps,
        slippage_bps,
        ..Default::default()
    };
    let result = SignalBacktest::new(config).run(&price_table, &entries)?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("BACKTEST RESULTS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Total Return:      {:>10.2}%", result.total_return * 100.0);
        println!(
            "Annualized Return: {:>10.2}%",
            result.annualized_return * 100.0
        );
        println!(
            "Annualized Vol:    {:>10.2}%",
            result.annualized_volatility * 100.0
        );
        println!("Sharpe Ratio:      {:>10.2}", result.sharpe_ratio);
        println!("Max Drawdown:      {:>10.2}%", result.max_drawdown * 100.0);
        println!("Win Rate:          {:>10.1}%", result.win_rate * 100.0);
        println!("Days Simulated:    {:>10}", result.n_days);
    }
    println!();

    Ok(())
}
