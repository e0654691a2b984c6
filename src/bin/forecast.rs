//! Stockcast forecast CLI
//!
//! Trains a short-lived LSTM per symbol on two years of daily closes and prints
//! the forecast as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//! ```sh
//! DATA_SOURCE=massive cargo run --bin forecast -- predict AAPL --days 7
//! cargo run --bin forecast -- batch AAPL NVDA GOOGL
//! cargo run --bin forecast -- history AAPL --period 6mo --interval 1wk
//! cargo run --bin forecast -- quote AAPL
//! cargo run --bin forecast -- stocks
//! ```
//!
//! # Environment Variables
//! - `DATA_SOURCE` - `massive`, `csv` or `mock` (default: mock)
//! - `FORECAST_EPOCHS` - Epochs per inline training run (default: 15)
//! - `OBSERVABILITY_ENABLED` - Emit METRICS_JSON lines on stderr during batch runs (default: true)

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use stockcast::application::ForecastService;
use stockcast::config::Config;
use stockcast::domain::ports::HistoricalDataProvider;
use stockcast::domain::types::{BarInterval, HistoryPeriod};
use stockcast::infrastructure::catalog::company_name;
use stockcast::infrastructure::observability::{Metrics, MetricsReporter};
use stockcast::infrastructure::{ServiceFactory, get_all_stocks};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forecast one symbol
    Predict {
        symbol: String,

        /// Days to forecast (1-30). Defaults to FORECAST_DEFAULT_DAYS.
        #[arg(long)]
        days: Option<usize>,
    },
    /// Forecast several symbols, skipping the ones that fail
    Batch {
        /// Symbols to forecast. Defaults to the popular stock list.
        symbols: Vec<String>,

        #[arg(long)]
        days: Option<usize>,
    },
    /// Print raw price bars for one symbol
    History {
        symbol: String,

        /// Look-back period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y or ALL
        #[arg(long, default_value = "1y")]
        period: String,

        /// Bar size: 1d, 1wk or 1mo
        #[arg(long, default_value = "1d")]
        interval: String,
    },
    /// Show the latest session for one symbol
    Quote { symbol: String },
    /// List the popular stock symbols
    Stocks,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(
        "Stockcast {} (data source: {})",
        env!("CARGO_PKG_VERSION"),
        config.data_source
    );

    if let Command::Stocks = cli.command {
        let stocks = get_all_stocks();
        let body = json!({ "success": true, "count": stocks.len(), "data": stocks });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let metrics = Metrics::new()?;
    let provider = ServiceFactory::create_provider(&config, Some(metrics.clone()))?;
    let service = ForecastService::new(
        provider.clone(),
        config.forecast_settings(),
        config.max_concurrency,
    )
    .with_metrics(metrics.clone());

    match cli.command {
        Command::Predict { symbol, days } => {
            let days = days.unwrap_or(config.default_days);
            let symbol = symbol.to_uppercase();

            let body = match service.predict(&symbol, days).await {
                Some(prediction) => json!({ "success": true, "data": prediction }),
                None => json!({
                    "success": false,
                    "error": format!(
                        "Unable to generate prediction for {}. This may be due to insufficient historical data.",
                        symbol
                    ),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Batch { symbols, days } => {
            let days = days.unwrap_or(config.default_days);
            let symbols: Vec<String> = if symbols.is_empty() {
                get_all_stocks().into_iter().map(|s| s.symbol).collect()
            } else {
                symbols.iter().map(|s| s.to_uppercase()).collect()
            };

            if config.observability_enabled {
                let reporter = MetricsReporter::new(
                    metrics.clone(),
                    config.data_source.to_string(),
                    config.observability_interval_seconds,
                );
                tokio::spawn(async move {
                    reporter.run().await;
                });
            }

            let predictions = service.predict_batch(&symbols, days).await;
            let body = json!({ "success": true, "count": predictions.len(), "data": predictions });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::History {
            symbol,
            period,
            interval,
        } => {
            let symbol = symbol.to_uppercase();
            let period: HistoryPeriod = period.parse()?;
            let interval: BarInterval = interval.parse()?;
            info!("Fetching history for {}: period={}, interval={}", symbol, period, interval);

            let bars = provider.get_historical_data(&symbol, period, interval).await?;
            let body = if bars.is_empty() {
                json!({
                    "success": false,
                    "error": format!(
                        "No historical data found for {}. The symbol may be invalid or the market closed.",
                        symbol
                    ),
                })
            } else {
                json!({
                    "success": true,
                    "symbol": symbol,
                    "period": period.to_string(),
                    "interval": interval.to_string(),
                    "count": bars.len(),
                    "data": bars,
                })
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Quote { symbol } => {
            let symbol = symbol.to_uppercase();
            let body = match provider.get_quote(&symbol).await? {
                Some(quote) => json!({
                    "success": true,
                    "name": company_name(&symbol).unwrap_or("Unknown"),
                    "data": quote,
                }),
                None => json!({
                    "success": false,
                    "error": format!("Stock {} not found", symbol),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Stocks => {}
    }

    Ok(())
}
