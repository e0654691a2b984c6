//! Standalone model training
//!
//! Fits the forecasting network on a symbol's history without producing a
//! forecast and prints the training report as JSON.
//!
//! # Usage
//! ```sh
//! cargo run --bin train -- AAPL --epochs 25
//! ```

use anyhow::Result;
use clap::Parser;
use stockcast::application::ForecastService;
use stockcast::config::Config;
use stockcast::infrastructure::ServiceFactory;
use stockcast::infrastructure::observability::Metrics;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Symbol to train on
    symbol: String,

    /// Training epochs. Defaults to TRAINING_EPOCHS (25).
    #[arg(long)]
    epochs: Option<usize>,

    /// Mini-batch size. Defaults to FORECAST_BATCH_SIZE (32).
    #[arg(long)]
    batch_size: Option<usize>,
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

    let args = Args::parse();
    let config = Config::from_env()?;

    let mut training_settings = config.training_settings();
    if let Some(batch_size) = args.batch_size.filter(|&b| b > 0) {
        training_settings.batch_size = batch_size;
    }
    info!(
        "Training {} for {} epochs (batch size {})",
        args.symbol,
        args.epochs.unwrap_or(training_settings.epochs),
        training_settings.batch_size
    );

    let metrics = Metrics::new()?;
    let provider = ServiceFactory::create_provider(&config, Some(metrics.clone()))?;
    let service = ForecastService::new(provider, config.forecast_settings(), config.max_concurrency)
        .with_training_settings(training_settings)
        .with_metrics(metrics);

    let outcome = service.train(&args.symbol, args.epochs).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        anyhow::bail!(outcome.message);
    }
    Ok(())
}
