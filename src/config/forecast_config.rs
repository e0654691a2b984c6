//! Forecast and training configuration parsing from environment variables.

use crate::application::ml::pipeline::{DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
use crate::application::ml::trainer::{DEFAULT_BATCH_SIZE, FORECAST_EPOCHS, STANDALONE_EPOCHS};
use anyhow::Result;
use std::env;
use std::str::FromStr;

/// Forecast environment configuration
#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    /// Epochs used when training inline with a forecast request
    pub epochs: usize,
    /// Epochs used by the standalone training path
    pub training_epochs: usize,
    pub batch_size: usize,
    pub default_days: usize,
    /// Forecasts allowed to train at the same time
    pub max_concurrency: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl Default for ForecastEnvConfig {
    fn default() -> Self {
        Self {
            epochs: FORECAST_EPOCHS,
            training_epochs: STANDALONE_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            default_days: DEFAULT_HORIZON_DAYS,
            max_concurrency: 2,
            learning_rate: 0.001,
            seed: None,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl ForecastEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            epochs: parse_or("FORECAST_EPOCHS", defaults.epochs),
            training_epochs: parse_or("TRAINING_EPOCHS", defaults.training_epochs),
            batch_size: parse_or("FORECAST_BATCH_SIZE", defaults.batch_size),
            default_days: parse_or("FORECAST_DEFAULT_DAYS", defaults.default_days),
            max_concurrency: parse_or("FORECAST_MAX_CONCURRENCY", defaults.max_concurrency),
            learning_rate: parse_or("FORECAST_LEARNING_RATE", defaults.learning_rate),
            seed: env::var("FORECAST_SEED")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&self.default_days) {
            anyhow::bail!(
                "FORECAST_DEFAULT_DAYS must be between {} and {}, got {}",
                MIN_HORIZON_DAYS,
                MAX_HORIZON_DAYS,
                self.default_days
            );
        }
        if self.batch_size == 0 {
            anyhow::bail!("FORECAST_BATCH_SIZE must be greater than 0");
        }
        if self.max_concurrency == 0 {
            anyhow::bail!("FORECAST_MAX_CONCURRENCY must be greater than 0");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            anyhow::bail!(
                "FORECAST_LEARNING_RATE must be a positive number, got {}",
                self.learning_rate
            );
        }
        Ok(())
    }
}
