//! Configuration module for Stockcast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Provider, Forecast, and Observability.

mod forecast_config;
mod observability_config;
mod provider_config;

pub use forecast_config::ForecastEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use provider_config::{MassiveConfig, ProviderEnvConfig};

use crate::application::ml::ForecastSettings;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Where historical prices come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Massive,
    Csv,
    Mock,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "massive" | "polygon" => Ok(DataSource::Massive),
            "csv" => Ok(DataSource::Csv),
            "mock" => Ok(DataSource::Mock),
            _ => anyhow::bail!(
                "Invalid DATA_SOURCE: {}. Must be 'massive', 'csv', or 'mock'",
                s
            ),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Massive => write!(f, "massive"),
            DataSource::Csv => write!(f, "csv"),
            DataSource::Mock => write!(f, "mock"),
        }
    }
}

/// Main application configuration.
///
/// Aggregates the sub-configs into flat fields for the rest of the application.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_source: DataSource,

    // Provider (from ProviderEnvConfig)
    pub massive_api_key: String,
    pub massive_base_url: String,
    pub massive_max_calls_per_minute: usize,
    pub csv_data_dir: String,

    // Forecast (from ForecastEnvConfig)
    pub forecast_epochs: usize,
    pub training_epochs: usize,
    pub batch_size: usize,
    pub default_days: usize,
    pub max_concurrency: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,

    // Observability (from ObservabilityEnvConfig)
    pub observability_enabled: bool,
    pub observability_interval_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let source_str = env::var("DATA_SOURCE").unwrap_or_else(|_| "mock".to_string());
        let data_source = DataSource::from_str(&source_str)?;

        let provider = ProviderEnvConfig::from_env();
        let forecast = ForecastEnvConfig::from_env().context("Failed to load forecast config")?;
        let observability = ObservabilityEnvConfig::from_env();

        Ok(Self {
            data_source,

            // Provider
            massive_api_key: provider.massive.api_key,
            massive_base_url: provider.massive.base_url,
            massive_max_calls_per_minute: provider.massive.max_calls_per_minute,
            csv_data_dir: provider.csv_data_dir,

            // Forecast
            forecast_epochs: forecast.epochs,
            training_epochs: forecast.training_epochs,
            batch_size: forecast.batch_size,
            default_days: forecast.default_days,
            max_concurrency: forecast.max_concurrency,
            learning_rate: forecast.learning_rate,
            seed: forecast.seed,

            // Observability
            observability_enabled: observability.enabled,
            observability_interval_seconds: observability.interval_seconds,
        })
    }

    /// Settings for training inline with a forecast request
    pub fn forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            epochs: self.forecast_epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            seed: self.seed,
        }
    }

    /// Settings for the standalone training path
    pub fn training_settings(&self) -> ForecastSettings {
        ForecastSettings {
            epochs: self.training_epochs,
            ..self.forecast_settings()
        }
    }
}
