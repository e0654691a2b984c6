//! Historical data provider configuration parsing from environment variables.

use crate::infrastructure::massive::market_data::{DEFAULT_BASE_URL, FREE_TIER_CALLS_PER_MINUTE};
use std::env;

/// Massive (Polygon-compatible) API configuration
#[derive(Debug, Clone)]
pub struct MassiveConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_calls_per_minute: usize,
}

impl MassiveConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("MASSIVE_API_KEY").unwrap_or_default(),
            base_url: env::var("MASSIVE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            max_calls_per_minute: env::var("MASSIVE_MAX_CALLS_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(FREE_TIER_CALLS_PER_MINUTE),
        }
    }
}

/// Aggregated provider configuration
#[derive(Debug, Clone)]
pub struct ProviderEnvConfig {
    pub massive: MassiveConfig,
    pub csv_data_dir: String,
}

impl ProviderEnvConfig {
    pub fn from_env() -> Self {
        Self {
            massive: MassiveConfig::from_env(),
            csv_data_dir: env::var("CSV_DATA_DIR").unwrap_or_else(|_| "data/prices".to_string()),
        }
    }
}
