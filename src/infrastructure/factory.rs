use crate::config::{Config, DataSource};
use crate::domain::errors::MarketDataError;
use crate::domain::ports::HistoricalDataProvider;
use crate::infrastructure::csv_provider::CsvDataProvider;
use crate::infrastructure::massive::MassiveDataProvider;
use crate::infrastructure::mock::SyntheticDataProvider;
use crate::infrastructure::observability::Metrics;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct ServiceFactory;

impl ServiceFactory {
    pub fn create_provider(
        config: &Config,
        metrics: Option<Metrics>,
    ) -> Result<Arc<dyn HistoricalDataProvider>> {
        let provider: Arc<dyn HistoricalDataProvider> = match config.data_source {
            DataSource::Mock => Arc::new(SyntheticDataProvider::new()),
            DataSource::Csv => Arc::new(CsvDataProvider::new(&config.csv_data_dir)),
            DataSource::Massive => {
                if config.massive_api_key.is_empty() {
                    return Err(MarketDataError::MissingApiKey.into());
                }

                let mut builder = MassiveDataProvider::builder()
                    .api_key(config.massive_api_key.clone())
                    .base_url(config.massive_base_url.clone())
                    .max_calls_per_minute(config.massive_max_calls_per_minute);
                if let Some(metrics) = metrics {
                    builder = builder.metrics(metrics);
                }
                Arc::new(builder.build())
            }
        };

        info!("ServiceFactory: Using {} historical data provider", provider.name());
        Ok(provider)
    }
}
