use crate::application::ml::pipeline::{
    ForecastSettings, run_forecast_with_report, run_training, validate_horizon,
};
use crate::application::ml::trainer::TrainingReport;
use crate::domain::errors::ForecastError;
use crate::domain::ports::HistoricalDataProvider;
use crate::domain::types::{BarInterval, HistoryPeriod, PredictionResult, closing_prices};
use crate::infrastructure::observability::Metrics;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// History requested for every forecast and training run.
const HISTORY_PERIOD: HistoryPeriod = HistoryPeriod::TwoYears;

/// Result of the standalone training path
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    pub success: bool,
    pub message: String,
    pub report: Option<TrainingReport>,
}

/// Entry point for forecasts: fetches history, trains a throwaway model on a
/// blocking worker and converts every failure into "no result".
///
/// Training is CPU-bound, so at most `max_concurrency` requests train at once;
/// the rest wait for a permit.
pub struct ForecastService {
    provider: Arc<dyn HistoricalDataProvider>,
    settings: ForecastSettings,
    training_settings: ForecastSettings,
    permits: Arc<Semaphore>,
    metrics: Option<Metrics>,
}

impl ForecastService {
    pub fn new(
        provider: Arc<dyn HistoricalDataProvider>,
        settings: ForecastSettings,
        max_concurrency: usize,
    ) -> Self {
        Self {
            provider,
            training_settings: ForecastSettings::standalone(),
            settings,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            metrics: None,
        }
    }

    pub fn with_training_settings(mut self, settings: ForecastSettings) -> Self {
        self.training_settings = settings;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Forecast `days` closes for `symbol`, or `None` if anything went wrong.
    pub async fn predict(&self, symbol: &str, days: usize) -> Option<PredictionResult> {
        let symbol = symbol.trim().to_uppercase();
        match self.try_predict(&symbol, days).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("ForecastService: No prediction for {}: {}", symbol, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(e.kind());
                }
                None
            }
        }
    }

    /// Like [`predict`](Self::predict) but keeps the reason for a missing result.
    pub async fn try_predict(
        &self,
        symbol: &str,
        days: usize,
    ) -> Result<PredictionResult, ForecastError> {
        validate_horizon(days)?;
        let closes = self.fetch_closes(symbol).await?;
        debug!(
            "ForecastService: Got {} closes for {}. Training model...",
            closes.len(),
            symbol
        );

        let settings = self.settings.clone();
        let owned_symbol = symbol.to_string();
        let (result, report) = self
            .run_blocking(move || run_forecast_with_report(&owned_symbol, &closes, days, &settings))
            .await?;

        info!(
            "ForecastService: {} trend={} confidence={:.1}% ({})",
            result.symbol, result.trend, result.confidence, result.recommendation
        );
        if let Some(metrics) = &self.metrics {
            metrics.observe_training("forecast", report.elapsed.as_secs_f64());
            metrics.record_success(&result.symbol, result.confidence);
        }
        Ok(result)
    }

    /// Forecasts each symbol in turn, skipping the ones that yield no result.
    pub async fn predict_batch(&self, symbols: &[String], days: usize) -> Vec<PredictionResult> {
        let mut predictions = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(prediction) = self.predict(symbol, days).await {
                predictions.push(prediction);
            }
        }
        info!(
            "ForecastService: Batch produced {}/{} predictions",
            predictions.len(),
            symbols.len()
        );
        predictions
    }

    /// Standalone training run. `epochs` overrides the configured count.
    pub async fn train(&self, symbol: &str, epochs: Option<usize>) -> TrainingOutcome {
        let symbol = symbol.trim().to_uppercase();
        match self.try_train(&symbol, epochs).await {
            Ok(report) => TrainingOutcome {
                success: true,
                message: format!("Model trained successfully for {}", symbol),
                report: Some(report),
            },
            Err(e) => {
                warn!("ForecastService: Training failed for {}: {}", symbol, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(e.kind());
                }
                TrainingOutcome {
                    success: false,
                    message: e.to_string(),
                    report: None,
                }
            }
        }
    }

    pub async fn try_train(
        &self,
        symbol: &str,
        epochs: Option<usize>,
    ) -> Result<TrainingReport, ForecastError> {
        let closes = self.fetch_closes(symbol).await?;

        let mut settings = self.training_settings.clone();
        if let Some(epochs) = epochs {
            settings.epochs = epochs;
        }
        let owned_symbol = symbol.to_string();
        let report = self
            .run_blocking(move || run_training(&owned_symbol, &closes, &settings))
            .await?;

        if let Some(metrics) = &self.metrics {
            metrics.observe_training("standalone", report.elapsed.as_secs_f64());
        }
        Ok(report)
    }

    async fn fetch_closes(&self, symbol: &str) -> Result<Vec<f64>, ForecastError> {
        let bars = self
            .provider
            .get_historical_data(symbol, HISTORY_PERIOD, BarInterval::Daily)
            .await
            .map_err(|e| ForecastError::UpstreamDataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("{:#}", e),
            })?;

        if bars.is_empty() {
            return Err(ForecastError::UpstreamDataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("{} returned no bars", self.provider.name()),
            });
        }
        Ok(closing_prices(&bars))
    }

    /// Runs CPU-bound work on the blocking pool once a permit is free.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T, ForecastError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ForecastError> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ForecastError::training("forecast workers are shut down"))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .map_err(|e| ForecastError::inference(format!("forecast worker failed: {}", e)))?
    }
}
