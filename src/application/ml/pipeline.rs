//! End-to-end forecast for one symbol: scale, window, train, roll forward, assess.
//!
//! Everything built here (scaler, model, window buffer) is owned by the call
//! and dropped when it returns; concurrent calls share nothing.

use super::forecaster::Forecaster;
use super::lstm_regressor::{LstmRegressorConfig, StackedLstmRegressor};
use super::trainer::{
    DEFAULT_BATCH_SIZE, FORECAST_EPOCHS, STANDALONE_EPOCHS, Trainer, TrainingReport,
};
use crate::domain::errors::ForecastError;
use crate::domain::ml::{MinMaxScaler, assess};
use crate::domain::types::{PredictionResult, PredictionSummary, round_to};
use chrono::Utc;
use tracing::debug;

pub const MIN_HORIZON_DAYS: usize = 1;
pub const MAX_HORIZON_DAYS: usize = 30;
pub const DEFAULT_HORIZON_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSettings {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            epochs: FORECAST_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: 0.001,
            seed: None,
        }
    }
}

impl ForecastSettings {
    /// Settings for the standalone training path.
    pub fn standalone() -> Self {
        Self {
            epochs: STANDALONE_EPOCHS,
            ..Self::default()
        }
    }

    fn model_config(&self) -> LstmRegressorConfig {
        LstmRegressorConfig {
            learning_rate: self.learning_rate,
            seed: self.seed,
            ..LstmRegressorConfig::default()
        }
    }
}

pub fn validate_horizon(days: usize) -> Result<(), ForecastError> {
    if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&days) {
        return Err(ForecastError::InvalidHorizon {
            days,
            min: MIN_HORIZON_DAYS,
            max: MAX_HORIZON_DAYS,
        });
    }
    Ok(())
}

/// Fits a fresh model on `closes` and forecasts `days` closes ahead.
pub fn run_forecast(
    symbol: &str,
    closes: &[f64],
    days: usize,
    settings: &ForecastSettings,
) -> Result<PredictionResult, ForecastError> {
    run_forecast_with_report(symbol, closes, days, settings).map(|(result, _)| result)
}

/// Same as [`run_forecast`], also returning how the throwaway model trained.
pub fn run_forecast_with_report(
    symbol: &str,
    closes: &[f64],
    days: usize,
    settings: &ForecastSettings,
) -> Result<(PredictionResult, TrainingReport), ForecastError> {
    validate_horizon(days)?;
    let current_price = last_close(symbol, closes)?;

    let scaler = MinMaxScaler::fit(closes)?;
    let scaled = scaler.transform(closes);
    debug!(
        "Pipeline: {} scaled {} closes into [{:.2}, {:.2}]",
        symbol,
        closes.len(),
        scaler.min(),
        scaler.max()
    );

    let config = settings.model_config();
    let trained = Trainer::new(settings.epochs, settings.batch_size)
        .train(&scaled, || StackedLstmRegressor::new(config))?;

    let predictions = Forecaster::new(&trained.model, &scaler).forecast(&scaled, days)?;
    let assessment = assess(&predictions, current_price)?;
    debug!(
        "Pipeline: {} forecast {} days, confidence {:.1}",
        symbol, days, assessment.confidence
    );

    let all_predictions: Vec<f64> = predictions.iter().map(|&p| round_to(p, 2)).collect();
    let tomorrow = all_predictions.first().copied().unwrap_or_default();
    let next_week = all_predictions.last().copied().unwrap_or_default();

    let result = PredictionResult {
        symbol: symbol.to_string(),
        current_price: round_to(current_price, 2),
        predictions: PredictionSummary {
            tomorrow,
            three_day: round_to(assessment.three_day_average, 2),
            next_week,
        },
        all_predictions,
        confidence: round_to(assessment.confidence, 1),
        trend: assessment.trend,
        recommendation: assessment.recommendation,
        timestamp: Utc::now(),
    };
    Ok((result, trained.report))
}

/// Fits a model on `closes` without forecasting and reports how training went.
pub fn run_training(
    symbol: &str,
    closes: &[f64],
    settings: &ForecastSettings,
) -> Result<TrainingReport, ForecastError> {
    last_close(symbol, closes)?;
    let scaler = MinMaxScaler::fit(closes)?;
    let scaled = scaler.transform(closes);

    let config = settings.model_config();
    let trained = Trainer::new(settings.epochs, settings.batch_size)
        .train(&scaled, || StackedLstmRegressor::new(config))?;
    Ok(trained.report)
}

fn last_close(symbol: &str, closes: &[f64]) -> Result<f64, ForecastError> {
    closes
        .last()
        .copied()
        .ok_or_else(|| ForecastError::UpstreamDataUnavailable {
            symbol: symbol.to_string(),
            reason: "empty price history".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::trainer::MIN_TRAINING_WINDOWS;
    use crate::domain::ml::WINDOW_LENGTH;

    fn quick_settings() -> ForecastSettings {
        ForecastSettings {
            epochs: 2,
            batch_size: 32,
            learning_rate: 0.001,
            seed: Some(17),
        }
    }

    fn linear_closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_horizon_bounds() {
        assert!(validate_horizon(1).is_ok());
        assert!(validate_horizon(30).is_ok());
        assert!(matches!(
            validate_horizon(0),
            Err(ForecastError::InvalidHorizon { days: 0, .. })
        ));
        assert!(matches!(
            validate_horizon(31),
            Err(ForecastError::InvalidHorizon { days: 31, .. })
        ));
    }

    #[test]
    fn test_invalid_horizon_checked_before_training() {
        // Too short to train, but the horizon error wins
        let result = run_forecast("AAPL", &[1.0, 2.0], 0, &quick_settings());
        assert!(matches!(result, Err(ForecastError::InvalidHorizon { .. })));
    }

    #[test]
    fn test_empty_history_is_upstream_error() {
        let result = run_forecast("AAPL", &[], 5, &quick_settings());
        assert!(matches!(
            result,
            Err(ForecastError::UpstreamDataUnavailable { .. })
        ));
    }

    #[test]
    fn test_constant_series_is_scaling_error() {
        let result = run_forecast("FLAT", &[42.0; 120], 5, &quick_settings());
        assert!(matches!(result, Err(ForecastError::Scaling { .. })));
    }

    #[test]
    fn test_79_closes_is_insufficient() {
        assert_eq!(WINDOW_LENGTH + MIN_TRAINING_WINDOWS, 80);
        let result = run_forecast("AAPL", &linear_closes(79), 5, &quick_settings());
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientWindows { available: 49, .. })
        ));
    }

    #[test]
    fn test_result_shape_and_rounding() {
        let closes = linear_closes(100);
        let result = run_forecast("aapl", &closes, 5, &quick_settings()).unwrap();

        assert_eq!(result.symbol, "aapl");
        assert_eq!(result.current_price, 199.0);
        assert_eq!(result.all_predictions.len(), 5);
        assert_eq!(result.predictions.tomorrow, result.all_predictions[0]);
        assert_eq!(result.predictions.next_week, result.all_predictions[4]);
        assert!((50.0..=95.0).contains(&result.confidence));
        for p in &result.all_predictions {
            assert_eq!(*p, round_to(*p, 2));
        }
        assert_eq!(result.confidence, round_to(result.confidence, 1));
    }

    #[test]
    fn test_training_report() {
        let report = run_training("AAPL", &linear_closes(100), &quick_settings()).unwrap();
        assert_eq!(report.epochs, 2);
        assert_eq!(report.train_samples, 56);
        assert_eq!(report.validation_samples, 14);
    }
}
