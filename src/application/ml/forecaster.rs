use super::predictor::SequenceRegressionModel;
use super::trainer::panic_message;
use crate::domain::errors::ForecastError;
use crate::domain::ml::{MinMaxScaler, SlidingWindow, WINDOW_LENGTH};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Rolls a fitted model forward one day at a time, feeding each prediction
/// back into the input window.
pub struct Forecaster<'a, M: SequenceRegressionModel> {
    model: &'a M,
    scaler: &'a MinMaxScaler,
    window_length: usize,
}

impl<'a, M: SequenceRegressionModel> Forecaster<'a, M> {
    pub fn new(model: &'a M, scaler: &'a MinMaxScaler) -> Self {
        Self {
            model,
            scaler,
            window_length: WINDOW_LENGTH,
        }
    }

    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    /// Returns exactly `days` prices in original units, tomorrow first.
    pub fn forecast(&self, scaled_history: &[f64], days: usize) -> Result<Vec<f64>, ForecastError> {
        if scaled_history.len() < self.window_length {
            return Err(ForecastError::InsufficientHistory {
                available: scaled_history.len(),
                required: self.window_length,
            });
        }

        let mut window = SlidingWindow::from_history(self.window_length, scaled_history);
        let mut prices = Vec::with_capacity(days);

        for day in 1..=days {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.model.predict(window.as_slice())));
            let scaled = match outcome {
                Ok(result) => result?,
                Err(payload) => {
                    return Err(ForecastError::inference(format!(
                        "model panicked on day {}: {}",
                        day,
                        panic_message(payload.as_ref())
                    )));
                }
            };

            let price = self.scaler.decode(scaled);
            if !price.is_finite() {
                return Err(ForecastError::inference(format!(
                    "non-finite price on day {}",
                    day
                )));
            }
            debug!("Forecaster: day {} -> {:.4}", day, price);

            prices.push(price);
            window.push(scaled);
        }

        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::predictor::{FitParams, FitReport};
    use crate::domain::ml::Window;

    /// Predicts last value + fixed step, so each output depends on the previous one.
    struct DriftModel {
        step: f64,
    }

    impl SequenceRegressionModel for DriftModel {
        fn fit(&mut self, _: &[Window], _: &[Window], p: &FitParams) -> Result<FitReport, ForecastError> {
            Ok(FitReport {
                epochs_run: p.epochs,
                train_loss: 0.0,
                validation_loss: 0.0,
            })
        }

        fn predict(&self, window: &[f64]) -> Result<f64, ForecastError> {
            assert_eq!(window.len(), 3);
            Ok(window[2] + self.step)
        }

        fn name(&self) -> &str {
            "drift"
        }
    }

    struct NanModel;

    impl SequenceRegressionModel for NanModel {
        fn fit(&mut self, _: &[Window], _: &[Window], _: &FitParams) -> Result<FitReport, ForecastError> {
            unreachable!()
        }

        fn predict(&self, _: &[f64]) -> Result<f64, ForecastError> {
            Ok(f64::NAN)
        }

        fn name(&self) -> &str {
            "nan"
        }
    }

    fn scaler() -> MinMaxScaler {
        MinMaxScaler::fit(&[100.0, 200.0]).unwrap()
    }

    #[test]
    fn test_returns_exactly_requested_days() {
        let scaler = scaler();
        let model = DriftModel { step: 0.0 };
        let forecaster = Forecaster::new(&model, &scaler).with_window_length(3);

        for days in [1, 7, 30] {
            let prices = forecaster.forecast(&[0.1, 0.2, 0.5], days).unwrap();
            assert_eq!(prices.len(), days);
        }
    }

    #[test]
    fn test_predictions_feed_back_into_window() {
        let scaler = scaler();
        let model = DriftModel { step: 0.1 };
        let forecaster = Forecaster::new(&model, &scaler).with_window_length(3);

        let prices = forecaster.forecast(&[0.0, 0.2, 0.5], 3).unwrap();
        let expected = [160.0, 170.0, 180.0];
        for (p, e) in prices.iter().zip(expected) {
            assert!((p - e).abs() < 1e-9, "{} vs {}", p, e);
        }
    }

    #[test]
    fn test_uses_trailing_window_only() {
        let scaler = scaler();
        let model = DriftModel { step: 0.0 };
        let forecaster = Forecaster::new(&model, &scaler).with_window_length(3);

        let prices = forecaster.forecast(&[0.9, 0.9, 0.1, 0.2, 0.3], 1).unwrap();
        assert!((prices[0] - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_is_rejected() {
        let scaler = scaler();
        let model = DriftModel { step: 0.0 };
        let forecaster = Forecaster::new(&model, &scaler).with_window_length(3);

        let result = forecaster.forecast(&[0.5, 0.5], 1);
        assert!(matches!(result, Err(ForecastError::InsufficientHistory { .. })));
    }

    #[test]
    fn test_non_finite_prediction_is_inference_error() {
        let scaler = scaler();
        let forecaster = Forecaster::new(&NanModel, &scaler).with_window_length(3);

        let result = forecaster.forecast(&[0.5, 0.5, 0.5], 2);
        assert!(matches!(result, Err(ForecastError::Inference { .. })));
    }

    #[test]
    fn test_model_panic_is_inference_error() {
        let scaler = scaler();
        let model = DriftModel { step: 0.0 };
        // DriftModel asserts a 3-value window
        let forecaster = Forecaster::new(&model, &scaler).with_window_length(4);

        let result = forecaster.forecast(&[0.5; 4], 1);
        assert!(matches!(result, Err(ForecastError::Inference { .. })));
    }
}
