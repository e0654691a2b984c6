use super::predictor::{FitParams, SequenceRegressionModel};
use crate::domain::errors::ForecastError;
use crate::domain::ml::{WINDOW_LENGTH, build_windows};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Minimum number of supervised windows required before fitting.
pub const MIN_TRAINING_WINDOWS: usize = 50;

/// Share of the most recent windows held out for validation.
pub const VALIDATION_FRACTION: f64 = 0.2;

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const FORECAST_EPOCHS: usize = 15;
pub const STANDALONE_EPOCHS: usize = 25;

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub model: String,
    pub epochs: usize,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub train_loss: f64,
    pub validation_loss: f64,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

/// A fitted model together with how it got there. Lives for one request.
pub struct TrainedModel<M> {
    pub model: M,
    pub report: TrainingReport,
}

#[derive(Debug, Clone, Copy)]
pub struct Trainer {
    epochs: usize,
    batch_size: usize,
    window_length: usize,
}

impl Trainer {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        Self {
            epochs,
            batch_size,
            window_length: WINDOW_LENGTH,
        }
    }

    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    /// Windows the scaled series, splits it chronologically 80/20 and fits a
    /// model produced by `build`.
    pub fn train<M, F>(&self, scaled: &[f64], build: F) -> Result<TrainedModel<M>, ForecastError>
    where
        M: SequenceRegressionModel,
        F: FnOnce() -> M,
    {
        let windows = build_windows(scaled, self.window_length)?;
        if windows.len() < MIN_TRAINING_WINDOWS {
            return Err(ForecastError::InsufficientWindows {
                available: windows.len(),
                required: MIN_TRAINING_WINDOWS,
            });
        }

        let split = (windows.len() as f64 * (1.0 - VALIDATION_FRACTION)) as usize;
        let (train, validation) = windows.split_at(split);
        debug!(
            "Trainer: {} windows -> {} train / {} validation",
            windows.len(),
            train.len(),
            validation.len()
        );

        let params = FitParams {
            epochs: self.epochs,
            batch_size: self.batch_size,
        };

        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut model = build();
            let fit = model.fit(train, validation, &params);
            fit.map(|report| (model, report))
        }));

        let (model, fit) = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                return Err(ForecastError::training(format!(
                    "numeric failure: {}",
                    panic_message(payload.as_ref())
                )));
            }
        };

        let report = TrainingReport {
            model: model.name().to_string(),
            epochs: fit.epochs_run,
            train_samples: train.len(),
            validation_samples: validation.len(),
            train_loss: fit.train_loss,
            validation_loss: fit.validation_loss,
            elapsed: started.elapsed(),
        };
        info!(
            "Trainer: {} fitted in {:?} (loss={:.6}, val_loss={:.6})",
            report.model, report.elapsed, report.train_loss, report.validation_loss
        );

        Ok(TrainedModel { model, report })
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
