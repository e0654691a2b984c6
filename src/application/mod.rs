// Sequence model, training and autoregressive forecasting
pub mod ml;

// Request orchestration
pub mod forecast_service;

pub use forecast_service::{ForecastService, TrainingOutcome};
