pub mod forecaster;
pub mod layers;
pub mod lstm_regressor;
pub mod optimizer;
pub mod pipeline;
pub mod predictor;
pub mod trainer;

pub use forecaster::Forecaster;
pub use lstm_regressor::{LstmRegressorConfig, StackedLstmRegressor};
pub use pipeline::{ForecastSettings, run_forecast, run_forecast_with_report, run_training};
pub use predictor::{FitParams, FitReport, SequenceRegressionModel};
pub use trainer::{TrainedModel, Trainer, TrainingReport};
