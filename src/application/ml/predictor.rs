use crate::domain::errors::ForecastError;
use crate::domain::ml::Window;

/// Hyper-parameters of one `fit` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    pub epochs: usize,
    pub batch_size: usize,
}

/// Loss summary returned by `fit`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport {
    pub epochs_run: usize,
    pub train_loss: f64,
    pub validation_loss: f64,
}

/// Interface for sequence regression models: a window of scaled closes in,
/// the next scaled close out.
pub trait SequenceRegressionModel: Send {
    /// Fit on `train`, evaluating on `validation` after every epoch.
    fn fit(
        &mut self,
        train: &[Window],
        validation: &[Window],
        params: &FitParams,
    ) -> Result<FitReport, ForecastError>;

    /// Predict the scaled value that follows `window`.
    fn predict(&self, window: &[f64]) -> Result<f64, ForecastError>;

    /// Get model name/type
    fn name(&self) -> &str;
}
