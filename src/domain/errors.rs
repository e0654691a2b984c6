use thiserror::Error;

/// Errors raised by the forecasting pipeline.
///
/// Every variant is converted into a "no result" outcome at the service
/// boundary; callers that need the precise reason use the `try_*` entry points.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Cannot scale series: {reason}")]
    Scaling { reason: String },

    #[error("Insufficient history: got {available} closes, need at least {required}")]
    InsufficientHistory { available: usize, required: usize },

    #[error("Insufficient data after windowing: got {available} samples, need at least {required}")]
    InsufficientWindows { available: usize, required: usize },

    #[error("Error training model: {reason}")]
    Training { reason: String },

    #[error("Error during inference: {reason}")]
    Inference { reason: String },

    #[error("No historical data available for {symbol}: {reason}")]
    UpstreamDataUnavailable { symbol: String, reason: String },

    #[error("Days parameter must be between {min} and {max}, got {days}")]
    InvalidHorizon { days: usize, min: usize, max: usize },
}

impl ForecastError {
    /// Stable label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::Scaling { .. } => "scaling",
            ForecastError::InsufficientHistory { .. } => "insufficient_history",
            ForecastError::InsufficientWindows { .. } => "insufficient_windows",
            ForecastError::Training { .. } => "training",
            ForecastError::Inference { .. } => "inference",
            ForecastError::UpstreamDataUnavailable { .. } => "upstream_unavailable",
            ForecastError::InvalidHorizon { .. } => "invalid_horizon",
        }
    }

    pub fn training(reason: impl Into<String>) -> Self {
        ForecastError::Training {
            reason: reason.into(),
        }
    }

    pub fn inference(reason: impl Into<String>) -> Self {
        ForecastError::Inference {
            reason: reason.into(),
        }
    }
}

/// Errors related to market data and connectivity
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("MASSIVE_API_KEY not found. Set it in the environment or .env file")]
    MissingApiKey,

    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Unexpected response status for {symbol}: {status}")]
    InvalidResponse { symbol: String, status: String },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },
}
