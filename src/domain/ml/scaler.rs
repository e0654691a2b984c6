use crate::domain::errors::ForecastError;

/// Reversible min-max normalisation onto `[0, 1]`.
///
/// Fit once over the full closing-price history of a request and used for
/// both encoding inputs and decoding model outputs of that request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::Scaling {
                reason: "series is empty".to_string(),
            });
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ForecastError::Scaling {
                reason: format!("series contains non-finite value {}", bad),
            });
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max == min {
            return Err(ForecastError::Scaling {
                reason: format!("constant series (all values equal {})", min),
            });
        }

        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn encode(&self, price: f64) -> f64 {
        (price - self.min) / (self.max - self.min)
    }

    pub fn decode(&self, scaled: f64) -> f64 {
        scaled * (self.max - self.min) + self.min
    }

    pub fn transform(&self, prices: &[f64]) -> Vec<f64> {
        prices.iter().map(|&p| self.encode(p)).collect()
    }
}
