//! Heuristic confidence, trend and recommendation for a finished forecast.
//!
//! Confidence penalises divergence between the near-term forecast and the last
//! observed close; it is not a statistical interval.

use crate::domain::errors::ForecastError;
use crate::domain::types::{Recommendation, Trend};

pub const MIN_CONFIDENCE: f64 = 50.0;
pub const MAX_CONFIDENCE: f64 = 95.0;
const BASE_CONFIDENCE: f64 = 90.0;
const DIVERGENCE_PENALTY: f64 = 2.0;

/// Relative move of the first forecast day that separates a trend from noise.
const TREND_BAND: f64 = 0.01;

const LOW_CONFIDENCE_THRESHOLD: f64 = 60.0;
const STRONG_CONFIDENCE_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceAssessment {
    pub three_day_average: f64,
    pub confidence: f64,
    pub trend: Trend,
    pub recommendation: Recommendation,
}

pub fn assess(predictions: &[f64], current_price: f64) -> Result<ConfidenceAssessment, ForecastError> {
    let first = predictions
        .first()
        .copied()
        .ok_or_else(|| ForecastError::inference("no predictions to assess"))?;

    let three_day_average = near_term_average(predictions);
    let confidence = confidence_score(three_day_average, current_price);
    let trend = classify_trend(first, current_price);

    Ok(ConfidenceAssessment {
        three_day_average,
        confidence,
        trend,
        recommendation: recommend(trend, confidence),
    })
}

/// Mean of the first three predictions, or of all of them when fewer exist.
pub fn near_term_average(predictions: &[f64]) -> f64 {
    let head = &predictions[..predictions.len().min(3)];
    if head.is_empty() {
        return 0.0;
    }
    head.iter().sum::<f64>() / head.len() as f64
}

pub fn confidence_score(three_day_average: f64, current_price: f64) -> f64 {
    let percent_diff = ((three_day_average - current_price) / current_price * 100.0).abs();
    if !percent_diff.is_finite() {
        return MIN_CONFIDENCE;
    }
    (BASE_CONFIDENCE - percent_diff * DIVERGENCE_PENALTY).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// The band edges count as a move: exactly +1% is bullish, exactly -1% bearish.
pub fn classify_trend(next_price: f64, current_price: f64) -> Trend {
    if next_price >= current_price * (1.0 + TREND_BAND) {
        Trend::Bullish
    } else if next_price <= current_price * (1.0 - TREND_BAND) {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

pub fn recommend(trend: Trend, confidence: f64) -> Recommendation {
    if confidence < LOW_CONFIDENCE_THRESHOLD {
        return Recommendation::HoldLowConfidence;
    }

    match trend {
        Trend::Bullish if confidence >= STRONG_CONFIDENCE_THRESHOLD => Recommendation::Buy,
        Trend::Bullish => Recommendation::ConsiderBuy,
        Trend::Bearish if confidence >= STRONG_CONFIDENCE_THRESHOLD => Recommendation::Sell,
        Trend::Bearish => Recommendation::ConsiderSell,
        Trend::Neutral => Recommendation::HoldStable,
    }
}
