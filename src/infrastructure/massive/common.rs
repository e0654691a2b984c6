use crate::domain::errors::MarketDataError;
use crate::domain::types::{BarInterval, PriceBar, round_to};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Response statuses that carry usable data. The free tier answers `DELAYED`.
pub const ACCEPTED_STATUSES: [&str; 2] = ["OK", "DELAYED"];

pub const BAR_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct AggregateBar {
    /// Bar start, epoch milliseconds
    #[serde(rename = "t", default)]
    pub timestamp: i64,
    #[serde(rename = "o", default)]
    pub open: f64,
    #[serde(rename = "h", default)]
    pub high: f64,
    #[serde(rename = "l", default)]
    pub low: f64,
    #[serde(rename = "c", default)]
    pub close: f64,
    #[serde(rename = "v", default)]
    pub volume: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregatesResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "resultsCount", default)]
    pub results_count: Option<u64>,
    #[serde(default)]
    pub results: Option<Vec<AggregateBar>>,
}

/// `(multiplier, timespan)` path segments for an aggregates request
pub fn interval_segments(interval: BarInterval) -> (u32, &'static str) {
    match interval {
        BarInterval::Daily => (1, "day"),
        BarInterval::Weekly => (1, "week"),
        BarInterval::Monthly => (1, "month"),
    }
}

/// Converts an aggregates payload into ascending price bars.
///
/// Bars without a timestamp are dropped. A missing or empty `results` array is
/// an empty history, not an error.
pub fn parse_aggregates(
    symbol: &str,
    response: AggregatesResponse,
) -> Result<Vec<PriceBar>, MarketDataError> {
    let status = response.status.unwrap_or_default();
    if !ACCEPTED_STATUSES.contains(&status.as_str()) {
        return Err(MarketDataError::InvalidResponse {
            symbol: symbol.to_string(),
            status,
        });
    }

    let bars = response
        .results
        .unwrap_or_default()
        .into_iter()
        .filter(|bar| bar.timestamp != 0)
        .filter_map(|bar| {
            let date = DateTime::from_timestamp_millis(bar.timestamp)?;
            Some(PriceBar {
                date: date.format(BAR_DATE_FORMAT).to_string(),
                open: round_to(bar.open, 2),
                high: round_to(bar.high, 2),
                low: round_to(bar.low, 2),
                close: round_to(bar.close, 2),
                volume: bar.volume.max(0.0) as u64,
            })
        })
        .collect();

    Ok(bars)
}
