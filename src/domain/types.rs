use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One daily OHLCV record as delivered by a historical data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Extracts the closing prices of an ascending bar series.
pub fn closing_prices(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInfo {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

/// Investment recommendation derived from trend and confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "HOLD – low confidence")]
    HoldLowConfidence,
    #[serde(rename = "BUY – strong upward trend")]
    Buy,
    #[serde(rename = "CONSIDER BUY – moderate upward trend")]
    ConsiderBuy,
    #[serde(rename = "SELL – strong downward trend")]
    Sell,
    #[serde(rename = "CONSIDER SELL – moderate downward trend")]
    ConsiderSell,
    #[serde(rename = "HOLD – stable price expected")]
    HoldStable,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Recommendation::HoldLowConfidence => "HOLD – low confidence",
            Recommendation::Buy => "BUY – strong upward trend",
            Recommendation::ConsiderBuy => "CONSIDER BUY – moderate upward trend",
            Recommendation::Sell => "SELL – strong downward trend",
            Recommendation::ConsiderSell => "CONSIDER SELL – moderate downward trend",
            Recommendation::HoldStable => "HOLD – stable price expected",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSummary {
    pub tomorrow: f64,
    pub three_day: f64,
    pub next_week: f64,
}

/// Outcome of one successful forecast request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub symbol: String,
    pub current_price: f64,
    pub predictions: PredictionSummary,
    pub all_predictions: Vec<f64>,
    pub confidence: f64,
    pub trend: Trend,
    pub recommendation: Recommendation,
    pub timestamp: DateTime<Utc>,
}

/// Latest session summary for one symbol, change measured from open to close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub date: String,
    pub current_price: f64,
    pub open: f64,
    pub change: f64,
    pub change_percent: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
}

impl Quote {
    pub fn from_bar(symbol: &str, bar: &PriceBar) -> Self {
        let change = bar.close - bar.open;
        let change_percent = if bar.open != 0.0 {
            change / bar.open * 100.0
        } else {
            0.0
        };

        Self {
            symbol: symbol.to_string(),
            date: bar.date.clone(),
            current_price: round_to(bar.close, 2),
            open: round_to(bar.open, 2),
            change: round_to(change, 2),
            change_percent: round_to(change_percent, 2),
            day_high: round_to(bar.high, 2),
            day_low: round_to(bar.low, 2),
            volume: bar.volume,
        }
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Look-back period requested from a historical data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPeriod {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    All,
}

impl HistoryPeriod {
    /// Calendar days covered by the period. `All` is capped at two years.
    pub fn days(&self) -> i64 {
        match self {
            HistoryPeriod::OneDay => 1,
            HistoryPeriod::FiveDays => 5,
            HistoryPeriod::OneMonth => 30,
            HistoryPeriod::ThreeMonths => 90,
            HistoryPeriod::SixMonths => 180,
            HistoryPeriod::OneYear => 365,
            HistoryPeriod::TwoYears | HistoryPeriod::All => 730,
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(HistoryPeriod::OneDay),
            "5d" => Ok(HistoryPeriod::FiveDays),
            "1mo" => Ok(HistoryPeriod::OneMonth),
            "3mo" => Ok(HistoryPeriod::ThreeMonths),
            "6mo" => Ok(HistoryPeriod::SixMonths),
            "1y" => Ok(HistoryPeriod::OneYear),
            "2y" => Ok(HistoryPeriod::TwoYears),
            "ALL" | "all" => Ok(HistoryPeriod::All),
            _ => anyhow::bail!(
                "Invalid period: {}. Must be one of 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, ALL",
                s
            ),
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::All => "ALL",
        };
        f.write_str(label)
    }
}

/// Bar granularity requested from a historical data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarInterval {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for BarInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(BarInterval::Daily),
            "1wk" => Ok(BarInterval::Weekly),
            "1mo" => Ok(BarInterval::Monthly),
            _ => anyhow::bail!("Invalid interval: {}. Must be '1d', '1wk' or '1mo'", s),
        }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarInterval::Daily => write!(f, "1d"),
            BarInterval::Weekly => write!(f, "1wk"),
            BarInterval::Monthly => write!(f, "1mo"),
        }
    }
}
