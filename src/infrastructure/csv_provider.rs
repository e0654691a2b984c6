use crate::domain::ports::HistoricalDataProvider;
use crate::domain::types::{BarInterval, HistoryPeriod, PriceBar};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads daily bars from `<dir>/<SYMBOL>.csv` with the header
/// `date,open,high,low,close,volume`.
///
/// The period is measured back from the newest bar in the file rather than
/// from today, so archived files stay usable.
pub struct CsvDataProvider {
    data_dir: PathBuf,
}

impl CsvDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn read_bars(path: &Path) -> Result<Vec<PriceBar>> {
        let mut rdr = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut bars = Vec::new();
        for (line, record) in rdr.deserialize::<PriceBar>().enumerate() {
            let bar = record.with_context(|| {
                format!("Malformed row {} in {}", line + 2, path.display())
            })?;
            bars.push(bar);
        }
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(bars)
    }
}

fn bar_day(bar: &PriceBar) -> Option<NaiveDate> {
    bar.date
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

/// Keeps bars within `period` of the newest bar. Undated rows are kept.
fn trim_to_period(bars: Vec<PriceBar>, period: HistoryPeriod) -> Vec<PriceBar> {
    let Some(newest) = bars.iter().rev().find_map(bar_day) else {
        return bars;
    };
    let cutoff = newest - Duration::days(period.days());
    bars.into_iter()
        .filter(|bar| bar_day(bar).is_none_or(|day| day > cutoff))
        .collect()
}

#[async_trait]
impl HistoricalDataProvider for CsvDataProvider {
    async fn get_historical_data(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        interval: BarInterval,
    ) -> Result<Vec<PriceBar>> {
        if interval != BarInterval::Daily {
            anyhow::bail!("CSV data is daily only, {} bars requested", interval);
        }

        let path = self.path_for(symbol);
        if !path.exists() {
            warn!("CsvDataProvider: No file for {} at {}", symbol, path.display());
            return Ok(Vec::new());
        }

        let bars = tokio::task::spawn_blocking(move || Self::read_bars(&path))
            .await
            .context("CSV reader task failed")??;
        let bars = trim_to_period(bars, period);
        debug!("CsvDataProvider: Loaded {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stockcast-csv-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: date.to_string(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    #[tokio::test]
    async fn test_reads_and_sorts_file() {
        let dir = temp_dir("read");
        fs::write(
            dir.join("AAPL.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-03 00:00:00,2,2,2,2.5,10\n\
             2024-01-02 00:00:00,1,1,1,1.5,20\n",
        )
        .unwrap();

        let provider = CsvDataProvider::new(&dir);
        let bars = provider
            .get_historical_data("aapl", HistoryPeriod::TwoYears, BarInterval::Daily)
            .await
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.5);
        assert_eq!(bars[1].volume, 10);
        fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_history() {
        let provider = CsvDataProvider::new(temp_dir("missing"));
        let bars = provider
            .get_historical_data("NOPE", HistoryPeriod::OneYear, BarInterval::Daily)
            .await
            .unwrap();
        assert!(bars.is_empty());
    }

    #[tokio::test]
    async fn test_weekly_interval_is_rejected() {
        let provider = CsvDataProvider::new(temp_dir("weekly"));
        let result = provider
            .get_historical_data("AAPL", HistoryPeriod::OneYear, BarInterval::Weekly)
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_trim_is_relative_to_newest_bar() {
        let bars = vec![
            bar("2020-01-01", 1.0),
            bar("2023-06-01", 2.0),
            bar("2024-01-01", 3.0),
        ];
        let trimmed = trim_to_period(bars, HistoryPeriod::OneYear);
        let closes: Vec<f64> = trimmed.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![2.0, 3.0]);
    }
}
