use crate::domain::types::{BarInterval, HistoryPeriod, PriceBar, Quote};
use anyhow::Result;
use async_trait::async_trait;

/// Source of historical daily bars.
///
/// Implementations return bars in ascending date order. An empty vector means
/// the upstream had nothing for the symbol; rate limiting is the provider's
/// own concern.
#[async_trait]
pub trait HistoricalDataProvider: Send + Sync {
    async fn get_historical_data(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        interval: BarInterval,
    ) -> Result<Vec<PriceBar>>;

    /// Most recent session for `symbol`, or `None` when the upstream has nothing.
    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let bars = self
            .get_historical_data(symbol, HistoryPeriod::FiveDays, BarInterval::Daily)
            .await?;
        Ok(bars.last().map(|bar| Quote::from_bar(symbol, bar)))
    }

    fn name(&self) -> &str;
}
