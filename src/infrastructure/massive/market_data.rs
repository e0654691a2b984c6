use super::common::{AggregatesResponse, interval_segments, parse_aggregates};
use crate::domain::errors::MarketDataError;
use crate::domain::ports::HistoricalDataProvider;
use crate::domain::types::{BarInterval, HistoryPeriod, PriceBar, Quote};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use crate::infrastructure::core::rate_limiter::RateLimiter;
use crate::infrastructure::observability::Metrics;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
pub const FREE_TIER_CALLS_PER_MINUTE: usize = 5;

/// Pause before the single retry after an HTTP 429.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(15);

/// Daily aggregates from the Massive (Polygon-compatible) REST API.
pub struct MassiveDataProvider {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    rate_limiter: RateLimiter,
    rate_limit_backoff: Duration,
    metrics: Option<Metrics>,
}

impl MassiveDataProvider {
    pub fn builder() -> MassiveDataProviderBuilder {
        MassiveDataProviderBuilder::default()
    }

    fn aggregates_url(&self, symbol: &str, period: HistoryPeriod, interval: BarInterval) -> String {
        let to = Utc::now();
        let from = to - ChronoDuration::days(period.days());
        let (multiplier, timespan) = interval_segments(interval);

        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            symbol,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        build_url_with_query(
            &url,
            &[
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "5000"),
                ("apiKey", self.api_key.as_str()),
            ],
        )
    }

    fn prev_close_url(&self, symbol: &str) -> String {
        let url = format!(
            "{}/v2/aggs/ticker/{}/prev",
            self.base_url.trim_end_matches('/'),
            symbol
        );
        build_url_with_query(
            &url,
            &[("adjusted", "true"), ("apiKey", self.api_key.as_str())],
        )
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        self.rate_limiter.acquire().await;
        self.client
            .get(url)
            .send()
            .await
            .context("Failed to fetch aggregates from Massive")
    }

    /// One rate-limited request, with a single retry after a 429 backoff.
    async fn fetch_aggregates(&self, symbol: &str, url: &str) -> Result<Vec<PriceBar>> {
        let mut response = self.send(url).await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            self.record("rate_limited");
            warn!(
                "MassiveDataProvider: Rate limit hit for {}. Waiting {:?}...",
                symbol, self.rate_limit_backoff
            );
            tokio::time::sleep(self.rate_limit_backoff).await;
            response = self.send(url).await?;
        }

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            self.record("rate_limited");
            return Err(MarketDataError::RateLimited {
                retry_after_secs: self.rate_limit_backoff.as_secs(),
            }
            .into());
        }
        if !status.is_success() {
            self.record("http_error");
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "MassiveDataProvider: API error {} for {}: {}",
                status, symbol, error_text
            );
            anyhow::bail!("Massive API error ({}): {}", status, error_text);
        }

        let body: AggregatesResponse = response
            .json()
            .await
            .context("Failed to parse aggregates response")?;
        debug!(
            "MassiveDataProvider: {} status={:?} results={:?}",
            symbol, body.status, body.results_count
        );

        let bars = parse_aggregates(symbol, body).inspect_err(|_| self.record("invalid"))?;
        self.record("ok");
        Ok(bars)
    }

    fn record(&self, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_provider_requests("massive", status);
        }
    }
}

#[async_trait]
impl HistoricalDataProvider for MassiveDataProvider {
    async fn get_historical_data(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        interval: BarInterval,
    ) -> Result<Vec<PriceBar>> {
        if self.api_key.is_empty() {
            return Err(MarketDataError::MissingApiKey.into());
        }

        let url = self.aggregates_url(symbol, period, interval);
        debug!(
            "MassiveDataProvider: Requesting {} {} bars for {}",
            period, interval, symbol
        );

        let bars = self.fetch_aggregates(symbol, &url).await?;
        info!("MassiveDataProvider: Processed {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    /// Previous session from the `/prev` endpoint, which the free tier serves.
    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        if self.api_key.is_empty() {
            return Err(MarketDataError::MissingApiKey.into());
        }

        let url = self.prev_close_url(symbol);
        debug!("MassiveDataProvider: Requesting previous close for {}", symbol);
        let bars = self.fetch_aggregates(symbol, &url).await?;
        Ok(bars.last().map(|bar| Quote::from_bar(symbol, bar)))
    }

    fn name(&self) -> &str {
        "massive"
    }
}

#[derive(Default)]
pub struct MassiveDataProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    max_calls_per_minute: Option<usize>,
    rate_limit_backoff: Option<Duration>,
    metrics: Option<Metrics>,
}

impl MassiveDataProviderBuilder {
    pub fn api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn max_calls_per_minute(mut self, calls: usize) -> Self {
        self.max_calls_per_minute = Some(calls);
        self
    }

    pub fn rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = Some(backoff);
        self
    }

    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> MassiveDataProvider {
        MassiveDataProvider {
            client: HttpClientFactory::create_client(),
            api_key: self.api_key.unwrap_or_default(),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            rate_limiter: RateLimiter::per_minute(
                self.max_calls_per_minute
                    .unwrap_or(FREE_TIER_CALLS_PER_MINUTE),
            ),
            rate_limit_backoff: self.rate_limit_backoff.unwrap_or(RATE_LIMIT_BACKOFF),
            metrics: self.metrics,
        }
    }
}
