//! Prometheus metrics definitions for Stockcast
//!
//! All metrics use the `stockcast_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

pub const OUTCOME_SUCCESS: &str = "success";
pub const OUTCOME_NO_RESULT: &str = "no_result";

/// Prometheus metrics for the forecasting service
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Forecast requests by outcome (success / no_result)
    pub forecasts_total: CounterVec,
    /// Failed requests by error kind
    pub forecast_failures_total: CounterVec,
    /// Model fitting time in seconds, by mode (forecast / standalone)
    pub training_duration_seconds: HistogramVec,
    /// Confidence of the last forecast per symbol
    pub forecast_confidence: GenericGaugeVec<AtomicF64>,
    /// Historical data requests by provider and status
    pub provider_requests_total: CounterVec,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let forecasts_total = CounterVec::new(
            Opts::new("stockcast_forecasts_total", "Forecast requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(forecasts_total.clone()))?;

        let forecast_failures_total = CounterVec::new(
            Opts::new(
                "stockcast_forecast_failures_total",
                "Forecast failures by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(forecast_failures_total.clone()))?;

        let training_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "stockcast_training_duration_seconds",
                "Model fitting time in seconds",
            )
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
            &["mode"],
        )?;
        registry.register(Box::new(training_duration_seconds.clone()))?;

        let forecast_confidence = GaugeVec::new(
            Opts::new(
                "stockcast_forecast_confidence",
                "Confidence of the most recent forecast per symbol (50-95)",
            ),
            &["symbol"],
        )?;
        registry.register(Box::new(forecast_confidence.clone()))?;

        let provider_requests_total = CounterVec::new(
            Opts::new(
                "stockcast_provider_requests_total",
                "Historical data requests by provider and status",
            ),
            &["provider", "status"],
        )?;
        registry.register(Box::new(provider_requests_total.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "stockcast_uptime_seconds",
            "Process uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            forecasts_total,
            forecast_failures_total,
            training_duration_seconds,
            forecast_confidence,
            provider_requests_total,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn record_success(&self, symbol: &str, confidence: f64) {
        self.forecasts_total
            .with_label_values(&[OUTCOME_SUCCESS])
            .inc();
        self.forecast_confidence
            .with_label_values(&[symbol])
            .set(confidence);
    }

    /// Record a "no result" outcome under its error kind
    pub fn record_failure(&self, kind: &str) {
        self.forecasts_total
            .with_label_values(&[OUTCOME_NO_RESULT])
            .inc();
        self.forecast_failures_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn observe_training(&self, mode: &str, seconds: f64) {
        self.training_duration_seconds
            .with_label_values(&[mode])
            .observe(seconds);
    }

    pub fn inc_provider_requests(&self, provider: &str, status: &str) {
        self.provider_requests_total
            .with_label_values(&[provider, status])
            .inc();
    }

    pub fn forecast_count(&self, outcome: &str) -> u64 {
        self.forecasts_total.with_label_values(&[outcome]).get() as u64
    }
}
