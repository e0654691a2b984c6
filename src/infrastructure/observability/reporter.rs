//! Push-based metrics reporter for Stockcast
//!
//! Periodically writes metrics as prefixed JSON lines, to stderr unless another
//! writer is supplied, so stdout stays reserved for command output.
//!
//! **Security**: This system only SENDS data, never accepts requests.

use crate::infrastructure::observability::metrics::{Metrics, OUTCOME_NO_RESULT, OUTCOME_SUCCESS};
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub forecasts: ForecastSnapshot,
}

#[derive(Serialize)]
pub struct ForecastSnapshot {
    pub succeeded: u64,
    pub no_result: u64,
    pub data_source: String,
}

/// Push-based metrics reporter
///
/// Outputs metrics as structured JSON logs on a configurable interval.
/// No HTTP server, no incoming connections - only outbound data.
pub struct MetricsReporter {
    metrics: Metrics,
    data_source: String,
    start_time: Instant,
    interval: Duration,
    sink: Box<dyn Write + Send>,
}

impl MetricsReporter {
    /// * `interval_seconds` - How often to output metrics (default: 60)
    pub fn new(metrics: Metrics, data_source: impl Into<String>, interval_seconds: u64) -> Self {
        Self {
            metrics,
            data_source: data_source.into(),
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
            sink: Box::new(io::stderr()),
        }
    }

    /// Sends snapshot lines to `sink` instead of stderr.
    pub fn with_writer(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Writes one `METRICS_JSON:` line and returns the snapshot it contained.
    pub fn report(&mut self) -> io::Result<MetricsSnapshot> {
        let snapshot = self.collect_snapshot();
        let json = serde_json::to_string(&snapshot).map_err(io::Error::other)?;
        // Prefixed so log shippers can filter it
        writeln!(self.sink, "METRICS_JSON:{}", json)?;
        self.sink.flush()?;
        Ok(snapshot)
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(mut self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            match self.report() {
                Ok(snapshot) => info!(
                    "Forecasts: {} ok | {} no result | Uptime: {}s",
                    snapshot.forecasts.succeeded,
                    snapshot.forecasts.no_result,
                    snapshot.uptime_seconds
                ),
                Err(e) => warn!("Failed to write metrics: {}", e),
            }
        }
    }

    /// Collect current metrics snapshot
    pub fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        self.metrics.uptime_seconds.set(uptime as f64);

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            forecasts: ForecastSnapshot {
                succeeded: self.metrics.forecast_count(OUTCOME_SUCCESS),
                no_result: self.metrics.forecast_count(OUTCOME_NO_RESULT),
                data_source: self.data_source.clone(),
            },
        }
    }
}
