//! Push-based observability for Stockcast
//!
//! This module provides observability through **outbound data only** - no HTTP server,
//! no incoming requests. Metrics are pushed as periodic structured JSON lines on
//! stdout (for Loki, Fluentd, CloudWatch).

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::MetricsReporter;
