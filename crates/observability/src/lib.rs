//! # Observability
//!
//! Tracing + Prometheus metrics.
//!
//! ## Features
//!
//! - Formatting layers for tracing (JSON/Pretty/Compact)
//! - Prometheus exporter
//! - Frame archive metric names and a capture summary aggregator
//!
//! ## Example
//!
//! ```ignore
//! tracing_subscriber::registry()
//!     .with(observability::fmt_layer(LogFormat::Compact))
//!     .with(EnvFilter::new("info"))
//!     .try_init()?;
//! observability::init_metrics_only(9000)?;
//!
//! let frame = archive.track_frame(StreamKind::Color)?;
//! observability::record_frame_published(StreamKind::Color);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, Layer, Registry};

pub use crate::metrics::{
    record_buffer_acquired, record_buffer_discarded, record_frame_latency_ms,
    record_frame_published, record_frame_released, record_frameset_delivered,
    record_frameset_dropped, record_freelist_depth, record_invalid_handle, record_pool_exhausted,
    CaptureMetricsAggregator, CaptureSummary, RunningStats, StatsSummary, StreamMetrics,
    StreamSummary,
};

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs
    #[default]
    Json,
    /// Human-readable multi-line
    Pretty,
    /// Compact single line
    Compact,
}

/// Formatting layer for the given log format.
pub fn fmt_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    }
}

/// Install the Prometheus exporter.
///
/// Tracing is set up by the binary, which stacks [`fmt_layer`] with its own filter.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_fmt_layer_for_every_format() {
        for format in [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact] {
            let subscriber = tracing_subscriber::registry().with(fmt_layer(format));
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(format = ?format, "formatted");
            });
        }
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }

    #[test]
    fn test_metric_recorders_without_exporter() {
        // Recording without an installed recorder is a no-op
        record_frame_published(contracts::StreamKind::Color);
        record_pool_exhausted("frames");
        record_freelist_depth(3);
    }
}
