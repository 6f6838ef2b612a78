//! Frame archive and capture metrics.
//!
//! Thin wrappers over the `metrics` facade so metric names live in one place,
//! plus an in-memory aggregator used for end-of-run summaries.

use std::collections::BTreeMap;

use contracts::StreamKind;
use metrics::{counter, gauge, histogram};

/// Record a frame moved into the frame pool
pub fn record_frame_published(stream: StreamKind) {
    counter!(
        "frame_archive_frames_published_total",
        "stream" => stream.as_str()
    )
    .increment(1);
}

/// Record a frame whose last observer released it
pub fn record_frame_released(stream: StreamKind) {
    counter!(
        "frame_archive_frames_released_total",
        "stream" => stream.as_str()
    )
    .increment(1);
}

/// Record where a backbuffer's storage came from
pub fn record_buffer_acquired(stream: StreamKind, reused: bool) {
    let source = if reused { "freelist" } else { "allocated" };
    counter!(
        "frame_archive_buffers_total",
        "stream" => stream.as_str(),
        "source" => source
    )
    .increment(1);
}

/// Record a retired buffer dropped instead of being kept for reuse
pub fn record_buffer_discarded(reason: &'static str) {
    counter!("frame_archive_buffers_discarded_total", "reason" => reason).increment(1);
}

/// Record a fixed pool refusing an allocation
pub fn record_pool_exhausted(pool: &'static str) {
    counter!("frame_archive_pool_exhausted_total", "pool" => pool).increment(1);
}

/// Record an operation on a handle the archive does not own
pub fn record_invalid_handle(pool: &'static str) {
    counter!("frame_archive_invalid_handle_total", "pool" => pool).increment(1);
}

/// Record current freelist depth
pub fn record_freelist_depth(depth: usize) {
    gauge!("frame_archive_freelist_depth").set(depth as f64);
}

/// Record a frameset handed to the consumer queue
pub fn record_frameset_delivered() {
    counter!("frame_archive_framesets_delivered_total").increment(1);
}

/// Record a frameset dropped because the consumer queue was full
pub fn record_frameset_dropped() {
    counter!("frame_archive_framesets_dropped_total").increment(1);
}

/// Record the time a frame spent between arrival and consumption
pub fn record_frame_latency_ms(stream: StreamKind, latency_ms: f64) {
    histogram!(
        "frame_archive_frame_latency_ms",
        "stream" => stream.as_str()
    )
    .record(latency_ms);
}

/// Per-stream capture statistics
#[derive(Debug, Clone, Default)]
pub struct StreamMetrics {
    /// Frames observed
    pub frames: u64,

    /// Frames missing according to the device frame counter
    pub skipped: u64,

    /// Device timestamp delta between consecutive frames (ms)
    pub interval_ms: RunningStats,

    last_timestamp: Option<i64>,
    last_frame_number: Option<u64>,
}

/// Capture metrics aggregator
///
/// Aggregates in memory for end-of-run summaries.
#[derive(Debug, Clone, Default)]
pub struct CaptureMetricsAggregator {
    /// Framesets consumed
    pub total_framesets: u64,

    /// Framesets dropped by backpressure
    pub dropped_framesets: u64,

    /// Per-stream statistics
    pub streams: BTreeMap<StreamKind, StreamMetrics>,
}

impl CaptureMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one consumed frame
    pub fn update_frame(&mut self, stream: StreamKind, timestamp: i64, frame_number: u64) {
        let entry = self.streams.entry(stream).or_default();
        entry.frames += 1;

        if let Some(last) = entry.last_timestamp {
            entry.interval_ms.push(timestamp.saturating_sub(last) as f64);
        }
        if let Some(last) = entry.last_frame_number {
            if frame_number > last.saturating_add(1) {
                entry.skipped += frame_number - last - 1;
            }
        }

        entry.last_timestamp = Some(timestamp);
        entry.last_frame_number = Some(frame_number);
    }

    /// Account for one consumed frameset
    pub fn record_frameset(&mut self) {
        self.total_framesets += 1;
    }

    /// Account for framesets lost to backpressure
    pub fn record_dropped(&mut self, count: u64) {
        self.dropped_framesets += count;
    }

    /// Build a summary report
    pub fn summary(&self) -> CaptureSummary {
        let offered = self.total_framesets + self.dropped_framesets;
        CaptureSummary {
            total_framesets: self.total_framesets,
            dropped_framesets: self.dropped_framesets,
            drop_rate: if offered > 0 {
                self.dropped_framesets as f64 / offered as f64 * 100.0
            } else {
                0.0
            },
            streams: self
                .streams
                .iter()
                .map(|(stream, m)| {
                    (
                        *stream,
                        StreamSummary {
                            frames: m.frames,
                            skipped: m.skipped,
                            interval_ms: StatsSummary::from(&m.interval_ms),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-stream summary
#[derive(Debug, Clone, Default)]
pub struct StreamSummary {
    pub frames: u64,
    pub skipped: u64,
    pub interval_ms: StatsSummary,
}

/// Capture summary
#[derive(Debug, Clone, Default)]
pub struct CaptureSummary {
    pub total_framesets: u64,
    pub dropped_framesets: u64,
    pub drop_rate: f64,
    pub streams: BTreeMap<StreamKind, StreamSummary>,
}

impl std::fmt::Display for CaptureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Summary ===")?;
        writeln!(f, "Framesets: {}", self.total_framesets)?;
        writeln!(
            f,
            "Dropped framesets: {} ({:.2}%)",
            self.dropped_framesets, self.drop_rate
        )?;
        for (stream, summary) in &self.streams {
            writeln!(
                f,
                "  {}: frames={}, skipped={}, interval_ms: {}",
                stream, summary.frames, summary.skipped, summary.interval_ms
            )?;
        }
        Ok(())
    }
}

/// Summary of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_intervals_and_skips() {
        let mut aggregator = CaptureMetricsAggregator::new();

        aggregator.update_frame(StreamKind::Color, 100, 1);
        aggregator.update_frame(StreamKind::Color, 133, 2);
        aggregator.update_frame(StreamKind::Color, 200, 4);
        aggregator.record_frameset();

        let color = &aggregator.streams[&StreamKind::Color];
        assert_eq!(color.frames, 3);
        assert_eq!(color.skipped, 1);
        assert_eq!(color.interval_ms.count(), 2);
        assert!((color.interval_ms.mean() - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_extreme_counters_do_not_overflow() {
        let mut aggregator = CaptureMetricsAggregator::new();

        aggregator.update_frame(StreamKind::Depth, i64::MIN, u64::MAX);
        aggregator.update_frame(StreamKind::Depth, i64::MAX, u64::MAX);
        aggregator.update_frame(StreamKind::Depth, 0, 0);

        let depth = &aggregator.streams[&StreamKind::Depth];
        assert_eq!(depth.frames, 3);
        assert_eq!(depth.skipped, 0);
        assert_eq!(depth.interval_ms.count(), 2);
    }

    #[test]
    fn test_summary_drop_rate() {
        let mut aggregator = CaptureMetricsAggregator::new();
        for _ in 0..3 {
            aggregator.record_frameset();
        }
        aggregator.record_dropped(1);

        let summary = aggregator.summary();
        assert_eq!(summary.total_framesets, 3);
        assert!((summary.drop_rate - 25.0).abs() < 1e-10);

        let output = format!("{}", summary);
        assert!(output.contains("Framesets: 3"));
        assert!(output.contains("25.00%"));
    }
}
