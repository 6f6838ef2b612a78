//! Capture orchestrator - drives a session from start to flush.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use capture::{CaptureSession, MockDevice, MockDeviceConfig};
use contracts::CaptureBlueprint;
use frame_archive::FrameSet;
use tracing::{debug, info, warn};

use super::RunStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capture configuration
    pub blueprint: CaptureBlueprint,

    /// Framesets to consume after warm-up (None = unlimited)
    pub max_framesets: Option<u64>,

    /// Stop after this long (None = no timeout)
    pub timeout: Option<Duration>,

    /// Mock device rate override
    pub frequency_hz: Option<f64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main capture orchestrator
pub struct CapturePipeline {
    config: PipelineConfig,
}

impl CapturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the capture to completion
    pub async fn run(self) -> Result<RunStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let blueprint = &self.config.blueprint;
        let device = MockDevice::new(MockDeviceConfig {
            frequency_hz: self.config.frequency_hz,
            ..MockDeviceConfig::new(blueprint.stream_modes())
        });
        info!(
            streams = blueprint.streams.len(),
            frequency_hz = ?self.config.frequency_hz,
            "Running with mock device"
        );

        let mut session = CaptureSession::new(blueprint, Box::new(device));
        session.start().map_err(CliError::from)?;

        let warmup_framesets = session
            .warm_up()
            .await
            .map_err(CliError::from)
            .context("Warm-up failed")?;
        info!(framesets = warmup_framesets, "Warm-up complete");

        let start_time = Instant::now();
        let mut framesets = 0u64;
        let mut aggregator = observability::CaptureMetricsAggregator::new();
        let consuming = consume(
            &session,
            self.config.max_framesets,
            &mut framesets,
            &mut aggregator,
        );
        let finished = match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, consuming).await.ok(),
            None => Some(consuming.await),
        };
        match finished {
            Some(result) => result?,
            None => warn!(
                timeout_secs = self.config.timeout.map(|t| t.as_secs_f64()),
                framesets, "Capture timed out"
            ),
        }
        let duration = start_time.elapsed();

        let archive = session.archive_stats();
        let capture = session.metrics();
        session.stop();

        aggregator.record_dropped(capture.framesets_dropped);

        let stats = RunStats {
            framesets,
            warmup_framesets,
            duration,
            capture,
            archive,
            aggregator,
        };

        info!(
            framesets = stats.framesets,
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Capture shutdown complete"
        );

        Ok(stats)
    }
}

/// Consume framesets until the limit is reached or the device stops.
///
/// Counts land in the caller's accumulators so a cancelled run keeps them.
async fn consume(
    session: &CaptureSession,
    max_framesets: Option<u64>,
    framesets: &mut u64,
    aggregator: &mut observability::CaptureMetricsAggregator,
) -> Result<()> {
    loop {
        let set = match session.wait_for_frames().await {
            Ok(set) => set,
            Err(capture::CaptureError::ChannelClosed) => {
                info!("Device stopped delivering framesets");
                break;
            }
            Err(e) => return Err(CliError::from(e).into()),
        };

        account(aggregator, &set);
        *framesets += 1;
        debug!(
            framesets = *framesets,
            queued = session.queued(),
            "Frameset consumed"
        );
        drop(set);

        if max_framesets.is_some_and(|max| *framesets >= max) {
            info!(framesets = *framesets, "Reached frameset limit");
            break;
        }
    }

    Ok(())
}

fn account(aggregator: &mut observability::CaptureMetricsAggregator, set: &FrameSet) {
    aggregator.record_frameset();
    for (stream, frame) in set.iter() {
        if let Some(meta) = frame.metadata() {
            aggregator.update_frame(stream, meta.timestamp, meta.frame_number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ArchiveSettings, CaptureSettings, ConfigVersion, PixelFormat, StreamConfig};

    fn blueprint() -> CaptureBlueprint {
        CaptureBlueprint {
            version: ConfigVersion::V1,
            archive: ArchiveSettings::default(),
            capture: CaptureSettings {
                warmup_frames: 2,
                queue_capacity: 4,
                frame_timeout_ms: 2000,
            },
            streams: vec![
                StreamConfig {
                    stream: contracts::StreamKind::Depth,
                    width: 4,
                    height: 4,
                    format: PixelFormat::Z16,
                    fps: 100,
                },
                StreamConfig {
                    stream: contracts::StreamKind::Color,
                    width: 4,
                    height: 4,
                    format: PixelFormat::Rgb8,
                    fps: 100,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_pipeline_consumes_limit() {
        let pipeline = CapturePipeline::new(PipelineConfig {
            blueprint: blueprint(),
            max_framesets: Some(5),
            timeout: Some(Duration::from_secs(10)),
            frequency_hz: Some(200.0),
            metrics_port: None,
        });

        let stats = pipeline.run().await.unwrap();
        assert_eq!(stats.framesets, 5);
        assert_eq!(stats.warmup_framesets, 2);
        assert!(stats.capture.packets_received >= 14);
        assert_eq!(stats.aggregator.total_framesets, 5);
        assert_eq!(stats.archive.invalid_handles, 0);
    }

    #[tokio::test]
    async fn test_timeout_keeps_consumed_framesets() {
        let pipeline = CapturePipeline::new(PipelineConfig {
            blueprint: blueprint(),
            max_framesets: None,
            timeout: Some(Duration::from_millis(400)),
            frequency_hz: Some(200.0),
            metrics_port: None,
        });

        let stats = pipeline.run().await.unwrap();
        assert!(stats.framesets > 0);
        assert_eq!(stats.aggregator.total_framesets, stats.framesets);
        assert!(stats.duration >= Duration::from_millis(400));
    }
}
