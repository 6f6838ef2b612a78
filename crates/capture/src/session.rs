//! Capture session
//!
//! Wires a device to a frame archive: every packet is copied into a
//! backbuffer, published, and handed to the syncer. Completed framesets go
//! to a bounded queue; when the consumer falls behind the newest set is
//! dropped.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{CaptureBlueprint, CaptureSettings, DevicePacket, DeviceSource};
use frame_archive::{ArchiveHandle, ArchiveStats, FrameArchive, FrameRef, FrameSet};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{CaptureMetrics, MetricsSnapshot};
use crate::error::{CaptureError, Result};
use crate::syncer::FrameSyncer;

/// Capture session
pub struct CaptureSession {
    device: Box<dyn DeviceSource>,
    archive: Arc<Mutex<FrameArchive>>,
    handle: ArchiveHandle,
    syncer: Arc<FrameSyncer>,
    rx: Receiver<FrameSet>,
    metrics: Arc<CaptureMetrics>,
    settings: CaptureSettings,
}

impl CaptureSession {
    pub fn new(blueprint: &CaptureBlueprint, device: Box<dyn DeviceSource>) -> Self {
        let modes = blueprint.stream_modes();
        let syncer = Arc::new(FrameSyncer::new(&modes));
        let archive = FrameArchive::with_settings(modes, &blueprint.archive)
            .with_flush_hook(syncer.clone());
        let handle = archive.handle().clone();
        // Receiver is recreated by start(); this one only reports "closed"
        let (_, rx) = bounded(blueprint.capture.queue_capacity.max(1));

        Self {
            device,
            archive: Arc::new(Mutex::new(archive)),
            handle,
            syncer,
            rx,
            metrics: Arc::new(CaptureMetrics::new()),
            settings: blueprint.capture.clone(),
        }
    }

    /// Start streaming.
    ///
    /// Framesets assembled from now on are queued for `wait_for_frames`.
    #[instrument(name = "capture_start", skip(self), fields(device = %self.device.name()))]
    pub fn start(&mut self) -> Result<()> {
        if self.device.is_listening() {
            return Err(CaptureError::AlreadyStreaming {
                device: self.device.name().to_string(),
            });
        }

        let (tx, rx) = bounded(self.settings.queue_capacity.max(1));
        self.rx = rx;

        let archive = self.archive.clone();
        let syncer = self.syncer.clone();
        let metrics = self.metrics.clone();
        self.device.listen(Box::new(move |packet| {
            on_packet(&archive, &syncer, &tx, &metrics, packet);
        }));

        info!(
            streams = self.handle.modes().enabled_count(),
            queue_capacity = self.settings.queue_capacity,
            "capture started"
        );
        Ok(())
    }

    /// Stop streaming and release every frame the session holds.
    #[instrument(name = "capture_stop", skip(self), fields(device = %self.device.name()))]
    pub fn stop(&self) {
        self.device.stop();

        let mut queued = 0;
        while let Ok(set) = self.rx.try_recv() {
            drop(set);
            queued += 1;
        }
        self.archive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();

        info!(discarded_framesets = queued, "capture stopped");
    }

    /// Wait for the next frameset, up to the configured frame timeout.
    pub async fn wait_for_frames(&self) -> Result<FrameSet> {
        self.wait_for_frames_timeout(Duration::from_millis(self.settings.frame_timeout_ms))
            .await
    }

    pub async fn wait_for_frames_timeout(&self, timeout: Duration) -> Result<FrameSet> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Ok(set)) => {
                record_latency(&set);
                Ok(set)
            }
            Ok(Err(_)) => Err(CaptureError::ChannelClosed),
            Err(_) => Err(CaptureError::Timeout {
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Next queued frameset without waiting
    pub fn poll_for_frames(&self) -> Option<FrameSet> {
        let set = self.rx.try_recv().ok()?;
        record_latency(&set);
        Some(set)
    }

    /// Discard the configured number of framesets while the sensor settles.
    pub async fn warm_up(&self) -> Result<u32> {
        let frames = self.settings.warmup_frames;
        for _ in 0..frames {
            drop(self.wait_for_frames().await?);
        }
        debug!(frames, "warm-up complete");
        Ok(frames)
    }

    pub fn archive(&self) -> &ArchiveHandle {
        &self.handle
    }

    pub fn archive_stats(&self) -> ArchiveStats {
        self.handle.stats()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_streaming(&self) -> bool {
        self.device.is_listening()
    }

    /// Framesets waiting in the queue
    pub fn queued(&self) -> usize {
        self.rx.len()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Device-thread side: packet -> archive -> syncer -> queue
fn on_packet(
    archive: &Mutex<FrameArchive>,
    syncer: &FrameSyncer,
    tx: &Sender<FrameSet>,
    metrics: &CaptureMetrics,
    packet: DevicePacket,
) {
    metrics.record_received();

    let tracked = {
        let mut archive = archive.lock().unwrap_or_else(PoisonError::into_inner);
        ingest(&mut archive, &packet)
    };
    let frame = match tracked {
        Ok(frame) => frame,
        Err(e) => {
            metrics.record_ingest_error();
            warn!(stream = %packet.stream, frame_number = packet.frame_number, error = %e, "dropping packet");
            return;
        }
    };
    metrics.record_tracked();

    let Some(set) = syncer.push(frame) else {
        return;
    };
    match tx.try_send(set) {
        Ok(()) => {
            metrics.record_delivered();
            observability::record_frameset_delivered();
        }
        Err(TrySendError::Full(set)) => {
            drop(set);
            metrics.record_dropped();
            observability::record_frameset_dropped();
            trace!("consumer queue full, frameset dropped");
        }
        Err(TrySendError::Closed(set)) => {
            drop(set);
            trace!("consumer queue closed");
        }
    }
}

/// Copy a packet into its stream's backbuffer and publish it.
fn ingest(archive: &mut FrameArchive, packet: &DevicePacket) -> frame_archive::Result<FrameRef> {
    let data = archive.alloc_frame(
        packet.stream,
        packet.timestamp,
        packet.frame_number,
        packet.system_time,
        false,
    )?;
    let len = data.len().min(packet.data.len());
    data[..len].copy_from_slice(&packet.data[..len]);
    if len != packet.data.len() || len != data.len() {
        debug!(
            stream = %packet.stream,
            expected = data.len(),
            received = packet.data.len(),
            "packet size does not match stream mode"
        );
    }
    archive.track_frame(packet.stream)
}

fn record_latency(set: &FrameSet) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();
    for (stream, frame) in set.iter() {
        if let Some(system_time) = frame.system_time() {
            observability::record_frame_latency_ms(stream, latency_ms(now, system_time));
        }
    }
}

/// Host clock delta; device clocks may report anything
fn latency_ms(now: i64, system_time: i64) -> f64 {
    now.saturating_sub(system_time) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{pattern_byte, MockDevice, MockDeviceConfig};
    use contracts::{ArchiveSettings, ConfigVersion, PixelFormat, StreamConfig, StreamKind};

    fn blueprint(queue_capacity: usize) -> CaptureBlueprint {
        CaptureBlueprint {
            version: ConfigVersion::V1,
            archive: ArchiveSettings::default(),
            capture: CaptureSettings {
                warmup_frames: 3,
                queue_capacity,
                frame_timeout_ms: 2000,
            },
            streams: vec![
                StreamConfig {
                    stream: StreamKind::Depth,
                    width: 8,
                    height: 4,
                    format: PixelFormat::Z16,
                    fps: 200,
                },
                StreamConfig {
                    stream: StreamKind::Color,
                    width: 8,
                    height: 4,
                    format: PixelFormat::Rgb8,
                    fps: 200,
                },
            ],
        }
    }

    fn session(bp: &CaptureBlueprint, frame_limit: Option<u64>) -> CaptureSession {
        let device = MockDevice::new(MockDeviceConfig {
            frame_limit,
            ..MockDeviceConfig::new(bp.stream_modes())
        });
        CaptureSession::new(bp, Box::new(device))
    }

    #[tokio::test]
    async fn test_wait_for_frames_delivers_complete_sets() {
        let bp = blueprint(4);
        let mut session = session(&bp, None);
        session.start().unwrap();

        let set = session.wait_for_frames().await.unwrap();
        assert_eq!(set.len(), 2);

        for (stream, frame) in set.iter() {
            let data = frame.data().unwrap();
            let frame_number = frame.frame_number().unwrap();
            assert_eq!(data.len(), bp.stream_modes().get(stream).unwrap().frame_size());
            assert_eq!(data[3], pattern_byte(stream, frame_number, 3));
        }

        drop(set);
        session.stop();
        assert!(!session.is_streaming());

        let stats = session.archive_stats();
        assert_eq!(stats.live_frames, 0);
    }

    #[tokio::test]
    async fn test_warm_up_discards_framesets() {
        let bp = blueprint(4);
        let mut session = session(&bp, None);
        session.start().unwrap();

        assert_eq!(session.warm_up().await.unwrap(), 3);
        let set = session.wait_for_frames().await.unwrap();
        assert!(set.frame_number(StreamKind::Depth).unwrap() >= 4);
    }

    #[tokio::test]
    async fn test_channel_closed_after_device_finishes() {
        let bp = blueprint(8);
        let mut session = session(&bp, Some(2));
        session.start().unwrap();

        let mut received = 0;
        loop {
            match session.wait_for_frames().await {
                Ok(_) => received += 1,
                Err(CaptureError::ChannelClosed) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(received, 2);
        assert_eq!(session.metrics().packets_received, 4);
    }

    #[tokio::test]
    async fn test_full_queue_drops_newest() {
        let bp = blueprint(1);
        let mut session = session(&bp, Some(5));
        session.start().unwrap();

        // Let the device finish without consuming anything
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while session.is_streaming() && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let metrics = session.metrics();
        assert_eq!(metrics.framesets_delivered, 1);
        assert_eq!(metrics.framesets_dropped, 4);

        let set = session.poll_for_frames().unwrap();
        assert_eq!(set.frame_number(StreamKind::Color), Some(1));
        assert!(session.poll_for_frames().is_none());
    }

    #[tokio::test]
    async fn test_timeout_when_not_started() {
        let bp = blueprint(4);
        let session = session(&bp, None);
        let err = session
            .wait_for_frames_timeout(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::ChannelClosed | CaptureError::Timeout { .. }));
    }

    #[test]
    fn test_latency_saturates_on_bogus_system_time() {
        assert_eq!(latency_ms(1_000, 400), 600.0);
        assert_eq!(latency_ms(1_000, i64::MIN), i64::MAX as f64);
        assert_eq!(latency_ms(-2, i64::MAX), i64::MIN as f64);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let bp = blueprint(4);
        let mut session = session(&bp, None);
        session.start().unwrap();
        assert!(matches!(
            session.start(),
            Err(CaptureError::AlreadyStreaming { .. })
        ));
    }
}
