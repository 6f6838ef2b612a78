//! Capture counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Capture metrics
#[derive(Debug, Default)]
pub struct CaptureMetrics {
    /// Packets delivered by the device
    pub packets_received: AtomicU64,

    /// Packets published into the archive
    pub frames_tracked: AtomicU64,

    /// Packets the archive refused
    pub ingest_errors: AtomicU64,

    /// Framesets handed to the consumer queue
    pub framesets_delivered: AtomicU64,

    /// Framesets dropped because the consumer queue was full
    pub framesets_dropped: AtomicU64,
}

impl CaptureMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tracked(&self) {
        self.frames_tracked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.framesets_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.framesets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            frames_tracked: self.frames_tracked.load(Ordering::Relaxed),
            ingest_errors: self.ingest_errors.load(Ordering::Relaxed),
            framesets_delivered: self.framesets_delivered.load(Ordering::Relaxed),
            framesets_dropped: self.framesets_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_received: u64,
    pub frames_tracked: u64,
    pub ingest_errors: u64,
    pub framesets_delivered: u64,
    pub framesets_dropped: u64,
}
