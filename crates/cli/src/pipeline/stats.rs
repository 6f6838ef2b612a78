//! Run statistics.

use std::time::Duration;

use capture::MetricsSnapshot;
use frame_archive::ArchiveStats;
use observability::CaptureMetricsAggregator;

/// Statistics from a capture run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Framesets consumed after warm-up
    pub framesets: u64,

    /// Framesets discarded during warm-up
    pub warmup_framesets: u32,

    /// Wall-clock duration of the consuming loop
    pub duration: Duration,

    /// Device-side counters
    pub capture: MetricsSnapshot,

    /// Archive counters taken before the final flush
    pub archive: ArchiveStats,

    /// Per-stream interval and skip statistics
    pub aggregator: CaptureMetricsAggregator,
}

impl RunStats {
    /// Framesets per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.framesets as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Capture Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Framesets: {}", self.framesets);
        println!("   ├─ Warm-up framesets: {}", self.warmup_framesets);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Packets received: {}", self.capture.packets_received);
        println!("   ├─ Ingest errors: {}", self.capture.ingest_errors);
        println!("   └─ Framesets dropped: {}", self.capture.framesets_dropped);

        println!("\n{}", self.aggregator.summary());
        println!("{}", self.archive);
    }
}
